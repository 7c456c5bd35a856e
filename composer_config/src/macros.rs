/// Macro to create a configuration value group struct.
///
/// Usage:
/// ```rust
/// use composer_config::config_group;
///
/// config_group!({
///     ref test_int: usize = 42;
///     ref test_string: String = "default".to_string();
/// });
/// ```
///
/// This creates a `ConfigValueGroup` struct with the specified fields and a `new()` method returning the
/// defaults.  `apply_env_overrides()` loads values from environment variables named
/// `CHAT_COMPOSER_<GROUP>_<FIELD>`, where the group is the last segment of the module path.
#[macro_export]
macro_rules! config_group {
    ({
        $(
            $(#[$meta:meta])*
            ref $name:ident : $type:ty = $value:expr;
        )+
    }) => {
        #[allow(unused_imports)]
        use $crate::ParsableConfigValue;

        /// ConfigValueGroup struct containing all configurable values
        #[derive(Debug, Clone)]
        pub struct ConfigValueGroup {
            $(
                $(#[$meta])*
                #[allow(non_snake_case)]
                pub $name: $type,
            )+
        }

        impl Default for ConfigValueGroup {
            /// Create a new instance with default values only (no environment variable overrides).
            fn default() -> Self {
                Self {
                    $(
                        $name: {
                            let v: $type = $value;
                            v
                        },
                    )+
                }
            }
        }

        impl ConfigValueGroup {
            /// Alias for `Default::default()`.
            pub fn new() -> Self {
                Self::default()
            }

            /// Name of the environment variable that overrides the given field of this group.
            pub fn env_var_name(field: &str) -> String {
                let group_name = module_path!().split("::").last().unwrap_or("unknown");
                format!("{}{}_{}", $crate::ENV_PREFIX, group_name.to_uppercase(), field.to_uppercase())
            }

            /// Apply environment variable overrides to this configuration group.
            pub fn apply_env_overrides(&mut self) {
                $(
                    let env_var_name = Self::env_var_name(stringify!($name));
                    let maybe_env_value = std::env::var(&env_var_name).ok();
                    let current_value = std::mem::take(&mut self.$name);
                    self.$name = <$type>::parse(&env_var_name, maybe_env_value, current_value);
                )+
            }
        }

        /// Type alias for easier reference in config aggregation
        #[allow(dead_code)]
        pub(crate) type ConfigValues = ConfigValueGroup;
    };
}
