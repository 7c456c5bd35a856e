pub mod macros;

pub mod composer_config;
pub mod groups;

pub use composer_config::ComposerConfig;
// Re-exported for use inside config_group!.
pub use utils::ParsableConfigValue;

/// Prefix shared by every environment variable read by the configuration groups.
pub const ENV_PREFIX: &str = "CHAT_COMPOSER_";
