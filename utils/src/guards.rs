use std::env;
use std::ffi::OsStr;

/// Guard that temporarily sets an environment variable and restores the previous value on drop.
///
/// Environment mutation is process-global, so tests using this guard should be marked
/// `#[serial]`.
///
/// # Examples
///
/// ```no_run
/// use utils::EnvVarGuard;
///
/// let _guard = EnvVarGuard::set("CHAT_COMPOSER_UPLOAD_MAX_FILE_COUNT", "3");
/// // The variable is restored (or removed) when _guard is dropped.
/// ```
pub struct EnvVarGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvVarGuard {
    pub fn set(key: &'static str, value: impl AsRef<OsStr>) -> Self {
        let prev = env::var(key).ok();
        unsafe {
            env::set_var(key, value);
        }
        Self { key, prev }
    }

    pub fn remove(key: &'static str) -> Self {
        let prev = env::var(key).ok();
        unsafe {
            env::remove_var(key);
        }
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.prev {
            unsafe {
                env::set_var(self.key, v);
            }
        } else {
            unsafe {
                env::remove_var(self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_guard_restores_previous_state() {
        const KEY: &str = "UTILS_GUARD_TEST_VARIABLE";
        assert!(env::var(KEY).is_err());
        {
            let _guard = EnvVarGuard::set(KEY, "outer");
            assert_eq!(env::var(KEY).unwrap(), "outer");
            {
                let _inner = EnvVarGuard::set(KEY, "inner");
                assert_eq!(env::var(KEY).unwrap(), "inner");
            }
            assert_eq!(env::var(KEY).unwrap(), "outer");
            {
                let _removed = EnvVarGuard::remove(KEY);
                assert!(env::var(KEY).is_err());
            }
            assert_eq!(env::var(KEY).unwrap(), "outer");
        }
        assert!(env::var(KEY).is_err());
    }
}
