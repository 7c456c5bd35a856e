use crate::groups;

/// All configuration groups of the composer, one field per group.
#[derive(Debug, Clone, Default)]
pub struct ComposerConfig {
    pub upload: groups::upload::ConfigValueGroup,
    pub log: groups::log::ConfigValueGroup,
}

impl ComposerConfig {
    /// Defaults only; the environment is not consulted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with every `CHAT_COMPOSER_*` environment override applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.upload.apply_env_overrides();
        self.log.apply_env_overrides();
    }
}
