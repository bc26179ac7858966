//! Settings lifecycle for the extraction side.

use std::path::PathBuf;

use super::{
    ConfigError,
    I18nSettings,
    loader,
};

/// Holds the validated settings for one workspace.
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// Settings currently in effect.
    current_settings: I18nSettings,
    /// Root the settings were loaded from.
    workspace_root: Option<PathBuf>,
}

impl ConfigManager {
    /// Manager holding default settings and no workspace.
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: I18nSettings::default(), workspace_root: None }
    }

    /// Loads and validates settings for a workspace.
    ///
    /// A missing settings file falls back to defaults.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation error
    pub fn load_settings(&mut self, workspace_root: Option<PathBuf>) -> Result<(), ConfigError> {
        tracing::debug!(?workspace_root, "Loading settings");

        let settings = if let Some(root) = &workspace_root {
            loader::load_from_workspace(root)?.unwrap_or_default()
        } else {
            I18nSettings::default()
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = settings;
        self.workspace_root = workspace_root;
        tracing::debug!(settings = ?self.current_settings, "Settings loaded");

        Ok(())
    }

    /// Replaces the current settings after validating them.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationErrors` when the new settings are invalid.
    pub fn update_settings(&mut self, new_settings: I18nSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;
        self.current_settings = new_settings;
        tracing::debug!("Settings updated");
        Ok(())
    }

    /// Settings currently in effect.
    #[must_use]
    pub const fn get_settings(&self) -> &I18nSettings {
        &self.current_settings
    }

    /// Workspace root passed to the last successful load.
    #[must_use]
    pub const fn workspace_root(&self) -> Option<&PathBuf> {
        self.workspace_root.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::config::ConsistencyLevel;

    #[rstest]
    fn test_new_creates_default_settings() {
        let manager = ConfigManager::new();

        assert_eq!(manager.get_settings().translation_functions, vec!["t".to_string()]);
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn test_load_settings_with_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(loader::SETTINGS_FILE_NAME),
            r#"{"consistency": "error", "moduleSpecifiers": ["@app/i18n"]}"#,
        )
        .unwrap();

        let mut manager = ConfigManager::new();
        manager.load_settings(Some(temp_dir.path().to_path_buf())).unwrap();

        assert_eq!(manager.get_settings().consistency, ConsistencyLevel::Error);
        assert_eq!(manager.get_settings().module_specifiers, vec!["@app/i18n".to_string()]);
        assert!(manager.workspace_root().is_some());
    }

    #[rstest]
    fn test_load_settings_without_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(result.is_ok());
        assert_eq!(manager.get_settings().chunk_path_prefix, "/_i18n");
    }

    #[rstest]
    fn test_load_settings_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(loader::SETTINGS_FILE_NAME), r#"{"translationFunctions": []}"#)
            .unwrap();

        let mut manager = ConfigManager::new();
        let result = manager.load_settings(Some(temp_dir.path().to_path_buf()));

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
        assert!(manager.workspace_root().is_none());
    }

    #[rstest]
    fn test_update_settings_invalid() {
        let mut manager = ConfigManager::new();
        let new_settings =
            I18nSettings { global_name: String::new(), ..I18nSettings::default() };

        assert!(manager.update_settings(new_settings).is_err());
        assert_eq!(manager.get_settings().global_name, "__I18N__");
    }
}
