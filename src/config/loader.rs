//! Settings file loading.

use std::path::Path;

use super::{
    ConfigError,
    I18nSettings,
};

/// Name of the settings file looked up at the workspace root.
pub(super) const SETTINGS_FILE_NAME: &str = ".js-i18n-chunks.json";

/// Loads settings from `.js-i18n-chunks.json` under the workspace root.
///
/// # Returns
/// - `Ok(Some(settings))`: the file exists and parsed
/// - `Ok(None)`: no settings file
/// - `Err(ConfigError)`: read or parse failure
pub(super) fn load_from_workspace(
    workspace_root: &Path,
) -> Result<Option<I18nSettings>, ConfigError> {
    let config_path = workspace_root.join(SETTINGS_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "Settings file not found");
        return Ok(None);
    }

    tracing::debug!(path = %config_path.display(), "Loading settings");

    let content = std::fs::read_to_string(&config_path)?;
    let settings: I18nSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}
