//! Error types for the autosplitter

use thiserror::Error;

/// Errors surfaced by the autosplitter.
///
/// Memory reads are not represented here: a failed read is an `Option::None`
/// and leaves the previous snapshot value in place.
#[derive(Debug, Error)]
pub enum AutosplitterError {
    #[error("Unsupported game binary (module size {module_size})")]
    UnsupportedBinary { module_size: usize },

    #[error("Invalid layout configuration: {0}")]
    LayoutConfig(String),

    #[error("Failed to parse settings: {0}")]
    SettingsParse(String),

    #[error("Failed to serialize settings: {0}")]
    SettingsSerialize(String),

    #[error("Autosplitter already running")]
    AlreadyRunning,

    #[error("Failed to open process {0}")]
    ProcessOpenFailed(u32),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AutosplitterError>;

impl From<toml::de::Error> for AutosplitterError {
    fn from(e: toml::de::Error) -> Self {
        AutosplitterError::SettingsParse(e.to_string())
    }
}

impl From<toml::ser::Error> for AutosplitterError {
    fn from(e: toml::ser::Error) -> Self {
        AutosplitterError::SettingsSerialize(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_binary_display() {
        let err = AutosplitterError::UnsupportedBinary { module_size: 1234 };
        assert!(err.to_string().contains("1234"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let err: AutosplitterError = toml::from_str::<toml::Value>("= broken")
            .unwrap_err()
            .into();
        assert!(matches!(err, AutosplitterError::SettingsParse(_)));
    }
}
