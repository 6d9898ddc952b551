//! Cross-platform configuration paths using the `dirs` crate.
//!
//! Config dir:
//!   Windows: %APPDATA%\speech-capture\
//!   macOS:   ~/Library/Application Support/speech-capture/
//!   Linux:   ~/.config/speech-capture/

use std::path::PathBuf;

/// Resolved configuration directory and file paths.
#[derive(Debug, Clone)]
pub struct CapturePaths {
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
}

impl CapturePaths {
    const APP_NAME: &'static str = "speech-capture";

    /// Falls back to the current directory if the platform cannot provide a
    /// standard config location.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
        }
    }
}

impl Default for CapturePaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_file_lives_in_config_dir() {
        let paths = CapturePaths::new();
        assert!(paths.config_dir.ends_with("speech-capture"));
        assert_eq!(paths.settings_file.parent(), Some(paths.config_dir.as_path()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
    }
}
