//! Configuration management

use crate::error::{ErrorContext, InstareelError, InstareelResult};
use crate::invalid_value;
use crate::types::InstareelConfig;

use std::path::Path;

/// Ten years
pub const MAX_RETENTION_HOURS: u64 = 24 * 365 * 10;

impl InstareelConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> InstareelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| InstareelError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: InstareelConfig =
            toml::from_str(&content).map_err(|e| InstareelError::Config {
                message: format!("Failed to parse config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config")
                    .with_operation("parse_toml")
                    .with_suggestion("Check TOML syntax in config file"),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> InstareelResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| InstareelError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| InstareelError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> InstareelResult<()> {
        let media = &self.media;

        if media.width == 0 || media.height == 0 {
            return Err(invalid_value!(
                "media.width/media.height",
                "frame dimensions must be greater than 0",
                "Use 1080 x 1920 for vertical reels"
            ));
        }
        // yuv420p needs even dimensions
        if media.width % 2 != 0 || media.height % 2 != 0 {
            return Err(invalid_value!(
                "media.width/media.height",
                format!("{}x{} is not even in both dimensions", media.width, media.height),
                "Round the frame size to even values"
            ));
        }
        if media.fps == 0 {
            return Err(invalid_value!("media.fps", "must be greater than 0", "Use 24"));
        }
        if media.encode_timeout_secs == 0 {
            return Err(invalid_value!(
                "media.encode_timeout_secs",
                "must be greater than 0",
                "Allow several minutes for long audio tracks"
            ));
        }

        if let Some(hours) = media.reel_retention_hours {
            if hours == 0 || hours > MAX_RETENTION_HOURS {
                return Err(invalid_value!(
                    "media.reel_retention_hours",
                    format!("{} is outside 1..={}", hours, MAX_RETENTION_HOURS),
                    "Leave unset to keep reels forever"
                ));
            }
        }

        let platform = &self.platform;
        if platform.login_timeout_secs == 0 || platform.request_timeout_secs == 0 {
            return Err(invalid_value!(
                "platform.login_timeout_secs/platform.request_timeout_secs",
                "must be greater than 0",
                "Leave unset to use the defaults"
            ));
        }
        if platform.base_url.trim().is_empty() {
            return Err(invalid_value!(
                "platform.base_url",
                "must not be empty",
                "Point it at the platform API root"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PathsConfig;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = InstareelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.media.width, 1080);
        assert_eq!(config.media.height, 1920);
        assert_eq!(config.media.fps, 24);
        assert_eq!(config.media.preset, "ultrafast");
        assert!(config.media.reel_retention_hours.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("instareel.toml");

        let mut config = InstareelConfig::default();
        config.paths = PathsConfig::rooted_at(dir.path());
        config.media.reel_retention_hours = Some(48);
        config.save_to_file(&path).unwrap();

        let loaded = InstareelConfig::from_file(&path).unwrap();
        assert_eq!(loaded.paths.sessions_dir, dir.path().join("sessions"));
        assert_eq!(loaded.media.reel_retention_hours, Some(48));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[media]\nfps = 30\n").unwrap();

        let loaded = InstareelConfig::from_file(&path).unwrap();
        assert_eq!(loaded.media.fps, 30);
        assert_eq!(loaded.media.width, 1080);
        assert_eq!(loaded.paths.output_dir, std::path::PathBuf::from("completed_reels"));
    }

    #[test]
    fn test_validation_rejects_odd_dimensions() {
        let mut config = InstareelConfig::default();
        config.media.width = 1081;
        match config.validate() {
            Err(InstareelError::InvalidValue { field, .. }) => {
                assert_eq!(field, "media.width/media.height")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validation_bounds_reel_retention() {
        let mut config = InstareelConfig::default();
        config.media.reel_retention_hours = Some(u64::MAX);
        assert!(matches!(
            config.validate(),
            Err(InstareelError::InvalidValue { .. })
        ));

        config.media.reel_retention_hours = Some(0);
        assert!(config.validate().is_err());

        config.media.reel_retention_hours = Some(MAX_RETENTION_HOURS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = InstareelConfig::from_file("/nonexistent/instareel.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
