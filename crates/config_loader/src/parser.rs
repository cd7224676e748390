//! Configuration parsing.
//!
//! TOML is the primary format; JSON is accepted as well.

use contracts::{CoreError, PipelineSettings};

/// Configuration file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML configuration.
pub fn parse_toml(content: &str) -> Result<PipelineSettings, CoreError> {
    toml::from_str(content).map_err(|e| CoreError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a JSON configuration.
pub fn parse_json(content: &str) -> Result<PipelineSettings, CoreError> {
    serde_json::from_str(content).map_err(|e| CoreError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse by format.
pub fn parse(content: &str, format: ConfigFormat) -> Result<PipelineSettings, CoreError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceMode;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[source]
mode = "synthetic"
frequency_hz = 60.0
synthetic_laps = 2

[analysis]
brake_threshold = 0.08
"#;
        let settings = parse_toml(content).unwrap();
        assert_eq!(settings.source.mode, SourceMode::Synthetic);
        assert_eq!(settings.source.synthetic_laps, 2);
        assert_eq!(settings.analysis.brake_threshold, 0.08);
        // Untouched sections keep their defaults
        assert_eq!(settings.bus.frame_capacity, 1_024);
    }

    #[test]
    fn test_parse_empty_toml_is_all_defaults() {
        let settings = parse_toml("").unwrap();
        assert_eq!(settings.analysis.decel_window, 5);
        assert_eq!(settings.comparison.distance_tolerance, 0.10);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "source": { "mode": "replay", "replay_path": "session.jsonl" },
            "upload": { "enabled": true, "output_dir": "./out" }
        }"#;
        let settings = parse_json(content).unwrap();
        assert_eq!(settings.source.mode, SourceMode::Replay);
        assert!(settings.upload.enabled);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(CoreError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
