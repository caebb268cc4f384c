use super::models::AppConfig;
use super::tables::{ConfigTables, TABLE_NAMES};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            AppConfig::default()
        }
    }
}

/// Parse either the sectioned layout or a flat key list.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let value: toml::Table = toml::from_str(contents).context("config is not valid TOML")?;
    let sectioned = TABLE_NAMES.iter().any(|name| value.contains_key(*name));
    if sectioned {
        let tables: ConfigTables = toml::from_str(contents).context("invalid config tables")?;
        Ok(tables.into())
    } else {
        toml::from_str::<AppConfig>(contents).context("invalid flat config")
    }
}

pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(&ConfigTables::from(config)).context("failed to serialize config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use crate::highlight::HighlightGranularity;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.max_speech_length, 175);
        assert_eq!(cfg.highlight_granularity, HighlightGranularity::Auto);
    }

    #[test]
    fn sectioned_tables_map_onto_flat_config() {
        let cfg = parse_config(
            r#"
            [speech]
            locale = "el-GR"
            rate = 2.0

            [highlight]
            granularity = "word"
            auto_sentence_min_rate = 3.0

            [voice]
            auto_voice_switching = false
            enabled_languages = ["el", "en"]
            stored_voices = { el = "Melina" }

            [logging]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.locale, "el-GR");
        assert_eq!(cfg.speech_rate, 2.0);
        assert_eq!(cfg.max_speech_length, 175);
        assert_eq!(cfg.highlight_granularity, HighlightGranularity::Word);
        assert_eq!(cfg.auto_sentence_min_rate, 3.0);
        assert_eq!(cfg.auto_word_max_rate, 0.75);
        assert!(!cfg.auto_voice_switching);
        assert_eq!(cfg.enabled_languages, vec!["el", "en"]);
        assert_eq!(cfg.stored_voices.get("el").map(String::as_str), Some("Melina"));
        assert_eq!(cfg.log_level, LogLevel::Debug);
    }

    #[test]
    fn flat_file_is_accepted() {
        let cfg = parse_config("speech_rate = 0.5\nhighlight_granularity = \"off\"\n").unwrap();
        assert_eq!(cfg.speech_rate, 0.5);
        assert_eq!(cfg.highlight_granularity, HighlightGranularity::Off);
    }

    #[test]
    fn invalid_file_is_an_error_and_load_falls_back() {
        assert!(parse_config("[speech]\nrate = \"fast\"").is_err());
        let missing = load_config(Path::new("/definitely/not/here/config.toml"));
        assert_eq!(missing, AppConfig::default());
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut cfg = AppConfig::default();
        cfg.locale = "ja-JP".to_string();
        cfg.stored_voices.insert("ja".into(), "Kyoko".into());
        let text = serialize_config(&cfg).unwrap();
        assert!(text.contains("[speech]"));
        assert_eq!(parse_config(&text).unwrap(), cfg);
    }
}
