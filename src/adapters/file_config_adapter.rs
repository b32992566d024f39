//! INI file configuration adapter.

use std::path::Path;

use configparser::ini::Ini;

use crate::domain::error::KestrelError;
use crate::ports::config_port::ConfigPort;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, KestrelError> {
        let mut config = Ini::new();
        config.load(&path).map_err(|e| KestrelError::ConfigParse {
            file: path.as_ref().display().to_string(),
            reason: e,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, KestrelError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|e| KestrelError::ConfigParse {
                file: "<inline>".to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[data]
root_dir = /tmp/candles
coin = BTC
currency = USDT
timeframe = 1h

[session]
position_size = 0.5
stop_loss_pct = 0.05
take_profit_pct = 0.1

[optimize]
n_trials = 20
test_size = 0.2
test_samples = 1
purge_factor = 0.01
seed = 7
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("data", "coin"),
            Some("BTC".to_string())
        );
        assert_eq!(
            adapter.get_string("data", "timeframe"),
            Some("1h".to_string())
        );
        assert_eq!(adapter.get_double("session", "position_size", 1.0), 0.5);
        assert_eq!(adapter.get_int("optimize", "n_trials", 100), 20);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string("[session]\n").unwrap();
        assert_eq!(adapter.get_string("session", "missing"), None);
        assert_eq!(adapter.get_int("optimize", "n_trials", 100), 100);
        assert_eq!(adapter.get_double("session", "position_size", 1.0), 1.0);
        assert!(adapter.get_bool("session", "missing", true));
    }

    #[test]
    fn non_numeric_values_fall_back_to_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[session]\nposition_size = lots\n").unwrap();
        assert_eq!(adapter.get_double("session", "position_size", 0.25), 0.25);
        assert_eq!(adapter.get_int("session", "position_size", 3), 3);
    }

    #[test]
    fn bool_values_parse_common_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[flags]\na = true\nb = no\nc = 1\n").unwrap();
        assert!(adapter.get_bool("flags", "a", false));
        assert!(!adapter.get_bool("flags", "b", true));
        assert!(adapter.get_bool("flags", "c", false));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "root_dir"),
            Some("/tmp/candles".to_string())
        );
    }

    #[test]
    fn from_file_fails_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/kestrel.ini");
        assert!(matches!(result, Err(KestrelError::ConfigParse { .. })));
    }
}
