use crate::{
    domain::reminder::SMALLEST_WINDOW,
    error::{OmniDoError, Result},
    logging,
    storage::FileStore,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the store file
    pub data_dir: PathBuf,
    /// File name of the store inside `data_dir`
    pub store_file: String,
    /// Time between reminder polls
    #[serde(rename = "reminder_interval_secs", with = "duration_secs")]
    pub reminder_interval: Duration,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            store_file: FileStore::DEFAULT_FILE.to_string(),
            reminder_interval: Duration::from_secs(5 * 60),
            log_level: logging::default_log_level().to_string(),
        }
    }
}

impl Config {
    /// Reads a JSON config file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that a reminder poll cannot step over a threshold window
    pub fn validate(&self) -> Result<()> {
        validate_interval(self.reminder_interval)?;
        if self.store_file.trim().is_empty() {
            return Err(OmniDoError::ConfigError(
                "store_file cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store_file)
    }
}

const SHORTEST_INTERVAL: Duration = Duration::from_secs(1);

/// The poll interval must be at least a second and shorter than the
/// narrowest reminder window
pub fn validate_interval(interval: Duration) -> Result<()> {
    if interval < SHORTEST_INTERVAL || interval >= SMALLEST_WINDOW {
        return Err(OmniDoError::ConfigError(format!(
            "reminder interval must be at least {}s and below {}s, got {:?}",
            SHORTEST_INTERVAL.as_secs(),
            SMALLEST_WINDOW.as_secs(),
            interval
        )));
    }
    Ok(())
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
