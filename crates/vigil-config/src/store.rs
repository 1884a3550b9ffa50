//! Durable configuration store.
//!
//! The config file is the only resource mutated by multiple monitoring
//! tasks, so every write goes through a single process-wide lock around
//! "mutate in-memory copy, rewrite whole file". The rewrite goes to a
//! temp file in the same directory followed by a rename.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::defaults::ThresholdDefaults;
use crate::error::ConfigError;
use crate::schema::{AlertsConfig, NotificationsConfig, ValidatorMonitor, VigilConfig};

/// Loads the config once at startup and owns all writes back to it.
pub struct ConfigStore {
    path: PathBuf,
    defaults: ThresholdDefaults,
    inner: Mutex<VigilConfig>,
}

impl ConfigStore {
    /// Load, default and validate the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_defaults(path, ThresholdDefaults::default())
    }

    /// Load with explicit defaults, for callers that tune them.
    pub fn load_with_defaults(
        path: impl AsRef<Path>,
        defaults: ThresholdDefaults,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path)?;
        let mut config: VigilConfig = serde_yml::from_str(&content)?;

        for validator in &mut config.validators {
            validator.apply_defaults(&defaults);
            let resolved = validator.resolved(&defaults);
            crate::defaults::validate_bands(&validator.name, &resolved)?;
        }

        Ok(Self {
            path,
            defaults,
            inner: Mutex::new(config),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The defaults this store was loaded with.
    pub fn defaults(&self) -> &ThresholdDefaults {
        &self.defaults
    }

    /// Snapshot of the current config.
    pub fn config(&self) -> VigilConfig {
        self.inner.lock().clone()
    }

    /// Snapshot of the validator list.
    pub fn validators(&self) -> Vec<ValidatorMonitor> {
        self.inner.lock().validators.clone()
    }

    /// Snapshot of the alert-filtering section.
    pub fn alerts(&self) -> AlertsConfig {
        self.inner.lock().alerts.clone()
    }

    /// Snapshot of the notifications section.
    pub fn notifications(&self) -> Option<NotificationsConfig> {
        self.inner.lock().notifications.clone()
    }

    /// The persisted status-message handle for a validator, if any.
    pub fn status_message_id(&self, validator: &str) -> Option<String> {
        self.inner
            .lock()
            .validators
            .iter()
            .find(|v| v.name == validator)
            .and_then(|v| v.discord_status_message_id.clone())
    }

    /// Record a validator's status-message handle and persist the file.
    pub fn set_status_message_id(
        &self,
        validator: &str,
        handle: &str,
    ) -> Result<(), ConfigError> {
        let mut config = self.inner.lock();
        let entry = config
            .validators
            .iter_mut()
            .find(|v| v.name == validator)
            .ok_or_else(|| ConfigError::UnknownValidator(validator.to_string()))?;
        entry.discord_status_message_id = Some(handle.to_string());
        self.write_file(&config)
    }

    /// Persist the current in-memory config.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config = self.inner.lock();
        self.write_file(&config)
    }

    // Callers hold the lock, making the read-merge-write sequence atomic
    // from every other task's perspective.
    fn write_file(&self, config: &VigilConfig) -> Result<(), ConfigError> {
        let yaml = serde_yml::to_string(config)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, yaml)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "config persisted");
        Ok(())
    }
}
