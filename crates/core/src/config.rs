//! Runtime configuration
//!
//! Everything is read from environment variables; blank values fall back
//! to the defaults.

use std::path::PathBuf;

use crate::profile::profile_slug;

pub const DEFAULT_DATA_DIR: &str = ".taskflow-data";
pub const DEFAULT_TASKS_BASE: &str = "@taskflow/tasks";
pub const DEFAULT_PROFILE_KEY: &str = "@taskflow/profile";

/// Segment used for the task blob when no profile is active
const DEFAULT_NAMESPACE: &str = "default";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub tasks_base: String,
    pub profile_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            tasks_base: DEFAULT_TASKS_BASE.to_string(),
            profile_key: DEFAULT_PROFILE_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `TASKFLOW_DATA_DIR`, `TASKFLOW_NAMESPACE`
    /// and `TASKFLOW_PROFILE_KEY`
    pub fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(env_or("TASKFLOW_DATA_DIR", DEFAULT_DATA_DIR)),
            tasks_base: env_or("TASKFLOW_NAMESPACE", DEFAULT_TASKS_BASE),
            profile_key: env_or("TASKFLOW_PROFILE_KEY", DEFAULT_PROFILE_KEY),
        }
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout {
            tasks_base: self.tasks_base.clone(),
            profile_key: self.profile_key.clone(),
        }
    }
}

/// Durable key layout: one task blob per profile namespace plus a single
/// key for the last-used profile descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub tasks_base: String,
    pub profile_key: String,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Config::default().layout()
    }
}

impl StorageLayout {
    /// Task blob key for a profile name.
    ///
    /// `None` and blank names share the default namespace, which no
    /// profile slug can collide with.
    pub fn key_for(&self, profile_name: Option<&str>) -> String {
        let slug = profile_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(profile_slug);

        match slug {
            Some(slug) => format!("{}/{}", self.tasks_base, slug),
            None => format!("{}/{}", self.tasks_base, DEFAULT_NAMESPACE),
        }
    }

    pub fn default_key(&self) -> String {
        self.key_for(None)
    }
}
