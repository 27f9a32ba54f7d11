//! Tracks the optional user-supplied API key and its probed validity. The
//! manager itself is pure state; persistence lives in the free functions
//! below and the debounced probe is wired up by the UI layer, which aborts
//! and reschedules the pending probe task on every edit.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;

/// Quiet period between the last key edit and the validation probe.
pub const DEBOUNCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validity {
    /// No custom key, or a probe has not resolved yet.
    #[default]
    Unknown,
    Valid,
    Invalid,
}

#[derive(Debug, Default)]
pub struct CredentialManager {
    value: String,
    validity: Validity,
}

impl CredentialManager {
    /// Restores the persisted credential, if any. Validity starts unknown
    /// until a probe resolves.
    pub fn load() -> Self {
        CredentialManager {
            value: load_stored().unwrap_or_default(),
            validity: Validity::Unknown,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// True when a non-empty custom key is configured.
    pub fn is_custom(&self) -> bool {
        !self.value.trim().is_empty()
    }

    /// Records an edit. Validity drops back to unknown immediately; the
    /// return value says whether the caller should schedule a probe (an
    /// empty key is a valid configuration and is never probed).
    #[must_use]
    pub fn set(&mut self, value: String) -> bool {
        self.value = value;
        self.validity = Validity::Unknown;
        self.is_custom()
    }

    pub fn apply_probe(&mut self, validity: Validity) {
        self.validity = validity;
    }
}

fn key_path() -> PathBuf {
    Config::get_config_dir().join("api_key")
}

pub fn load_stored() -> Option<String> {
    let value = fs::read_to_string(key_path()).ok()?;
    let value = value.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn store(value: &str) -> std::io::Result<()> {
    fs::create_dir_all(Config::get_config_dir())?;
    fs::write(key_path(), value)
}

pub fn clear_stored() {
    let _ = fs::remove_file(key_path());
}
