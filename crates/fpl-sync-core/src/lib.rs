// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod builder;
pub mod config;
pub mod extract;
pub mod link;
pub mod rebuild;
pub mod sanitize;
pub mod script;
pub mod sync;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FplError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Replay script line {line}: {reason}")]
    Script { line: usize, reason: String },
}

/// One version of the ICAO flight-plan text.
///
/// A blob is never edited in place. Every commit produces a new value and the
/// previous one stays valid for whoever still holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightPlanBlob(Arc<str>);

impl FlightPlanBlob {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FplError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(text))
    }
}

impl fmt::Display for FlightPlanBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FlightPlanBlob {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for FlightPlanBlob {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl AsRef<str> for FlightPlanBlob {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Per-user configuration directory (`config.json` lives here).
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "fpl-sync", "FplSync")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
