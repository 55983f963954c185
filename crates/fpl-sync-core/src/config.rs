use crate::sanitize::FieldKind;
use crate::FplError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FILING_URL: &str = "https://my.vatsim.net/pilots/flightplan/beta";
pub const DEFAULT_FILING_PARAM: &str = "raw";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_callsign_quiet_ms")]
    pub callsign_quiet_ms: u64,
    #[serde(default = "default_route_quiet_ms")]
    pub route_quiet_ms: u64,
    #[serde(default = "default_route_quiet_ms")]
    pub departure_time_quiet_ms: u64,
    /// Filing page the encoded blob is attached to.
    #[serde(default = "default_filing_url")]
    pub filing_url: String,
    #[serde(default = "default_filing_param")]
    pub filing_param: String,
}

fn default_callsign_quiet_ms() -> u64 {
    200
}

fn default_route_quiet_ms() -> u64 {
    250
}

fn default_filing_url() -> String {
    DEFAULT_FILING_URL.to_string()
}

fn default_filing_param() -> String {
    DEFAULT_FILING_PARAM.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            callsign_quiet_ms: default_callsign_quiet_ms(),
            route_quiet_ms: default_route_quiet_ms(),
            departure_time_quiet_ms: default_route_quiet_ms(),
            filing_url: default_filing_url(),
            filing_param: default_filing_param(),
        }
    }
}

impl SyncConfig {
    /// Debounce window for a typed field. Level picks commit at once.
    pub fn quiet_period(&self, field: FieldKind) -> Duration {
        let ms = match field {
            FieldKind::Callsign => self.callsign_quiet_ms,
            FieldKind::DepartureTime => self.departure_time_quiet_ms,
            FieldKind::Route => self.route_quiet_ms,
            FieldKind::Level => 0,
        };
        Duration::from_millis(ms)
    }

    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("config.json")
    }

    pub fn load_from(path: &Path) -> Result<Self, FplError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads `path`, or the default location when `None`. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, FplError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            log::debug!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn save(&self, path: &Path) -> Result<(), FplError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
