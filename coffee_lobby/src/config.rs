// Lobby configuration and start-up file loading.
//
// `LobbyConfig` is read from an optional JSON file (every field optional,
// missing ones take defaults), then the CLI overrides individual fields.
// Zero turn limits mean "use the default", the same as leaving them out.
//
// `load_map` picks the map format by extension: `.json` goes through serde,
// anything else is parsed as a plain PPM image.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use coffee_map::MapDefinition;

use crate::error::LobbyError;
use crate::session::MatchLimits;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_TURN_COUNT: u32 = 56;
pub const DEFAULT_MAX_TURN_DURATION_MS: u64 = 1_000;

/// Settings for one lobby process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    pub bind_address: String,
    /// UDP port; 0 lets the OS pick one.
    pub port: u16,
    /// Total number of turns (both sides counted) before the match ends.
    pub max_turn_count: u32,
    /// Time a player has to answer "your turn" before the match ends.
    pub max_turn_duration_ms: u64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.into(),
            port: DEFAULT_PORT,
            max_turn_count: DEFAULT_MAX_TURN_COUNT,
            max_turn_duration_ms: DEFAULT_MAX_TURN_DURATION_MS,
        }
    }
}

impl LobbyConfig {
    pub fn from_json(text: &str) -> Result<Self, LobbyError> {
        Ok(serde_json::from_str::<Self>(text)?.normalized())
    }

    pub fn load(path: &Path) -> Result<Self, LobbyError> {
        Self::from_json(&read_file(path)?)
    }

    /// Replace zero limits with their defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_turn_count == 0 {
            self.max_turn_count = DEFAULT_MAX_TURN_COUNT;
        }
        if self.max_turn_duration_ms == 0 {
            self.max_turn_duration_ms = DEFAULT_MAX_TURN_DURATION_MS;
        }
        self
    }

    pub fn limits(&self) -> MatchLimits {
        MatchLimits {
            max_turn_count: self.max_turn_count,
            max_turn_duration: Duration::from_millis(self.max_turn_duration_ms),
        }
    }
}

/// Load a map definition from a `.json` or PPM file.
pub fn load_map(path: &Path) -> Result<MapDefinition, LobbyError> {
    let text = read_file(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let map = if is_json {
        MapDefinition::from_json(&text)?
    } else {
        MapDefinition::from_ppm(&text)?
    };
    Ok(map)
}

fn read_file(path: &Path) -> Result<String, LobbyError> {
    std::fs::read_to_string(path).map_err(|source| LobbyError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}
