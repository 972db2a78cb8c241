use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Idle window before a requested rebuild runs, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { debounce_ms: 150 }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        assert_eq!(EngineConfig::default().debounce(), Duration::from_millis(150));
        let cfg = EngineConfig::from_json(r#"{"debounce_ms": 40}"#).unwrap();
        assert_eq!(cfg.debounce(), Duration::from_millis(40));
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }
}
