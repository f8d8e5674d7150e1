use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::commands::COMMAND_QUEUE_CAPACITY;
use crate::control::{Param, Pot};
use crate::dsp::core::dc_block::DcBlocker;
use crate::error::ConfigError;
use crate::patch::Cable;
use crate::types::Indexed;

/// Construction-time settings of an [`Engine`](crate::engine::Engine).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub dc_block_coefficient: f32,
    /// Capacity of the control-to-audio patch command queue.
    pub command_capacity: usize,
    /// Initial pot values by name; unnamed pots keep their defaults.
    pub pots: BTreeMap<String, f32>,
    pub params: BTreeMap<String, f32>,
    /// Cables patched before the first tick.
    pub cables: Vec<Cable>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            dc_block_coefficient: DcBlocker::DEFAULT_COEFFICIENT,
            command_capacity: COMMAND_QUEUE_CAPACITY,
            pots: BTreeMap::new(),
            params: BTreeMap::new(),
            cables: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        let c = self.dc_block_coefficient;
        if !(c > 0.0 && c < 1.0) {
            return Err(ConfigError::DcBlockCoefficient(c));
        }
        if self.command_capacity == 0 {
            return Err(ConfigError::CommandCapacity);
        }
        self.pot_values()?;
        self.param_values()?;
        Ok(())
    }

    /// The configured pot overrides, resolved to pots.
    pub fn pot_values(&self) -> Result<Vec<(Pot, f32)>, ConfigError> {
        resolve(&self.pots)
    }

    pub fn param_values(&self) -> Result<Vec<(Param, f32)>, ConfigError> {
        resolve(&self.params)
    }
}

fn resolve<E: Indexed>(values: &BTreeMap<String, f32>) -> Result<Vec<(E, f32)>, ConfigError> {
    values
        .iter()
        .map(|(name, value)| {
            let control =
                E::from_name(name).ok_or_else(|| ConfigError::UnknownControl(name.clone()))?;
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteControl {
                    name: name.clone(),
                    value: *value,
                });
            }
            Ok((control, *value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Socket;

    #[test]
    fn empty_object_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.sample_rate, 48_000.0);
        assert_eq!(config.dc_block_coefficient, 0.9995);
    }

    #[test]
    fn parses_controls_and_cables() {
        let config = EngineConfig::from_json_str(
            r#"{
                "sample_rate": 44100,
                "pots": { "volume": 0.5, "chs_a_tune": 0.2 },
                "params": { "chs_a_form": 2 },
                "cables": [ { "source": "chs_a_out_x", "sink": "mix_in_l" } ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.sample_rate, 44_100.0);
        assert_eq!(
            config.pot_values().unwrap(),
            vec![(Pot::ChsATune, 0.2), (Pot::Volume, 0.5)]
        );
        assert_eq!(config.param_values().unwrap(), vec![(Param::ChsAForm, 2.0)]);
        assert_eq!(config.cables[0].source, Socket::ChsAOutX);
        assert_eq!(config.cables[0].sink, Socket::MixInL);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"sample_rate": 0}"#),
            Err(ConfigError::SampleRate(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"dc_block_coefficient": 1.0}"#),
            Err(ConfigError::DcBlockCoefficient(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"command_capacity": 0}"#),
            Err(ConfigError::CommandCapacity)
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"pots": {"loudness": 1}}"#),
            Err(ConfigError::UnknownControl(name)) if name == "loudness"
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"sample_rte": 48000}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::from_path("/nonexistent/engine.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/engine.json"));
    }
}
