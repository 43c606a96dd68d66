//! Run fingerprinting: deterministic identification of datasets and
//! pipeline configurations.
//!
//! - `DatasetHash`: content hash of the bars fed to the pipeline.
//! - `ConfigHash`: hash of the canonical JSON of any serializable config.
//!
//! Both use BLAKE3 so they are stable across builds and platforms.

use crate::domain::Bar;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash every bar field in order. Two datasets hash equal only if they
/// contain the same bars with bit-identical values.
pub fn dataset_hash(bars: &[Bar]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}

/// Hash the JSON form of a config. Struct fields serialize in declaration
/// order, so the encoding is canonical for a given type.
pub fn config_hash<T: Serialize>(config: &T) -> Result<ConfigHash> {
    let json = serde_json::to_string(config)
        .map_err(|e| PipelineError::InvalidConfiguration(format!("config not serializable: {e}")))?;
    Ok(ConfigHash(blake3::hash(json.as_bytes()).to_hex().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, IndicatorConfig};

    #[test]
    fn dataset_hash_is_deterministic() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        assert_eq!(dataset_hash(&bars), dataset_hash(&bars));
        assert_eq!(dataset_hash(&bars).0.len(), 64);
    }

    #[test]
    fn dataset_hash_sees_every_field() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let mut changed = bars.clone();
        changed[1].volume += 1.0;
        assert_ne!(dataset_hash(&bars), dataset_hash(&changed));
    }

    #[test]
    fn config_hash_tracks_parameters() {
        let a = IndicatorConfig::default();
        let b = IndicatorConfig {
            rsi_period: 21,
            ..Default::default()
        };
        assert_eq!(config_hash(&a).unwrap(), config_hash(&a.clone()).unwrap());
        assert_ne!(config_hash(&a).unwrap(), config_hash(&b).unwrap());
    }
}
