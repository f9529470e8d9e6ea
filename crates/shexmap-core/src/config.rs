// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lens configuration and the port it is stored through.
//!
//! [`LensConfig`] is persisted as one JSON document under [`LENS_CONFIG_KEY`].
//! Where the bytes live is up to a [`ConfigStore`] adapter; the filesystem
//! one ships in `shexmap-config-fs`.

use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Extension IRI of the map semantic action.
pub const MAP_EXTENSION: &str = "http://shex.io/extensions/Map/";

/// Key under which [`LensConfig`] is stored.
pub const LENS_CONFIG_KEY: &str = "lens";

/// IRI form of [`MAP_EXTENSION`].
pub fn map_extension() -> NamedNode {
    NamedNode::new_unchecked(MAP_EXTENSION)
}

/// Tunables for a [`crate::Lens`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// Semantic-action extension whose tags the lens follows.
    #[serde(with = "crate::iri::as_str")]
    pub extension: NamedNode,
    /// Refuse bindings collected for a different extension instead of
    /// replaying them with a warning.
    pub strict_extension: bool,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            extension: map_extension(),
            strict_extension: false,
        }
    }
}

impl LensConfig {
    /// Reads the config stored under [`LENS_CONFIG_KEY`].
    ///
    /// An absent or empty entry yields the default config.
    pub fn load<S: ConfigStore + ?Sized>(store: &S) -> Result<Self, ConfigError> {
        let Some(bytes) = store.load_raw(LENS_CONFIG_KEY)? else {
            debug!(key = LENS_CONFIG_KEY, "no stored lens config; using defaults");
            return Ok(Self::default());
        };
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Malformed {
            key: LENS_CONFIG_KEY.to_owned(),
            source,
        })
    }

    /// Writes this config under [`LENS_CONFIG_KEY`].
    pub fn save<S: ConfigStore + ?Sized>(&self, store: &S) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(self).map_err(ConfigError::Encode)?;
        store.save_raw(LENS_CONFIG_KEY, &data)?;
        debug!(key = LENS_CONFIG_KEY, bytes = data.len(), "lens config saved");
        Ok(())
    }
}

/// Byte storage for config documents, keyed by logical name.
pub trait ConfigStore {
    /// Bytes stored under `key`, or `None` when nothing is stored.
    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failures while loading or saving a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The key cannot name a stored document.
    #[error("invalid config key `{0}`")]
    InvalidKey(String),
    /// The store's backing medium failed.
    #[error("config i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document is not a valid config.
    #[error("config `{key}` is malformed: {source}")]
    Malformed {
        /// Key of the document.
        key: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The config could not be encoded.
    #[error("config could not be encoded: {0}")]
    Encode(serde_json::Error),
    /// The store could not be reached at all.
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: LensConfig = serde_json::from_str(r#"{"strict_extension": true}"#).unwrap();
        assert!(cfg.strict_extension);
        assert_eq!(cfg.extension.as_str(), MAP_EXTENSION);
    }

    #[test]
    fn extension_is_stored_as_bare_text() {
        let json = serde_json::to_value(LensConfig::default()).unwrap();
        assert_eq!(json["extension"], MAP_EXTENSION);
    }

    #[test]
    fn extension_must_be_absolute() {
        let err = serde_json::from_str::<LensConfig>(r#"{"extension":"relative"}"#);
        assert!(err.is_err());
    }
}
