// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use shexmap_core::{ConfigError, ConfigStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory [`ConfigStore`] with call counters and failure injection.
///
/// Clones share the same backing map, so a test can save through one clone
/// and inspect the other.
///
/// ```
/// use shexmap_dry_tests::InMemoryConfigStore;
/// use shexmap_core::{LensConfig, LENS_CONFIG_KEY};
///
/// let store = InMemoryConfigStore::new();
/// LensConfig::default().save(&store).unwrap();
/// assert!(store.contains_key(LENS_CONFIG_KEY));
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    data: BTreeMap<String, Vec<u8>>,
    loads: usize,
    saves: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding one JSON document under `key`.
    pub fn with_json(key: &str, json: &str) -> Self {
        let store = Self::new();
        store
            .state()
            .data
            .insert(key.to_owned(), json.as_bytes().to_vec());
        store
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every subsequent load fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.state().fail_on_load = fail;
    }

    /// Makes every subsequent save fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.state().fail_on_save = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.state().loads
    }

    /// Number of `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    /// True when `key` holds a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.state().data.contains_key(key)
    }

    /// Raw bytes stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.state().data.get(key).cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let mut state = self.state();
        state.loads += 1;
        if state.fail_on_load {
            return Err(ConfigError::Unavailable("simulated load failure".into()));
        }
        Ok(state.data.get(key).cloned())
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut state = self.state();
        state.saves += 1;
        if state.fail_on_save {
            return Err(ConfigError::Unavailable("simulated save failure".into()));
        }
        state.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
