//! Key/value persistence
//!
//! Durable state is optional and best-effort: a failed read behaves like an
//! absent key, a failed write is logged. Stores report failures through
//! `anyhow`; the JSON helpers on `Context` turn them into `Error::Storage`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[cfg(feature = "web")]
use anyhow::Context as _;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::component::Context;
use crate::Error;

/// String key/value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;

    fn remove(&mut self, key: &str) -> anyhow::Result<()>;
}

/// In-memory store
///
/// Clones share their contents, so a second application built over a clone
/// sees what the first one wrote, as after a page reload.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// The browser's `localStorage`
#[cfg(feature = "web")]
pub struct LocalStore {
    storage: web_sys::Storage,
}

#[cfg(feature = "web")]
impl LocalStore {
    pub fn new() -> anyhow::Result<Self> {
        let storage = web_sys::window()
            .context("no window")?
            .local_storage()
            .map_err(|e| anyhow::anyhow!("localStorage is not accessible: {e:?}"))?
            .context("localStorage is not available")?;
        Ok(Self { storage })
    }
}

#[cfg(feature = "web")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| anyhow::anyhow!("cannot read {key}: {e:?}"))
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| anyhow::anyhow!("cannot write {key}: {e:?}"))
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| anyhow::anyhow!("cannot remove {key}: {e:?}"))
    }
}

impl Context {
    /// Read a JSON value stored under the application's namespaced key
    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, Error> {
        let key = self.config().storage_key(name);
        let raw = self
            .store()
            .get(&key)
            .map_err(|e| Error::Storage(format!("cannot read {key}: {e:#}")))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw)
            .map_err(|e| Error::Storage(format!("malformed JSON under {key}: {e}")))?;
        Ok(Some(value))
    }

    /// Store a value as JSON under the application's namespaced key
    pub fn save_json<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> Result<(), Error> {
        let key = self.config().storage_key(name);
        let raw = serde_json::to_string(value)
            .map_err(|e| Error::Storage(format!("cannot encode {key}: {e}")))?;
        self.store_mut()
            .set(&key, &raw)
            .map_err(|e| Error::Storage(format!("cannot write {key}: {e:#}")))
    }

    /// Like `load_json`, logging failures and treating them as absent
    pub fn restore<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        match self.load_json(name) {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring stored {}: {}", name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::platform::MemoryDocument;

    #[test]
    fn test_json_round_trips_under_namespaced_key() {
        let store = MemoryStore::new();
        let mut ctx = Context::new(
            AppConfig::default(),
            Box::new(MemoryDocument::new()),
            Box::new(store.clone()),
        );

        ctx.save_json("dashboard", &vec!["a", "b"]).unwrap();
        assert_eq!(store.get("#m#orbit_dashboard").unwrap().as_deref(), Some("[\"a\",\"b\"]"));
        assert_eq!(ctx.restore::<Vec<String>>("dashboard"), Some(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_malformed_entries_are_treated_as_absent() {
        let mut store = MemoryStore::new();
        store.set("#m#orbit_dashboard", "{not json").unwrap();
        let ctx = Context::new(
            AppConfig::default(),
            Box::new(MemoryDocument::new()),
            Box::new(store),
        );

        assert!(matches!(
            ctx.load_json::<Vec<String>>("dashboard"),
            Err(Error::Storage(_))
        ));
        assert_eq!(ctx.restore::<Vec<String>>("dashboard"), None);
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("store is read-only, refusing {key}")
        }

        fn remove(&mut self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_is_a_storage_error() {
        let mut ctx = Context::new(
            AppConfig::default(),
            Box::new(MemoryDocument::new()),
            Box::new(ReadOnlyStore),
        );

        let err = ctx.save_json("dashboard", &vec!["a"]).unwrap_err();
        assert!(matches!(err, Error::Storage(ref message) if message.contains("read-only")));
    }
}
