//! Browser `localStorage` backend for [`crate::persist::KvRepository`].

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::persist::{KeyValueBackend, PersistError};

/// `window.localStorage`, or any other DOM [`Storage`] object.
#[derive(Debug, Clone)]
pub struct BrowserStorage {
    storage: Storage,
}

impl BrowserStorage {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The current window's `localStorage`.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Backend` outside a window context or when
    /// storage access is denied.
    pub fn local() -> Result<Self, PersistError> {
        let window = web_sys::window().ok_or_else(|| PersistError::Backend("no window".into()))?;
        let storage = window
            .local_storage()
            .map_err(backend_error)?
            .ok_or_else(|| PersistError::Backend("localStorage unavailable".into()))?;
        Ok(Self::new(storage))
    }
}

fn backend_error(e: JsValue) -> PersistError {
    PersistError::Backend(format!("{e:?}"))
}

impl KeyValueBackend for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.storage.get_item(key).map_err(backend_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.storage.set_item(key, value).map_err(backend_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.storage.remove_item(key).map_err(backend_error)
    }
}
