//! Host application: a named config container plus an extension registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use core_config::AppConfig;

type Extension = Arc<dyn Any + Send + Sync>;

/// The application an extension binds to.
///
/// Shared as `Arc<Application>`. Config and registry use interior
/// mutability so extensions can be bound after the application is shared.
pub struct Application {
    name: String,
    config: RwLock<AppConfig>,
    extensions: RwLock<HashMap<String, Extension>>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_config(name, AppConfig::new())
    }

    pub fn with_config(name: impl Into<String>, config: AppConfig) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            config: RwLock::new(config),
            extensions: RwLock::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> RwLockReadGuard<'_, AppConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config_mut(&self) -> RwLockWriteGuard<'_, AppConfig> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `extension` under `key`, replacing any earlier entry
    pub fn register_extension<T>(&self, key: impl Into<String>, extension: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        self.extensions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), extension);
    }

    /// Look up an extension; `None` if absent or registered with another type
    pub fn extension<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self
            .extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()?;
        entry.downcast::<T>().ok()
    }

    pub fn has_extension(&self, key: &str) -> bool {
        self.extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();

        f.debug_struct("Application")
            .field("name", &self.name)
            .field("config_keys", &self.config().len())
            .field("extensions", &keys)
            .finish()
    }
}
