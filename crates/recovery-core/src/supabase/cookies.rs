//! Cookie access for session persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieError {
    /// The request context does not allow setting cookies (for example a
    /// server-rendered component).
    #[error("cookie store is read-only")]
    ReadOnly,

    #[error("cookie store unavailable: {0}")]
    Unavailable(String),
}

/// Where the auth session cookie lives.
pub trait CookieStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str) -> Result<(), CookieError>;
    fn remove(&self, name: &str) -> Result<(), CookieError>;
}

/// Writable in-process cookie jar.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: RwLock<HashMap<String, String>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.read().ok()?.get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) -> Result<(), CookieError> {
        self.cookies
            .write()
            .map_err(|e| CookieError::Unavailable(e.to_string()))?
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), CookieError> {
        self.cookies
            .write()
            .map_err(|e| CookieError::Unavailable(e.to_string()))?
            .remove(name);
        Ok(())
    }
}

/// Snapshot of request cookies that rejects every write.
#[derive(Debug, Default, Clone)]
pub struct ReadOnlyCookies {
    cookies: HashMap<String, String>,
}

impl ReadOnlyCookies {
    pub fn new(cookies: HashMap<String, String>) -> Self {
        Self { cookies }
    }
}

impl CookieStore for ReadOnlyCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn set(&self, _name: &str, _value: &str) -> Result<(), CookieError> {
        Err(CookieError::ReadOnly)
    }

    fn remove(&self, _name: &str) -> Result<(), CookieError> {
        Err(CookieError::ReadOnly)
    }
}
