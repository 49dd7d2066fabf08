//! Session token storage

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::RwLock;

use anyhow::Result;

/// Store key for the short-lived access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Store key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Store key for the role reported by the profile endpoint at login
pub const USER_ROLE_KEY: &str = "user_role";

/// Access/refresh token pair issued by `/token/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Process-wide string key-value store holding the session.
///
/// Implementations synchronise internally; the gateway and every in-flight
/// request share one instance behind an `Arc`.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// Drop every key, not only the tokens.
    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    fn set_credentials(&self, pair: &CredentialPair) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        self.set(REFRESH_TOKEN_KEY, &pair.refresh_token)
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, String>>,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(access: &str, refresh: Option<&str>) -> Self {
        let mut values = HashMap::new();
        values.insert(ACCESS_TOKEN_KEY.to_string(), access.to_string());
        if let Some(refresh) = refresh {
            values.insert(REFRESH_TOKEN_KEY.to_string(), refresh.to_string());
        }
        Self {
            values: RwLock::new(values),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        Ok(())
    }
}
