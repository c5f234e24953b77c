//! Supabase adapter: configuration, auth session handling and a
//! [`DataSource`](crate::store::DataSource) over the PostgREST API.
//!
//! Two handle flavours exist. [`SupabaseClient::browser`] keeps its session in
//! a private cookie jar; [`SupabaseClient::server`] is bound to the request's
//! [`CookieStore`], which may be read-only.

mod auth;
mod cookies;
mod rest;

pub use auth::{AuthUser, Session};
pub use cookies::{CookieError, CookieStore, MemoryCookieStore, ReadOnlyCookies};

use std::sync::{Arc, RwLock};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::ConfigError;

pub const URL_ENV: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const ANON_KEY_ENV: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

/// Project URL and public anon key.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: Url,
    pub anon_key: SecretString,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
        };

        let raw_url = require(URL_ENV)?;
        let anon_key = require(ANON_KEY_ENV)?;
        let url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidValue {
            key: URL_ENV.to_string(),
            message: e.to_string(),
        })?;
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidValue {
                key: URL_ENV.to_string(),
                message: "URL has no host".to_string(),
            });
        }

        Ok(Self {
            url,
            anon_key: SecretString::from(anon_key),
        })
    }

    /// First label of the project host (`abcd` for `abcd.supabase.co`).
    pub fn project_ref(&self) -> &str {
        let host = self.url.host_str().unwrap_or_default();
        host.split('.').next().unwrap_or(host)
    }

    /// Name of the cookie holding the JSON session.
    pub fn session_cookie_name(&self) -> String {
        format!("sb-{}-auth-token", self.project_ref())
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
    }
}

/// Where a handle was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientContext {
    Browser,
    Server,
}

/// Handle to one Supabase project.
pub struct SupabaseClient {
    config: SupabaseConfig,
    context: ClientContext,
    http: reqwest::blocking::Client,
    cookies: Arc<dyn CookieStore>,
    /// Bearer token of the last session seen; the anon key otherwise.
    access_token: RwLock<Option<SecretString>>,
}

impl SupabaseClient {
    /// Handle for client-side use, authenticated with the anon key.
    pub fn browser(config: SupabaseConfig) -> Self {
        Self::build(
            config,
            ClientContext::Browser,
            Arc::new(MemoryCookieStore::new()),
        )
    }

    /// Handle bound to the current request's cookies.
    pub fn server(config: SupabaseConfig, cookies: Arc<dyn CookieStore>) -> Self {
        Self::build(config, ClientContext::Server, cookies)
    }

    fn build(
        config: SupabaseConfig,
        context: ClientContext,
        cookies: Arc<dyn CookieStore>,
    ) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        tracing::debug!(project = config.project_ref(), ?context, "Created Supabase client");
        Self {
            config,
            context,
            http,
            cookies,
            access_token: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    pub fn context(&self) -> ClientContext {
        self.context
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .ok()
            .and_then(|token| token.as_ref().map(|t| t.expose_secret().to_string()))
            .unwrap_or_else(|| self.config.anon_key.expose_secret().to_string())
    }

    fn remember_token(&self, token: &str) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = Some(SecretString::from(token.to_string()));
        }
    }

    /// Write a cookie, logging and ignoring read-only failures.
    fn write_cookie(&self, name: &str, value: &str) {
        match self.cookies.set(name, value) {
            Ok(()) => {}
            Err(CookieError::ReadOnly) => {
                tracing::warn!(cookie = name, "Cookie store is read-only; session not persisted");
            }
            Err(e) => {
                tracing::warn!(cookie = name, error = %e, "Failed to write cookie");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> SupabaseConfig {
        SupabaseConfig::from_lookup(|key| match key {
            URL_ENV => Some("https://abcd1234.supabase.co".into()),
            ANON_KEY_ENV => Some("anon-key".into()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_config_requires_both_values() {
        let err = SupabaseConfig::from_lookup(|key| match key {
            URL_ENV => Some("https://abcd.supabase.co".into()),
            ANON_KEY_ENV => Some("   ".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(key) if key == ANON_KEY_ENV));

        let err = SupabaseConfig::from_lookup(|key| match key {
            URL_ENV => Some("not a url".into()),
            ANON_KEY_ENV => Some("anon".into()),
            _ => None,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_cookie_name_uses_project_ref() {
        let config = config();
        assert_eq!(config.project_ref(), "abcd1234");
        assert_eq!(config.session_cookie_name(), "sb-abcd1234-auth-token");
        assert_eq!(
            config.endpoint("/rest/v1/clients").unwrap().as_str(),
            "https://abcd1234.supabase.co/rest/v1/clients"
        );
    }

    #[test]
    fn test_anon_key_is_default_bearer() {
        let client = SupabaseClient::browser(config());
        assert_eq!(client.context(), ClientContext::Browser);
        assert_eq!(client.bearer(), "anon-key");

        client.remember_token("user-jwt");
        assert_eq!(client.bearer(), "user-jwt");
    }

    #[test]
    fn test_read_only_cookie_write_is_ignored() {
        let cookies = Arc::new(ReadOnlyCookies::new(HashMap::new()));
        let client = SupabaseClient::server(config(), cookies.clone());
        client.write_cookie("sb-abcd1234-auth-token", "{}");
        assert_eq!(cookies.get("sb-abcd1234-auth-token"), None);
    }
}
