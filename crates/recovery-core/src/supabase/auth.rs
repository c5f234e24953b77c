//! Session cookie and auth API helpers.

use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::SupabaseClient;

/// Authenticated Supabase user as returned by `/auth/v1/user`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Auth session as stored in the `sb-<ref>-auth-token` cookie.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .finish()
    }
}

impl Session {
    /// Expired at `now`. Sessions without an expiry never expire locally.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now.timestamp())
    }

    fn fill_expiry(&mut self, now: DateTime<Utc>) {
        if self.expires_at.is_none() {
            self.expires_at = self.expires_in.map(|secs| now.timestamp() + secs);
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid session cookie: {0}")]
    Cookie(#[from] serde_json::Error),

    #[error("invalid auth URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SupabaseClient {
    /// Current session from the cookie, refreshed when expired.
    ///
    /// Errors are logged and reported as no session.
    pub fn get_session(&self) -> Option<Session> {
        match self.load_session(Utc::now()) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load Supabase session");
                None
            }
        }
    }

    /// User owning the current session.
    ///
    /// Errors are logged and reported as no user.
    pub fn get_current_user(&self) -> Option<AuthUser> {
        let session = self.get_session()?;
        match self.fetch_user(&session) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch current Supabase user");
                None
            }
        }
    }

    /// Persist `session` to the cookie store (read-only stores are ignored).
    pub fn set_session(&self, session: &Session) {
        self.remember_token(&session.access_token);
        match serde_json::to_string(session) {
            Ok(json) => self.write_cookie(&self.config.session_cookie_name(), &json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize Supabase session"),
        }
    }

    /// Drop the session cookie and fall back to the anon key.
    pub fn sign_out(&self) {
        if let Ok(mut slot) = self.access_token.write() {
            *slot = None;
        }
        let name = self.config.session_cookie_name();
        if let Err(e) = self.cookies.remove(&name) {
            tracing::warn!(cookie = %name, error = %e, "Failed to clear session cookie");
        }
    }

    fn load_session(&self, now: DateTime<Utc>) -> Result<Option<Session>, AuthError> {
        let Some(raw) = self.cookies.get(&self.config.session_cookie_name()) else {
            return Ok(None);
        };
        let session: Session = serde_json::from_str(&raw)?;
        if !session.is_expired(now) {
            self.remember_token(&session.access_token);
            return Ok(Some(session));
        }

        tracing::debug!("Supabase session expired, refreshing");
        let mut refreshed = self.refresh(&session.refresh_token)?;
        refreshed.fill_expiry(now);
        self.set_session(&refreshed);
        Ok(Some(refreshed))
    }

    fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let mut url = self.config.endpoint("auth/v1/token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let response = self
            .http
            .post(url)
            .header("apikey", self.config.anon_key.expose_secret())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()?;
        read_json(response)
    }

    fn fetch_user(&self, session: &Session) -> Result<AuthUser, AuthError> {
        let response = self
            .http
            .get(self.config.endpoint("auth/v1/user")?)
            .header("apikey", self.config.anon_key.expose_secret())
            .bearer_auth(&session.access_token)
            .send()?;
        read_json(response)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<T, AuthError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::Status {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        });
    }
    Ok(response.json()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supabase::{MemoryCookieStore, ReadOnlyCookies, SupabaseConfig};
    use crate::supabase::CookieStore;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn config() -> SupabaseConfig {
        SupabaseConfig::from_lookup(|key| match key {
            "NEXT_PUBLIC_SUPABASE_URL" => Some("https://proj.supabase.co".into()),
            "NEXT_PUBLIC_SUPABASE_ANON_KEY" => Some("anon".into()),
            _ => None,
        })
        .unwrap()
    }

    fn session(expires_at: DateTime<Utc>) -> Session {
        Session {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: Some(expires_at.timestamp()),
            expires_in: None,
            token_type: Some("bearer".into()),
            user: None,
        }
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        assert!(session(now - Duration::seconds(1)).is_expired(now));
        assert!(!session(now + Duration::hours(1)).is_expired(now));

        let mut open_ended = session(now);
        open_ended.expires_at = None;
        assert!(!open_ended.is_expired(now));

        open_ended.expires_in = Some(3600);
        open_ended.fill_expiry(now);
        assert_eq!(open_ended.expires_at, Some(now.timestamp() + 3600));
    }

    #[test]
    fn test_no_cookie_means_no_session() {
        let client = SupabaseClient::browser(config());
        assert_eq!(client.get_session(), None);
        assert_eq!(client.get_current_user(), None);
    }

    #[test]
    fn test_valid_cookie_session_is_used() {
        let cookies = Arc::new(MemoryCookieStore::new());
        let client = SupabaseClient::server(config(), cookies.clone());
        let stored = session(Utc::now() + Duration::hours(1));
        client.set_session(&stored);

        assert!(cookies.get("sb-proj-auth-token").is_some());
        assert_eq!(client.get_session(), Some(stored));
        assert_eq!(client.bearer(), "access");
    }

    #[test]
    fn test_garbage_cookie_is_logged_not_raised() {
        let cookies = HashMap::from([("sb-proj-auth-token".to_string(), "{oops".to_string())]);
        let client = SupabaseClient::server(config(), Arc::new(ReadOnlyCookies::new(cookies)));
        assert_eq!(client.get_session(), None);
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session(Utc::now()));
        assert!(!rendered.contains("access\""));
        assert!(rendered.contains("REDACTED"));
    }
}
