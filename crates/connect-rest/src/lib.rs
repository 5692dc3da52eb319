//! [`Backend`] implementation for a hosted PostgREST + GoTrue service
//! (the REST and auth APIs of a Supabase project).

pub mod params;

use std::sync::Arc;

use connect_types::models::Identity;
use connect_types::{Backend, BackendError, Query, Row, Table};
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("backend anon key is empty")]
    MissingKey,
}

/// Project endpoint and public (anon) API key.
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub url: Url,
    pub anon_key: String,
}

impl RestConfig {
    pub fn new(url: &str, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        let anon_key = anon_key.into();
        if anon_key.is_empty() {
            return Err(ConfigError::MissingKey);
        }

        // Trailing slash so joins append instead of replacing the last segment.
        let normalized = format!("{}/", url.trim_end_matches('/'));
        let url = Url::parse(&normalized).map_err(|e| ConfigError::Url {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { url, anon_key })
    }
}

/// Talks to the hosted backend as one user (or anonymously).
pub struct RestBackend {
    http: Client,
    config: Arc<RestConfig>,
    access_token: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "msg", alias = "error_description")]
    message: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> Self {
        Self {
            http: Client::new(),
            config: Arc::new(config),
            access_token: RwLock::new(None),
        }
    }

    /// A backend for the holder of `token`, sharing this one's connection pool.
    pub fn with_access_token(&self, token: impl Into<String>) -> Self {
        self.for_session(Some(token.into()))
    }

    /// Like [`with_access_token`](Self::with_access_token), anonymous when
    /// there is no token.
    pub fn for_session(&self, access_token: Option<String>) -> Self {
        Self {
            http: self.http.clone(),
            config: self.config.clone(),
            access_token: RwLock::new(access_token),
        }
    }

    fn token(&self) -> Option<String> {
        self.access_token.read().clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.config
            .url
            .join(path)
            .map_err(|e| BackendError::InvalidRequest(format!("bad endpoint {}: {}", path, e)))
    }

    fn table_url(&self, table: Table) -> Result<Url, BackendError> {
        self.endpoint(&format!("rest/v1/{}", table.name()))
    }

    /// Every call carries the anon key; the bearer is the user's token when
    /// signed in, otherwise the anon key itself.
    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self.token().unwrap_or_else(|| self.config.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }

    async fn write(
        &self,
        method: Method,
        table: Table,
        id: Option<Uuid>,
        body: Option<&Row>,
    ) -> Result<Vec<Row>, BackendError> {
        let mut request = self
            .request(method, self.table_url(table)?)
            .header("Prefer", "return=representation");
        if let Some(id) = id {
            request = request.query(&[("id", format!("eq.{}", id))]);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport)?;
        rows(response).await
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    warn!("Backend transport error: {}", e);
    BackendError::Transport(e.to_string())
}

fn decode(e: reqwest::Error) -> BackendError {
    BackendError::Decode(e.to_string())
}

/// Maps non-2xx responses onto [`BackendError`]s.
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail: Option<ErrorBody> = serde_json::from_str(&body).ok();
    let code = detail.as_ref().and_then(|d| d.code.as_ref()).map(|c| match c {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    let message = detail.and_then(|d| d.message).unwrap_or(body);

    debug!("Backend returned {}: {}", status, message);
    Err(if status == StatusCode::UNAUTHORIZED {
        BackendError::Unauthenticated
    } else if status == StatusCode::FORBIDDEN || code.as_deref() == Some("42501") {
        BackendError::PolicyViolation(message)
    } else {
        BackendError::Status {
            status: status.as_u16(),
            message,
        }
    })
}

async fn rows(response: Response) -> Result<Vec<Row>, BackendError> {
    check(response).await?.json::<Vec<Row>>().await.map_err(decode)
}

impl Backend for RestBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        let Some(token) = self.token() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;

        // An expired or revoked token simply means nobody is signed in.
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("Session token rejected by auth service");
            return Ok(None);
        }

        let user: AuthUser = check(response).await?.json().await.map_err(decode)?;
        Ok(Some(Identity {
            id: user.id,
            email: user.email,
        }))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let Some(token) = self.token() else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;

        *self.access_token.write() = None;
        Ok(())
    }

    async fn select(&self, query: &Query) -> Result<Vec<Row>, BackendError> {
        let response = self
            .request(Method::GET, self.table_url(query.table)?)
            .query(&params::query_pairs(query))
            .send()
            .await
            .map_err(transport)?;
        rows(response).await
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, BackendError> {
        self.write(Method::POST, table, None, Some(&row))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode(format!("insert into {} returned no row", table)))
    }

    async fn update(&self, table: Table, id: Uuid, patch: Row) -> Result<Row, BackendError> {
        self.write(Method::PATCH, table, Some(id), Some(&patch))
            .await?
            .into_iter()
            .next()
            .ok_or(BackendError::NoRowsAffected { table, id })
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), BackendError> {
        let deleted = self.write(Method::DELETE, table, Some(id), None).await?;
        if deleted.is_empty() {
            return Err(BackendError::NoRowsAffected { table, id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_normalizes_trailing_slash() {
        let config = RestConfig::new("https://abc.supabase.co", "anon").unwrap();
        assert_eq!(
            config.url.join("rest/v1/events").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/events"
        );

        let config = RestConfig::new("https://abc.supabase.co/", "anon").unwrap();
        assert_eq!(config.url.as_str(), "https://abc.supabase.co/");
    }

    #[test]
    fn config_rejects_bad_input() {
        assert!(matches!(
            RestConfig::new("not a url", "anon"),
            Err(ConfigError::Url { .. })
        ));
        assert!(matches!(
            RestConfig::new("https://abc.supabase.co", ""),
            Err(ConfigError::MissingKey)
        ));
    }

    #[test]
    fn token_scoped_backends_share_config() {
        let base = RestBackend::new(RestConfig::new("https://abc.supabase.co", "anon").unwrap());
        assert_eq!(base.token(), None);

        let user = base.with_access_token("jwt");
        assert_eq!(user.token().as_deref(), Some("jwt"));
        assert!(Arc::ptr_eq(&base.config, &user.config));

        let anonymous = user.for_session(None);
        assert_eq!(anonymous.token(), None);
    }
}
