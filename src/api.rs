// Remote client module: a small blocking HTTP client for the Supabase REST
// surface (GoTrue for auth, PostgREST for tables). Everything above this
// module talks to the `RemoteService` trait so it can run against a fake.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};

/// Email/password pair used for both sign-up and sign-in.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The authenticated user for the rest of the process. Never written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Equality filter for a select, rendered as `column=eq.value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Filter {
            column: column.into(),
            value: value.to_string(),
        }
    }
}

/// The operations this client needs from the hosted backend.
///
/// Implementations must be cheap to clone: the UI hands a clone to every
/// background worker.
pub trait RemoteService: Clone + Send + 'static {
    fn sign_up(&self, credentials: &Credentials) -> Result<()>;
    fn sign_in(&self, credentials: &Credentials) -> Result<Session>;
    /// Authenticate subsequent table requests as the session's user.
    fn set_session(&mut self, session: &Session);
    /// Insert `rows` (a JSON array) and return the records the service echoes back.
    fn insert(&self, table: &str, rows: &Value) -> Result<Vec<Value>>;
    fn select(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
}

/// Blocking client holding the base URL, the anon key and, once signed in,
/// the session's access token.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    anon_key: String,
    auth_timeout: Duration,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Only sign-in gets a deadline; everything else waits as long as the
        // service takes.
        let client = Client::builder().timeout(None).build()?;
        Ok(ApiClient {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            auth_timeout: config.auth_timeout,
            token: None,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&self.anon_key)?);
        let bearer = self.token.as_deref().unwrap_or(&self.anon_key);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {bearer}"))?);
        Ok(headers)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let res = request.headers(self.headers()?).send()?;
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let body = res.text().unwrap_or_default();
        Err(Error::Service {
            status,
            message: service_message(&body),
        })
    }

    fn rows(res: Response) -> Result<Vec<Value>> {
        let body = res.text()?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&body)? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            single => Ok(vec![single]),
        }
    }
}

impl RemoteService for ApiClient {
    fn sign_up(&self, credentials: &Credentials) -> Result<()> {
        tracing::info!(email = %credentials.email, "signing up");
        self.send(self.client.post(self.auth_url("signup")).json(credentials))?;
        Ok(())
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        tracing::info!(email = %credentials.email, "signing in");
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .timeout(self.auth_timeout)
            .json(credentials);
        let body = self.send(request)?.text()?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(Session {
            user_id: token.user.id,
            access_token: token.access_token,
        })
    }

    fn set_session(&mut self, session: &Session) {
        self.token = Some(session.access_token.clone());
    }

    fn insert(&self, table: &str, rows: &Value) -> Result<Vec<Value>> {
        tracing::debug!(table, "insert");
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(rows);
        Self::rows(self.send(request)?)
    }

    fn select(&self, table: &str, filter: Option<&Filter>) -> Result<Vec<Value>> {
        tracing::debug!(table, ?filter, "select");
        let mut query = vec![("select".to_string(), "*".to_string())];
        if let Some(f) = filter {
            query.push((f.column.clone(), format!("eq.{}", f.value)));
        }
        let request = self.client.get(self.table_url(table)).query(&query);
        Self::rows(self.send(request)?)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw)
        .map_err(|_| Error::Config("credential contains characters not allowed in a header".into()))
}

/// Pull the human-readable part out of an error body. GoTrue and PostgREST
/// disagree on the field name, so try the known ones before falling back to
/// the raw text.
fn service_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(Value::String(text)) = map.get(key) {
                return text.clone();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".into()
    } else {
        trimmed.to_string()
    }
}
