//! HTTP client for the hosted backend: PostgREST tables under `/rest/v1` and
//! the auth service under `/auth/v1`.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Serialize, de::DeserializeOwned};
use tracing::trace;

use crate::{auth::SecretToken, retry::RetryPolicy};

mod errors;

pub use errors::{INSUFFICIENT_PRIVILEGE, RestError};

/// Query string pairs, e.g. `("status", "eq.active")`.
pub type Query<'a> = [(&'a str, String)];

/// Configuration for connecting to the backend.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Project base URL, e.g. `"https://abc.example.co"`.
    pub url: String,

    /// Public anonymous API key sent with every request.
    pub anon_key: SecretToken,
}

/// Backend REST client.
///
/// Requests carry the session access token when one is attached, otherwise
/// the anonymous key, so row-level security sees the right identity.
#[derive(Debug, Clone)]
pub struct RestClient {
    config: RestConfig,
    http: Client,
    retry: RetryPolicy,
    access_token: Option<SecretToken>,
}

impl RestClient {
    /// Create a new client from the given configuration.
    #[must_use]
    pub fn new(config: RestConfig, retry: RetryPolicy) -> Self {
        Self {
            config,
            http: Client::new(),
            retry,
            access_token: None,
        }
    }

    /// A copy of this client that authenticates as the given session.
    #[must_use]
    pub fn with_access_token(&self, token: SecretToken) -> Self {
        Self {
            access_token: Some(token),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// `GET /rest/v1/{table}` with PostgREST filters.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, non-2xx status or an undecodable body.
    pub async fn select<T>(&self, table: &str, query: &Query<'_>) -> Result<Vec<T>, RestError>
    where
        T: DeserializeOwned,
    {
        self.send_json(Method::GET, &Self::table_path(table), query, None::<&()>)
            .await
    }

    /// `POST /rest/v1/{table}` returning the inserted rows.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, non-2xx status or an undecodable body.
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<Vec<T>, RestError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, &Self::table_path(table), &[], Some(body))
            .await
    }

    /// `PATCH /rest/v1/{table}` returning the updated rows.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, non-2xx status or an undecodable body.
    pub async fn update<B, T>(
        &self,
        table: &str,
        filters: &Query<'_>,
        body: &B,
    ) -> Result<Vec<T>, RestError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, &Self::table_path(table), filters, Some(body))
            .await
    }

    /// `DELETE /rest/v1/{table}`, returning how many rows were removed.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, non-2xx status or an undecodable body.
    pub async fn delete(&self, table: &str, filters: &Query<'_>) -> Result<usize, RestError> {
        let rows: Vec<serde_json::Value> = self
            .send_json(Method::DELETE, &Self::table_path(table), filters, None::<&()>)
            .await?;

        Ok(rows.len())
    }

    /// `POST /auth/v1/{path}`.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, non-2xx status or an undecodable body.
    pub async fn auth_post<B, T>(
        &self,
        path: &str,
        query: &Query<'_>,
        body: &B,
    ) -> Result<T, RestError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, &Self::auth_path(path), query, Some(body))
            .await
    }

    /// `POST /auth/v1/{path}` where the response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or non-2xx status.
    pub async fn auth_post_empty(&self, path: &str) -> Result<(), RestError> {
        let path = Self::auth_path(path);

        let path = path.as_str();

        self.retry
            .run(move || async move {
                let response = self.request(Method::POST, path, &[]).send().await?;

                Self::check(response).await.map(drop)
            })
            .await
    }

    /// `GET /auth/v1/{path}`.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, non-2xx status or an undecodable body.
    pub async fn auth_get<T>(&self, path: &str) -> Result<T, RestError>
    where
        T: DeserializeOwned,
    {
        self.send_json(Method::GET, &Self::auth_path(path), &[], None::<&()>)
            .await
    }

    fn table_path(table: &str) -> String {
        format!("rest/v1/{table}")
    }

    fn auth_path(path: &str) -> String {
        format!("auth/v1/{path}")
    }

    fn request(&self, method: Method, path: &str, query: &Query<'_>) -> RequestBuilder {
        let url = format!("{}/{path}", self.config.url.trim_end_matches('/'));

        let bearer = self
            .access_token
            .as_ref()
            .unwrap_or(&self.config.anon_key)
            .expose();

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header("apikey", self.config.anon_key.expose())
            .bearer_auth(bearer);

        if !query.is_empty() {
            builder = builder.query(query);
        }

        if matches!(method, Method::POST | Method::PATCH | Method::DELETE) {
            builder = builder.header("Prefer", "return=representation");
        }

        builder
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<&B>,
    ) -> Result<T, RestError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let method = &method;

        self.retry
            .run(move || async move {
                let mut request = self.request(method.clone(), path, query);

                if let Some(body) = body {
                    request = request.json(body);
                }

                trace!(%method, path, "backend request");

                let response = Self::check(request.send().await?).await?;
                let text = response.text().await?;

                Ok(serde_json::from_str(&text)?)
            })
            .await
    }

    async fn check(response: Response) -> Result<Response, RestError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();

        Err(errors::from_response(status, &text))
    }
}
