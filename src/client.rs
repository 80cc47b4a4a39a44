//! HTTP client for the product-catalog API.
//!
//! Wraps `reqwest` with the API's error shape (`{"detail": ...}` on failure),
//! bearer-token handling and typed response decoding. Every request carries a
//! fresh `x-request-id` so client and server logs can be correlated.

use std::time::{Duration, Instant};

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::{
        auth::{Credentials, LoginResponse, Welcome},
        cart::CheckoutRequest,
        orders::CheckoutResponse,
        products::{CreateProductRequest, UpdateProductRequest},
    },
    error::{AppError, AppResult},
    models::{Product, User},
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client for the storefront API.
///
/// Use [`ApiClient::new`] with a loaded [`AppConfig`], or
/// [`ApiClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        Self::with_base_url(config.api_url.as_str(), config.timeout_secs)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Network`] if the `reqwest::Client` cannot be
    /// built, or [`AppError::Config`] if `base_url` does not parse.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // A trailing slash keeps any path prefix when joining relative paths.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| AppError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Sets the bearer token attached to every following request.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub async fn ping(&self) -> AppResult<Welcome> {
        let body = self.send(self.request(Method::GET, "")?).await?;
        decode("GET /", &body)
    }

    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let body = self.send(self.request(Method::GET, "products/")?).await?;
        decode("GET /products/", &body)
    }

    pub async fn get_product(&self, id: i64) -> AppResult<Product> {
        let path = format!("products/{id}");
        let body = self.send(self.request(Method::GET, &path)?).await?;
        decode(&format!("GET /{path}"), &body)
    }

    pub async fn create_product(&self, payload: &CreateProductRequest) -> AppResult<Product> {
        let request = self.request(Method::POST, "products/")?.json(payload);
        let body = self.send(request).await?;
        decode("POST /products/", &body)
    }

    pub async fn update_product(
        &self,
        id: i64,
        payload: &UpdateProductRequest,
    ) -> AppResult<Product> {
        let path = format!("products/{id}");
        let request = self.request(Method::PUT, &path)?.json(payload);
        let body = self.send(request).await?;
        decode(&format!("PUT /{path}"), &body)
    }

    /// Any 2xx counts as deleted; the body is ignored.
    pub async fn delete_product(&self, id: i64) -> AppResult<()> {
        let path = format!("products/{id}");
        self.send(self.request(Method::DELETE, &path)?).await?;
        Ok(())
    }

    pub async fn checkout(&self, payload: &CheckoutRequest) -> AppResult<CheckoutResponse> {
        let request = self.request(Method::POST, "checkout")?.json(payload);
        let body = self.send(request).await?;
        decode("POST /checkout", &body)
    }

    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginResponse> {
        let request = self.request(Method::POST, "login")?.json(credentials);
        let body = self.send(request).await?;
        decode("POST /login", &body)
    }

    pub async fn register(&self, credentials: &Credentials) -> AppResult<User> {
        let request = self.request(Method::POST, "register")?.json(credentials);
        let body = self.send(request).await?;
        decode("POST /register", &body)
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| AppError::Config(format!("invalid request path '{path}': {e}")))?;
        let mut builder = self
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    /// Sends the request and returns the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// [`AppError::Network`] when no response arrives, [`AppError::Api`] for
    /// any other status, carrying the body's `detail` string when present.
    async fn send(&self, builder: RequestBuilder) -> AppResult<String> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(%method, %url, request_id = %request_id, "request started");
        let started = Instant::now();
        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%method, %url, request_id = %request_id, error = %err, "request failed");
                return Err(err.into());
            }
        };
        let status = response.status();
        let body = response.text().await?;
        tracing::info!(
            %method,
            %url,
            request_id = %request_id,
            status = %status,
            ms = %started.elapsed().as_millis(),
            "request finished"
        );

        if !status.is_success() {
            return Err(AppError::Api {
                status,
                detail: extract_detail(&body),
            });
        }
        Ok(body)
    }
}

fn decode<T: DeserializeOwned>(context: &str, body: &str) -> AppResult<T> {
    serde_json::from_str(body).map_err(|source| AppError::Decode {
        context: context.to_string(),
        source,
    })
}

/// Pulls a string `detail` out of an error body. Structured details (such
/// as validation error lists) are not user-facing text and are skipped.
fn extract_detail(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("detail")?
        .as_str()
        .map(str::to_string)
}
