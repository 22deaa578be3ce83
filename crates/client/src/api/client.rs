//! `reqwest` implementation of [`FoodApi`].

use std::sync::Arc;

use forkline_core::{FoodId, OrderId, UserId};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::wire::{
    AuthResponse, CreateOrderRequest, FoodPayload, LoginRequest, RegisterRequest,
    UpdateOrderRequest, error_message,
};
use super::{AuthFailure, FoodApi};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::{Food, Order, UserProfile};
use crate::session::TokenStore;

/// Capacity of the auth failure channel. Lagging subscribers only need to
/// learn that at least one failure happened.
const AUTH_EVENT_CAPACITY: usize = 16;

/// Whether a call runs under the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    /// Login and registration: rejections are credential errors.
    Public,
    /// Everything else: 401/403 means the session is gone.
    Authenticated,
}

/// HTTP gateway to the Forkline backend.
///
/// Reads the bearer token from the [`TokenStore`] on every request, so a
/// login or logout takes effect on the next call without rebuilding the
/// client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    tokens: TokenStore,
    auth_failures: broadcast::Sender<AuthFailure>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config.api_base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Network` if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        let (auth_failures, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                tokens,
                auth_failures,
            }),
        })
    }

    /// The token store this client reads from.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn request(&self, method: Method, path: &str, call: Call) -> Result<RequestBuilder> {
        let url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| ClientError::Network(format!("invalid request path {path}: {e}")))?;
        let mut request = self.inner.client.request(method, url);
        if call == Call::Authenticated
            && let Some(token) = self.inner.tokens.token()?
        {
            request = request.bearer_auth(token.expose_secret());
        }
        Ok(request)
    }

    /// Send a request and turn any non-2xx status into the matching error.
    async fn dispatch(
        &self,
        request: RequestBuilder,
        path: &str,
        call: Call,
    ) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            error!(path, error = %e, "Request failed before a response arrived");
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!(path, status = status.as_u16(), "Response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status.as_u16(), &body);
        Err(self.classify(status, path, call, message))
    }

    fn classify(&self, status: StatusCode, path: &str, call: Call, message: String) -> ClientError {
        let code = status.as_u16();
        match (call, status) {
            (Call::Public, _) => {
                warn!(path, status = code, "Authentication rejected");
                ClientError::Authentication(message)
            }
            (Call::Authenticated, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                warn!(path, status = code, "Session rejected by backend");
                // No subscribers is fine: nobody holds a session to clear.
                let _ = self.inner.auth_failures.send(AuthFailure {
                    status: code,
                    path: path.to_string(),
                });
                ClientError::Authorization { status: code }
            }
            (Call::Authenticated, StatusCode::NOT_FOUND) => ClientError::NotFound(message),
            (Call::Authenticated, _) => {
                error!(path, status = code, message = %message, "API error");
                ClientError::Api {
                    status: code,
                    message,
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(Method::GET, path, Call::Authenticated)?;
        let response = self.dispatch(request, path, Call::Authenticated).await?;
        decode(response).await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B, call: Call) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path, call)?.json(body);
        let response = self.dispatch(request, path, call).await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

impl FoodApi for ApiClient {
    #[instrument(skip(self, request), fields(identifier = %request.username_or_email))]
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.send(Method::POST, "auth/login", request, Call::Public)
            .await
    }

    #[instrument(skip(self, request), fields(username = %request.username, role = %request.role))]
    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.send(Method::POST, "auth/register", request, Call::Public)
            .await
    }

    #[instrument(skip(self))]
    async fn list_foods(&self) -> Result<Vec<Food>> {
        self.get("foods").await
    }

    #[instrument(skip(self, payload), fields(name = %payload.name))]
    async fn create_food(&self, payload: &FoodPayload) -> Result<Food> {
        self.send(Method::POST, "foods", payload, Call::Authenticated)
            .await
    }

    #[instrument(skip(self, payload))]
    async fn update_food(&self, id: FoodId, payload: &FoodPayload) -> Result<Food> {
        self.send(Method::PUT, &format!("foods/{id}"), payload, Call::Authenticated)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_food(&self, id: FoodId) -> Result<()> {
        let path = format!("foods/{id}");
        let request = self.request(Method::DELETE, &path, Call::Authenticated)?;
        self.dispatch(request, &path, Call::Authenticated).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.get("order").await
    }

    #[instrument(skip(self, request), fields(lines = request.order_items.len(), cost = %request.cost))]
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order> {
        self.send(Method::POST, "order", request, Call::Authenticated)
            .await
    }

    #[instrument(skip(self, request), fields(status = %request.status))]
    async fn update_order(&self, id: OrderId, request: &UpdateOrderRequest) -> Result<Order> {
        self.send(Method::PUT, &format!("order/{id}"), request, Call::Authenticated)
            .await
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: UserId) -> Result<UserProfile> {
        self.get(&format!("users/{id}")).await
    }

    #[instrument(skip(self))]
    async fn list_restaurants(&self) -> Result<Vec<UserProfile>> {
        self.get("users/role/RESTAURANT").await
    }

    fn auth_failures(&self) -> broadcast::Receiver<AuthFailure> {
        self.inner.auth_failures.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        let config = ClientConfig::for_base_url("http://127.0.0.1:9/api").unwrap();
        ApiClient::new(&config, TokenStore::in_memory()).unwrap()
    }

    #[test]
    fn test_paths_join_under_base() {
        let api = client();
        let request = api
            .request(Method::GET, "users/role/RESTAURANT", Call::Authenticated)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://127.0.0.1:9/api/users/role/RESTAURANT"
        );
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_bearer_attached_from_store() {
        let api = client();
        let user = crate::testing::customer(1);
        api.tokens()
            .save(&secrecy::SecretString::from("tok-123"), &user)
            .unwrap();

        let request = api
            .request(Method::GET, "order", Call::Authenticated)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer tok-123"
        );

        let login = api
            .request(Method::POST, "auth/login", Call::Public)
            .unwrap()
            .build()
            .unwrap();
        assert!(login.headers().get("authorization").is_none());
    }

    #[test]
    fn test_forbidden_publishes_auth_failure() {
        let api = client();
        let mut events = api.auth_failures();
        let err = api.classify(
            StatusCode::FORBIDDEN,
            "order",
            Call::Authenticated,
            "Forbidden".to_string(),
        );
        assert!(err.is_authorization());
        assert_eq!(
            events.try_recv().unwrap(),
            AuthFailure {
                status: 403,
                path: "order".to_string()
            }
        );
    }

    #[test]
    fn test_public_rejection_is_authentication() {
        let api = client();
        let mut events = api.auth_failures();
        let err = api.classify(
            StatusCode::UNAUTHORIZED,
            "auth/login",
            Call::Public,
            "Invalid username or password".to_string(),
        );
        assert!(matches!(err, ClientError::Authentication(ref m) if m == "Invalid username or password"));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_other_statuses() {
        let api = client();
        assert!(matches!(
            api.classify(StatusCode::NOT_FOUND, "foods/1", Call::Authenticated, "gone".into()),
            ClientError::NotFound(_)
        ));
        assert!(matches!(
            api.classify(StatusCode::BAD_REQUEST, "order", Call::Authenticated, "bad".into()),
            ClientError::Api { status: 400, .. }
        ));
    }
}
