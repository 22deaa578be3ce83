//! Authentication session.
//!
//! [`SessionController`] owns the process-wide auth state. It is created
//! explicitly, initialised with [`SessionController::restore`], and torn down
//! with [`SessionController::logout`] or by dropping it. The gateway never
//! touches it directly: authorization failures arrive over the
//! [`FoodApi::auth_failures`] channel and are applied by
//! [`SessionController::handle_auth_failures`].

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, TokenStore, keys};

use forkline_core::Role;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, instrument, warn};

use crate::api::{AuthFailure, AuthResponse, FoodApi, LoginRequest};
use crate::error::{ClientError, Result};
use crate::models::{RegistrationForm, User};

/// Signed-in user and token. Always present or absent together.
#[derive(Debug, Clone)]
struct Credentials {
    user: User,
    token: SecretString,
}

/// Snapshot of the authentication state.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Option<Credentials>,
    is_loading: bool,
}

impl Session {
    const fn loading() -> Self {
        Self {
            credentials: None,
            is_loading: true,
        }
    }

    const fn signed_out() -> Self {
        Self {
            credentials: None,
            is_loading: false,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.credentials.as_ref().map(|c| &c.token)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// True until the stored session has been examined.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }
}

/// Owns the [`Session`] and keeps it in step with the [`TokenStore`].
pub struct SessionController<A> {
    api: A,
    tokens: TokenStore,
    session: Session,
    auth_failures: broadcast::Receiver<AuthFailure>,
}

impl<A> std::fmt::Debug for SessionController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<A: FoodApi> SessionController<A> {
    /// Create a controller in the loading state. Call [`Self::restore`] next.
    pub fn new(api: A, tokens: TokenStore) -> Self {
        let auth_failures = api.auth_failures();
        Self {
            api,
            tokens,
            session: Session::loading(),
            auth_failures,
        }
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Rehydrate from the token store.
    ///
    /// Both a token and a user record must be present; anything less is
    /// treated as signed out and the leftovers are removed.
    pub fn restore(&mut self) -> Option<&User> {
        let token = self.tokens.token();
        let user = self.tokens.user();

        self.session = match (token, user) {
            (Ok(Some(token)), Ok(Some(user))) => {
                info!(user_id = %user.id, role = %user.role, "Restored session");
                Session {
                    credentials: Some(Credentials { user, token }),
                    is_loading: false,
                }
            }
            (Ok(None), Ok(None)) => Session::signed_out(),
            (token, user) => {
                warn!(
                    has_token = matches!(token, Ok(Some(_))),
                    has_user = matches!(user, Ok(Some(_))),
                    "Discarding incomplete stored session"
                );
                if let Err(e) = self.tokens.clear() {
                    warn!(error = %e, "Failed to clear session store");
                }
                Session::signed_out()
            }
        };
        self.session.user()
    }

    /// The signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` when signed out.
    pub fn require_user(&self) -> Result<&User> {
        self.session.user().ok_or(ClientError::NotAuthenticated)
    }

    /// The signed-in user, who must hold `role`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` when signed out, or
    /// `ClientError::WrongRole` when the user has a different role.
    pub fn require_role(&self, role: Role) -> Result<&User> {
        let user = self.require_user()?;
        if user.role == role {
            Ok(user)
        } else {
            Err(ClientError::WrongRole { required: role })
        }
    }

    /// Sign in with a username or email.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for blank input,
    /// `ClientError::Authentication` with the server message when the
    /// credentials are rejected, or `ClientError::Storage` if the session
    /// cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, identifier: &str, password: SecretString) -> Result<User> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ClientError::Validation("Username or email is required".to_string()));
        }
        if password.expose_secret().is_empty() {
            return Err(ClientError::Validation("Password is required".to_string()));
        }

        let response = self
            .api
            .login(&LoginRequest {
                username_or_email: identifier.to_string(),
                password,
            })
            .await?;
        self.establish(response)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if the form breaks a registration
    /// rule (no request is sent), `ClientError::Authentication` with the
    /// server message if the backend refuses it, or `ClientError::Storage`.
    #[instrument(skip(self, form), fields(role = %form.role))]
    pub async fn register(&mut self, form: RegistrationForm) -> Result<User> {
        let request = form.validate()?;
        let response = self.api.register(&request).await?;
        self.establish(response)
    }

    /// Replace the session with a fresh token and user, store first.
    fn establish(&mut self, response: AuthResponse) -> Result<User> {
        self.tokens.save(&response.access_token, &response.user)?;
        // Failures queued against the previous token no longer apply.
        self.discard_auth_failures();

        let user = response.user;
        info!(user_id = %user.id, role = %user.role, "Signed in");
        self.session = Session {
            credentials: Some(Credentials {
                user: user.clone(),
                token: response.access_token,
            }),
            is_loading: false,
        };
        Ok(user)
    }

    /// Re-fetch the signed-in user's profile and persist it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` when signed out, or any
    /// gateway or storage error.
    pub async fn refresh_profile(&mut self) -> Result<User> {
        let (id, token) = {
            let credentials = self
                .session
                .credentials
                .as_ref()
                .ok_or(ClientError::NotAuthenticated)?;
            (credentials.user.id, credentials.token.clone())
        };
        let user = self.api.get_user(id).await?;
        self.tokens.save(&token, &user)?;
        self.session.credentials = Some(Credentials {
            user: user.clone(),
            token,
        });
        Ok(user)
    }

    /// Clear the store and the session. Never fails; a store error is logged.
    pub fn logout(&mut self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear session store");
        }
        if let Some(user) = self.session.user() {
            info!(user_id = %user.id, "Signed out");
        }
        self.session = Session::signed_out();
    }

    /// Apply any authorization failures the gateway has published since the
    /// last call. Returns `true` if the session was forcibly ended.
    pub fn handle_auth_failures(&mut self) -> bool {
        let mut last = None;
        loop {
            match self.auth_failures.try_recv() {
                Ok(failure) => last = Some(failure),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        match last {
            Some(failure) if self.session.is_authenticated() => {
                warn!(
                    status = failure.status,
                    path = %failure.path,
                    "Backend rejected the session, signing out"
                );
                self.logout();
                true
            }
            _ => false,
        }
    }

    fn discard_auth_failures(&mut self) {
        self.auth_failures = self.auth_failures.resubscribe();
    }
}
