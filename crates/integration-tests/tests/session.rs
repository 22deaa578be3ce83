//! Session lifecycle against the fake backend.
//!
//! Run with: cargo test -p forkline-integration-tests --test session

#![allow(clippy::unwrap_used)]

use forkline_client::models::RegistrationForm;
use forkline_client::{
    ApiClient, ClientError, FileStore, FoodApi, SessionController, TokenStore,
};
use forkline_core::Role;
use forkline_integration_tests::{FakeBackend, StatusCode};
use forkline_integration_tests::fixtures::{customer, food};
use secrecy::{ExposeSecret, SecretString};

fn controller(backend: &FakeBackend, tokens: &TokenStore) -> SessionController<ApiClient> {
    let api = ApiClient::new(&backend.config(), tokens.clone()).unwrap();
    SessionController::new(api, tokens.clone())
}

#[tokio::test]
async fn test_login_survives_restart() {
    let backend = FakeBackend::start().await;
    backend.add_account(customer(7, "jordan"), "hunter22");
    backend.add_food(food(1, 3, "Pho", 1250));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let tokens = TokenStore::new(FileStore::open(&path).unwrap());
    let mut session = controller(&backend, &tokens);
    assert!(session.restore().is_none());
    let user = session
        .login(" jordan@example.com ", SecretString::from("hunter22"))
        .await
        .unwrap();
    assert_eq!(user.username, "jordan");
    assert_eq!(
        backend.last_body("auth/login").unwrap()["usernameOrEmail"],
        "jordan@example.com"
    );

    // A new process reads the same file.
    let tokens = TokenStore::new(FileStore::open(&path).unwrap());
    let mut restored = controller(&backend, &tokens);
    assert!(restored.session().is_loading());
    assert_eq!(restored.restore().map(|u| u.id), Some(user.id));

    let foods = restored.api().list_foods().await.unwrap();
    assert_eq!(foods.len(), 1);
    let sent = backend.requests().pop().unwrap();
    assert_eq!(sent.path, "foods");
    assert_eq!(
        sent.authorization.as_deref(),
        Some(format!("Bearer {}", tokens.token().unwrap().unwrap().expose_secret()).as_str())
    );
}

#[tokio::test]
async fn test_rejected_credentials_keep_server_message() {
    let backend = FakeBackend::start().await;
    backend.add_account(customer(7, "jordan"), "hunter22");
    let tokens = TokenStore::in_memory();
    let mut session = controller(&backend, &tokens);
    session.restore();

    let err = session
        .login("jordan", SecretString::from("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Authentication(_)));
    assert_eq!(err.user_message(), "Invalid username or password");
    assert!(!session.session().is_authenticated());
    assert!(tokens.token().unwrap().is_none());
}

#[tokio::test]
async fn test_revoked_token_forces_logout() {
    let backend = FakeBackend::start().await;
    backend.add_account(customer(7, "jordan"), "hunter22");
    let tokens = TokenStore::in_memory();
    let mut session = controller(&backend, &tokens);
    session.restore();
    session
        .login("jordan", SecretString::from("hunter22"))
        .await
        .unwrap();

    backend.revoke_tokens();
    let err = session.api().list_orders().await.unwrap_err();
    assert!(err.is_authorization());

    assert!(session.handle_auth_failures());
    assert!(!session.session().is_authenticated());
    assert!(tokens.token().unwrap().is_none());
    assert!(tokens.user().unwrap().is_none());

    // Nothing further to apply.
    assert!(!session.handle_auth_failures());
}

#[tokio::test]
async fn test_restaurant_registration() {
    let backend = FakeBackend::start().await;
    let tokens = TokenStore::in_memory();
    let mut session = controller(&backend, &tokens);
    session.restore();

    let form = RegistrationForm {
        username: "noodlebar".to_string(),
        email: "chef@noodlebar.example".to_string(),
        password: SecretString::from("broth4ever"),
        first_name: "Mai".to_string(),
        last_name: "Tran".to_string(),
        phone_number: "5550199".to_string(),
        role: Role::Restaurant,
        restaurant_name: None,
        address: "3 Market Sq".to_string(),
    };

    let err = session.register(form.clone()).await.unwrap_err();
    assert_eq!(err.user_message(), "Restaurant name is required for restaurant role");
    assert_eq!(backend.hits("auth/register"), 0);

    let user = session
        .register(RegistrationForm {
            restaurant_name: Some("Noodle Bar".to_string()),
            ..form
        })
        .await
        .unwrap();
    assert_eq!(user.role, Role::Restaurant);
    assert!(session.session().is_authenticated());

    let body = backend.last_body("auth/register").unwrap();
    assert_eq!(body["role"], "RESTAURANT");
    assert_eq!(body["restaurantName"], "Noodle Bar");
    assert_eq!(body["password"], "broth4ever");
}

#[tokio::test]
async fn test_anonymous_requests_are_refused() {
    let backend = FakeBackend::start().await;
    let response = reqwest::get(format!("{}foods", backend.base_url()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
