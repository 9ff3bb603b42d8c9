use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use taskdeck::auth::{
    AuthState, Bcrypt, CheckResponse, CredentialVerifier, LoginResponse, SessionStore,
};
use taskdeck::models::{AccountId, Credential, NewCredential, Principal};
use taskdeck::routes::{self, health};
use taskdeck::storage::{CredentialStore, MemoryCredentialStore};
use taskdeck::AppError;

fn auth_state(store: Arc<dyn CredentialStore>) -> web::Data<AuthState> {
    let sessions = Arc::new(SessionStore::new(chrono::Duration::hours(24)));
    let verifier = CredentialVerifier::new(store, Arc::new(Bcrypt::new(4)))
        .expect("dummy hash should compute");
    web::Data::new(AuthState::new(verifier, sessions))
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .app_data(routes::json_config())
                .wrap(Logger::default())
                .service(health::health)
                .service(web::scope("/api").configure(routes::config(&$state))),
        )
        .await
    };
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[test_log::test(actix_rt::test)]
async fn test_register_login_check_logout_flow() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "alice", "password": "Secr3t!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "identifier": "alice", "password": "Secr3t!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.principal.identifier, "alice");
    assert_eq!(login.token.len(), 64);

    let req = test::TestRequest::get()
        .uri("/api/auth/check")
        .insert_header(bearer(&login.token))
        .to_request();
    let check: CheckResponse = test::call_and_read_body_json(&app, req).await;
    assert!(check.authenticated);
    assert_eq!(check.principal.as_ref().unwrap().identifier, "alice");
    assert_eq!(
        check.principal.unwrap().account_id,
        login.principal.account_id
    );

    let req = test::TestRequest::post()
        .uri("/api/auth/logout")
        .insert_header(bearer(&login.token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/auth/check")
        .insert_header(bearer(&login.token))
        .to_request();
    let check: CheckResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        check,
        CheckResponse {
            authenticated: false,
            principal: None
        }
    );
    assert!(state.sessions.is_empty());
}

#[actix_rt::test]
async fn test_duplicate_registration_conflicts() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let cases = vec![
        (json!({ "username": "bob", "password": "pw1" }), StatusCode::CREATED),
        (json!({ "username": "bob", "password": "pw2" }), StatusCode::CONFLICT),
        (
            json!({ "username": "carol", "password": "pw", "email": "carol@example.com" }),
            StatusCode::CREATED,
        ),
        (
            json!({ "username": "caroline", "password": "pw", "email": "carol@example.com" }),
            StatusCode::CONFLICT,
        ),
    ];

    for (payload, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "payload: {}", payload);
    }
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let test_cases = vec![
        (json!({ "password": "Password123!" }), "missing username"),
        (json!({ "username": "testuser" }), "missing password"),
        (json!({ "username": "", "password": "pw" }), "empty username"),
        (json!({ "username": "user name!", "password": "pw" }), "username with invalid chars"),
        (
            json!({ "username": "testuser", "password": "pw", "email": "invalid-email" }),
            "invalid email format",
        ),
    ];

    for (payload, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body = test::read_body(resp).await;
        assert_eq!(
            status,
            StatusCode::BAD_REQUEST,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body)
        );
    }

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_login_failures_are_uniform() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "real", "password": "rightsecret", "email": "real@x.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let mut bodies = Vec::new();
    for payload in [
        json!({ "identifier": "nonexistent@x.com", "password": "anything" }),
        json!({ "identifier": "real@x.com", "password": "wrongsecret" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        bodies.push(test::read_body(resp).await);
    }
    assert_eq!(bodies[0], bodies[1]);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "identifier": "real" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // The email works as an identifier too.
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "real@x.com", "password": "rightsecret" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_login_by_mixed_case_email_issues_valid_session() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "username": "hana", "password": "Secr3t!", "email": "Hana@Example.com" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "identifier": " Hana@Example.com ", "password": "Secr3t!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.principal.identifier, "hana");

    let req = test::TestRequest::get()
        .uri("/api/auth/check")
        .insert_header(bearer(&login.token))
        .to_request();
    let check: CheckResponse = test::call_and_read_body_json(&app, req).await;
    assert!(check.authenticated);
}

#[actix_rt::test]
async fn test_logout_is_idempotent() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let requests = vec![
        test::TestRequest::post().uri("/api/auth/logout").to_request(),
        test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header(bearer("never-issued"))
            .to_request(),
        test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header(bearer("never-issued"))
            .to_request(),
        test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header(("Authorization", "Basic Zm9vOmJhcg=="))
            .to_request(),
    ];

    let mut bodies = Vec::new();
    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        bodies.push(test::read_body(resp).await);
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[actix_rt::test]
async fn test_check_never_errors() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let requests = vec![
        test::TestRequest::get().uri("/api/auth/check").to_request(),
        test::TestRequest::get()
            .uri("/api/auth/check")
            .insert_header(bearer("deadbeef"))
            .to_request(),
        test::TestRequest::get()
            .uri("/api/auth/check")
            .insert_header(("Authorization", "Bearer"))
            .to_request(),
        test::TestRequest::get()
            .uri("/api/auth/check")
            .insert_header(("Authorization", "token abc"))
            .to_request(),
    ];

    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: CheckResponse = test::read_body_json(resp).await;
        assert!(!body.authenticated);
        assert!(body.principal.is_none());
    }
}

#[actix_rt::test]
async fn test_profile_requires_session() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/auth/profile").to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let principal = Principal {
        account_id: 9,
        identifier: "dana".to_string(),
        email: None,
    };
    let (token, _) = state.issuer.issue(principal.clone());

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(token.as_str()))
        .to_request();
    let body: Principal = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, principal);
}

#[actix_rt::test]
async fn test_expired_session_is_rejected_and_evicted() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    let principal = Principal {
        account_id: 4,
        identifier: "erin".to_string(),
        email: None,
    };
    let issued_at = chrono::Utc::now() - chrono::Duration::hours(25);
    let (token, _) = state.issuer.issue_at(principal, issued_at);

    let req = test::TestRequest::get()
        .uri("/api/auth/profile")
        .insert_header(bearer(token.as_str()))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    let response = err.error_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "session_expired");

    assert!(state.sessions.get(&token).is_none());

    let req = test::TestRequest::get()
        .uri("/api/auth/check")
        .insert_header(bearer(token.as_str()))
        .to_request();
    let check: CheckResponse = test::call_and_read_body_json(&app, req).await;
    assert!(!check.authenticated);
}

/// A credential store whose backend is unreachable.
struct UnavailableStore;

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn find_by_identifier(&self, _identifier: &str) -> Result<Option<Credential>, AppError> {
        Err(AppError::StorageError("connection refused (db.internal:5432)".into()))
    }

    async fn identifier_taken(
        &self,
        _username: &str,
        _email: Option<&str>,
    ) -> Result<bool, AppError> {
        Err(AppError::StorageError("connection refused (db.internal:5432)".into()))
    }

    async fn insert(&self, _credential: NewCredential) -> Result<AccountId, AppError> {
        Err(AppError::StorageError("connection refused (db.internal:5432)".into()))
    }
}

#[actix_rt::test]
async fn test_storage_failures_surface_as_500_without_detail() {
    let state = auth_state(Arc::new(UnavailableStore));
    let app = init_app!(state);

    for (uri, payload) in [
        ("/api/auth/register", json!({ "username": "frank", "password": "pw" })),
        ("/api/auth/login", json!({ "identifier": "frank", "password": "pw" })),
    ] {
        let req = test::TestRequest::post()
            .uri(uri)
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = test::read_body(resp).await;
        assert!(!String::from_utf8_lossy(&body).contains("db.internal"));
    }
}

#[actix_rt::test]
async fn test_health_reports_session_count() {
    let state = auth_state(Arc::new(MemoryCredentialStore::new()));
    let app = init_app!(state);

    state.issuer.issue(Principal {
        account_id: 1,
        identifier: "gina".to_string(),
        email: None,
    });

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["active_sessions"], 1);
}
