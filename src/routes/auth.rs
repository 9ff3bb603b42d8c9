use crate::{
    auth::{
        bearer_token, evaluate_session, AuthState, AuthenticatedUser, CheckResponse,
        LoginRequest, LoginResponse, RegisterRequest,
    },
    error::AppError,
};
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// ## Responses:
/// - `201 Created`: account stored. No token is issued; the client logs in next.
/// - `400 Bad Request`: username or password missing, or a field is malformed.
/// - `409 Conflict`: username or email already registered.
/// - `500 Internal Server Error`: the credential store failed.
#[post("/register")]
pub async fn register(
    state: web::Data<AuthState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let account_id = state.verifier.register(register_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "account_id": account_id
    })))
}

/// Login user
///
/// Verifies the credentials and opens a session.
///
/// ## Responses:
/// - `200 OK`: `{token, principal}`.
/// - `400 Bad Request`: identifier or password missing.
/// - `401 Unauthorized`: "Invalid credentials", for an unknown identifier and a wrong
///   password alike.
#[post("/login")]
pub async fn login(
    state: web::Data<AuthState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let principal = state
        .verifier
        .authenticate(&login_data.identifier, &login_data.password)
        .await?;
    let (token, record) = state.issuer.issue(principal);

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: token.to_string(),
        principal: record.principal(),
    }))
}

/// Logout user
///
/// Drops the session named by the bearer token, if any. Always answers 200 so the
/// response says nothing about whether the token was live.
#[post("/logout")]
pub async fn logout(state: web::Data<AuthState>, req: HttpRequest) -> impl Responder {
    if let Some(token) = bearer_token(req.headers()) {
        if state.sessions.delete(&token) {
            log::info!("Session closed");
        }
    }

    HttpResponse::Ok().json(json!({ "message": "Logged out" }))
}

/// Session check
///
/// Always 200. Missing, malformed, unknown and expired tokens all report
/// `{"authenticated": false}`; an expired session is evicted on the way.
#[get("/check")]
pub async fn check(state: web::Data<AuthState>, req: HttpRequest) -> impl Responder {
    let response = match evaluate_session(&state.sessions, req.headers(), Utc::now()) {
        Ok(principal) => CheckResponse {
            authenticated: true,
            principal: Some(principal),
        },
        Err(_) => CheckResponse {
            authenticated: false,
            principal: None,
        },
    };

    HttpResponse::Ok().json(response)
}

/// Current user's profile. Mounted behind the auth gate.
pub async fn profile(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(user.0)
}
