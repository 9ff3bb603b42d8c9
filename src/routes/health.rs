use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::auth::AuthState;

/// Health check endpoint
///
/// Returns the current status of the API, a timestamp and the number of sessions held
/// in memory (including expired ones not yet evicted).
#[get("/health")]
pub async fn health(state: web::Data<AuthState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "active_sessions": state.sessions.len()
    }))
}
