use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap},
    Error, HttpMessage,
};
use chrono::{DateTime, Utc};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;

use super::session::{SessionLookup, SessionStore, SessionToken};
use crate::error::AppError;
use crate::models::Principal;

/// Longest token accepted from a header. Real tokens are 64 hex characters.
const MAX_TOKEN_LEN: usize = 256;

/// Reads the token out of an `Authorization: Bearer <token>` header.
///
/// A missing header, a non-ASCII value, another scheme or an empty token all yield
/// `None`; callers treat that the same as an unknown token.
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.len() <= MAX_TOKEN_LEN)
        .map(SessionToken::from_presented)
}

/// Resolves the request's session to a principal.
///
/// No token and an unknown token both give the generic `Unauthorized`; only a session
/// that existed and aged out gives `SessionExpired`, and that lookup also evicts it.
pub fn evaluate_session(
    sessions: &SessionStore,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<Principal, AppError> {
    let token = bearer_token(headers).ok_or_else(AppError::not_authenticated)?;
    match sessions.touch_and_validate(&token, now) {
        SessionLookup::Valid(record) => Ok(record.principal()),
        SessionLookup::Expired => Err(AppError::SessionExpired),
        SessionLookup::Missing => Err(AppError::not_authenticated()),
    }
}

/// Rejects requests without a live session and attaches the [`Principal`] to the
/// request extensions for the ones it admits.
#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<SessionStore>,
}

impl AuthGate {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service,
            sessions: self.sessions.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: S,
    sessions: Arc<SessionStore>,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match evaluate_session(&self.sessions, req.headers(), Utc::now()) {
            Ok(principal) => {
                req.extensions_mut().insert(principal);
                Box::pin(self.service.call(req))
            }
            Err(app_err) => {
                log::debug!("Rejected {} {}: {}", req.method(), req.path(), app_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
