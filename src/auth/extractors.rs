use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::Principal;

/// Extracts the principal that [`AuthGate`](super::AuthGate) attached to the request.
///
/// Only meaningful on routes wrapped by the gate. Anywhere else it fails with the
/// generic `Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Principal>().cloned() {
            Some(principal) => ready(Ok(AuthenticatedUser(principal))),
            None => ready(Err(AppError::not_authenticated().into())),
        }
    }
}
