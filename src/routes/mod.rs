pub mod auth;
pub mod health;

use actix_web::web;

use crate::auth::{AuthGate, AuthState};

/// Mounts the auth endpoints. Expects to be configured inside the `/api` scope, with
/// `web::Data<AuthState>` registered on the app.
pub fn config(state: &web::Data<AuthState>) -> impl FnOnce(&mut web::ServiceConfig) {
    let gate = AuthGate::new(state.sessions.clone());
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login)
                .service(auth::logout)
                .service(auth::check)
                .service(
                    web::resource("/profile")
                        .route(web::get().to(auth::profile))
                        .wrap(gate),
                ),
        );
    }
}

/// JSON extractor settings: unparseable bodies become a 400 in the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            crate::error::AppError::ValidationError(format!("Invalid JSON body: {}", err)).into()
        })
}
