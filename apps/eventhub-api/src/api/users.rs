//! Users and auth routes

use axum::Router;
use axum_helpers::JwtAuth;
use domain_users::{
    AuthConfig, AuthService, GoogleIdentityVerifier, MongoUserRepository, UserService,
    auth_handlers,
};
use email::Mailer;
use std::sync::Arc;
use tracing::{info, warn};

use crate::state::AppState;

pub type Users = UserService<MongoUserRepository>;

pub fn service(state: &AppState) -> Users {
    UserService::new(MongoUserRepository::new(state.db.clone()))
}

/// Login, refresh, password reset and (when configured) Google sign-in
pub fn auth_router(state: &AppState, jwt: JwtAuth) -> eyre::Result<Router> {
    let config = &state.config;
    let mailer = Mailer::from_env(&config.environment)?;
    info!(provider = mailer.provider_name(), "Mailer ready");

    let mut auth = AuthService::new(
        Arc::new(MongoUserRepository::new(state.db.clone())),
        jwt,
        mailer,
        AuthConfig::new(config.client_url.clone()),
    );

    match config.google_client_id {
        Some(ref client_id) => {
            auth = auth.with_identity_verifier(Arc::new(GoogleIdentityVerifier::new(
                client_id.clone(),
            )?));
        }
        None => warn!("GOOGLE_CLIENT_ID not set, Google sign-in disabled"),
    }

    Ok(auth_handlers::router(auth))
}
