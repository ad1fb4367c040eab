use axum_helpers::{JwtConfig, RouterOptions};
use core_config::{AppInfo, FromEnv, app_info, env_optional, env_or_default, server::ServerConfig};
use database::MongoConfig;
use std::path::PathBuf;

pub use core_config::Environment;

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub router: RouterOptions,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    /// Web client base URL, used in password reset links
    pub client_url: String,
    /// Google sign-in is disabled without it
    pub google_client_id: Option<String>,
    /// Where uploaded event images are written
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            router: RouterOptions::from_env()?,
            mongodb: MongoConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            client_url: env_or_default("CLIENT_URL", "http://localhost:3000"),
            google_client_id: env_optional("GOOGLE_CLIENT_ID"),
            upload_dir: PathBuf::from(env_or_default("UPLOAD_DIR", "./uploads")),
        })
    }
}
