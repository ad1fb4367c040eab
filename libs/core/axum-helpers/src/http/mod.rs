//! Cross-cutting HTTP layers.

mod cors;
mod security;

pub use cors::{create_cors_layer, parse_origins};
pub use security::security_headers;
