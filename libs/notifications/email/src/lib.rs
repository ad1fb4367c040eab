//! Transactional email for the event platform.
//!
//! ## Components
//!
//! - **Models**: [`Email`] message
//! - **Providers**: SendGrid HTTP API, a log-only provider for local development and a capturing mock
//! - **Templates**: Handlebars-based [`TemplateEngine`]
//! - **Mailer**: renders a template and hands the message to the configured provider
//!
//! ```ignore
//! use email::{Mailer, MailerConfig};
//!
//! let mailer = Mailer::from_env(&environment)?;
//! mailer
//!     .send_password_reset("ada@example.com", "Ada", "https://app/reset-password/abc")
//!     .await?;
//! ```

pub mod error;
pub mod models;
pub mod provider;
pub mod service;
pub mod templates;

pub use error::{NotificationError, NotificationResult};
pub use models::Email;
pub use provider::{EmailProvider, LogProvider, MockEmailProvider, SendGridProvider, SendResult};
pub use service::{Mailer, MailerConfig};
pub use templates::{EmailTemplate, RenderedTemplate, TemplateEngine};
