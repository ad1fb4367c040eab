//! Events Domain
//!
//! Events reference an organizing user and a location, carry a generated
//! plain-text summary with its embedding, and keep an append-only chat log.
//!
//! # Architecture
//!
//! ```text
//! HTTP (handlers)          WebSocket (chat)
//!        │                        │
//!        └───────► EventService ◄─┘
//!                   │  │   │  │
//!      PeopleDirectory │   │  ImageStore
//!          VenueDirectory  Embedder
//!                   │
//!             EventRepository (in-memory | MongoDB + Atlas vector search)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_events::{EventService, InMemoryEventRepository, LocalImageStore, OpenAiEmbedder};
//!
//! let service = EventService::new(
//!     InMemoryEventRepository::new(),
//!     Arc::new(user_service),
//!     Arc::new(location_service),
//!     Arc::new(OpenAiEmbedder::from_env()?),
//!     Arc::new(LocalImageStore::new("./uploads")),
//! );
//! let api = handlers::router(service.clone(), jwt_auth);
//! let ws = chat::router(service, ChatRooms::default());
//! ```

pub mod chat;
pub mod directory;
pub mod embedding;
pub mod error;
pub mod form;
pub mod handlers;
pub mod images;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod summary;
pub mod validation;

pub use chat::ChatRooms;
pub use directory::{PeopleDirectory, Person, Venue, VenueDirectory};
pub use embedding::{Embedder, OpenAiConfig, OpenAiEmbedder, cosine_similarity};
pub use error::{EventError, EventResult};
pub use images::{ImageStore, ImageUpload, LocalImageStore, UPLOADS_PATH};
pub use models::{
    ChatMessage, CreateEvent, Event, EventDetails, EventFilter, EventList, EventResponse, EventType,
    ScoredEvent, UpdateEvent,
};
pub use mongodb::MongoEventRepository;
pub use repository::{EventRepository, InMemoryEventRepository};
pub use service::EventService;
