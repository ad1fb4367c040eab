//! Event domain models

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use domain_locations::LocationResponse;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::directory::Person;
use crate::validation::{validate_event_link, validate_event_name};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Event categories
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventType {
    Conference,
    Workshop,
    Meetup,
    Concert,
    Webinar,
    Networking,
    Hackathon,
    Exhibition,
    Festival,
    Seminar,
}

/// One line of an event's chat log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// Free-form sender label, e.g. `user` or a display name
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Any other fields the client attached, kept and relayed as sent
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Stored event document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Stored as a BSON date so range queries compare instants
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    /// EUR
    pub price: f64,
    pub event_type: EventType,
    #[serde(default)]
    pub event_link: Option<String>,
    pub location: Uuid,
    pub organizer: Uuid,
    #[serde(default)]
    pub attendees: Vec<Uuid>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub summary_embedding: Vec<f32>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(draft: NewEvent) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: draft.name,
            description: draft.description,
            date: draft.date,
            price: draft.price,
            event_type: draft.event_type,
            event_link: draft.event_link,
            location: draft.location,
            organizer: draft.organizer,
            attendees: draft.attendees,
            images: draft.images,
            summary: String::new(),
            summary_embedding: Vec::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_summary(&mut self, summary: String, embedding: Vec<f32>) {
        self.summary = summary;
        self.summary_embedding = embedding;
    }
}

/// A create request that passed validation and reference checks
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub price: f64,
    pub event_type: EventType,
    pub event_link: Option<String>,
    pub location: Uuid,
    pub organizer: Uuid,
    pub attendees: Vec<Uuid>,
    pub images: Vec<String>,
}

/// Event as returned by the API; the embedding stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub price: f64,
    pub event_type: EventType,
    pub event_link: Option<String>,
    pub location: Uuid,
    pub organizer: Uuid,
    pub attendees: Vec<Uuid>,
    pub images: Vec<String>,
    pub summary: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            date: event.date,
            price: event.price,
            event_type: event.event_type,
            event_link: event.event_link,
            location: event.location,
            organizer: event.organizer,
            attendees: event.attendees,
            images: event.images,
            summary: event.summary,
            messages: event.messages,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Event with its references resolved, as returned by reads.
///
/// A reference whose record no longer exists comes back as `null`, and a
/// missing attendee is left out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDetails {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub price: f64,
    pub event_type: EventType,
    pub event_link: Option<String>,
    pub location: Option<LocationResponse>,
    pub organizer: Option<Person>,
    pub attendees: Vec<Person>,
    pub images: Vec<String>,
    pub summary: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventDetails {
    pub fn populate(
        event: Event,
        location: Option<LocationResponse>,
        organizer: Option<Person>,
        attendees: Vec<Person>,
    ) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            date: event.date,
            price: event.price,
            event_type: event.event_type,
            event_link: event.event_link,
            location,
            organizer,
            attendees,
            images: event.images,
            summary: event.summary,
            messages: event.messages,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Create request. Fields stay loosely typed so each problem gets its own message.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(custom(function = "validate_event_name"))]
    pub name: Option<String>,
    pub description: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub date: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub event_type: Option<String>,
    #[validate(custom(function = "validate_event_link"))]
    pub event_link: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Image URLs; uploaded files are appended to these
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEvent {
    #[validate(custom(function = "validate_event_name"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
    pub event_type: Option<String>,
    #[validate(custom(function = "validate_event_link"))]
    pub event_link: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub attendees: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

/// Query filters for listing events
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct EventFilter {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    pub event_type: Option<EventType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// `YYYY-MM-DD`; matches the whole UTC day
    pub date: Option<NaiveDate>,
    pub organizer: Option<Uuid>,
    pub location: Option<Uuid>,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            event_type: None,
            min_price: None,
            max_price: None,
            date: None,
            organizer: None,
            location: None,
        }
    }
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl EventFilter {
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_LIMIT);
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn skip(&self) -> u64 {
        database::page_skip(self.page, self.limit)
    }

    /// `[start, end)` of the requested day
    pub fn day_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let day = self.date?;
        let start = day.and_time(NaiveTime::MIN).and_utc();
        Some((start, start + chrono::Duration::days(1)))
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref search) = self.search {
            if !event.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if self.event_type.is_some_and(|t| t != event.event_type) {
            return false;
        }
        if self.min_price.is_some_and(|min| event.price < min)
            || self.max_price.is_some_and(|max| event.price > max)
        {
            return false;
        }
        if self.organizer.is_some_and(|o| o != event.organizer)
            || self.location.is_some_and(|l| l != event.location)
        {
            return false;
        }
        match self.day_bounds() {
            Some((start, end)) => event.date >= start && event.date < end,
            None => true,
        }
    }
}

/// Paginated list of events
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventList {
    pub events: Vec<EventDetails>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Vector search hit
#[derive(Debug, Clone)]
pub struct ScoredEvent {
    pub event: Event,
    /// Cosine similarity, higher is closer
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn sample(name: &str, price: f64, date: DateTime<Utc>) -> Event {
        Event::new(NewEvent {
            name: name.into(),
            description: "desc".into(),
            date,
            price,
            event_type: EventType::Meetup,
            event_link: None,
            location: Uuid::now_v7(),
            organizer: Uuid::now_v7(),
            attendees: vec![],
            images: vec![],
        })
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(EventType::from_str("Hackathon").unwrap(), EventType::Hackathon);
        assert_eq!(EventType::Concert.to_string(), "concert");
        assert!(EventType::from_str("party").is_err());
    }

    #[test]
    fn test_response_has_no_embedding() {
        let mut event = sample("Rust Meetup", 0.0, Utc::now());
        event.set_summary("summary".into(), vec![0.1, 0.2]);
        let json = serde_json::to_value(EventResponse::from(event)).unwrap();
        assert!(json.get("summary_embedding").is_none());
        assert_eq!(json["summary"], "summary");
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_filter_whole_day() {
        let filter = EventFilter {
            date: NaiveDate::from_ymd_opt(2025, 6, 1),
            ..Default::default()
        };
        let late = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        assert!(filter.matches(&sample("a", 1.0, late)));
        assert!(!filter.matches(&sample("b", 1.0, next)));
    }

    #[test]
    fn test_filter_price_and_search() {
        let filter = EventFilter {
            search: Some("rust".into()),
            min_price: Some(5.0),
            max_price: Some(20.0),
            ..Default::default()
        }
        .normalized();
        assert!(filter.matches(&sample("Helsinki Rust Meetup", 10.0, Utc::now())));
        assert!(!filter.matches(&sample("Helsinki Rust Meetup", 25.0, Utc::now())));
        assert!(!filter.matches(&sample("Go Meetup", 10.0, Utc::now())));
    }

    #[test]
    fn test_normalized_caps_limit() {
        let filter = EventFilter {
            page: 0,
            limit: 1000,
            ..Default::default()
        }
        .normalized();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, MAX_LIMIT);
        assert_eq!(filter.skip(), 0);
    }

    #[test]
    fn test_skip_saturates_on_huge_pages() {
        let filter = EventFilter {
            page: u64::MAX,
            limit: MAX_LIMIT,
            ..Default::default()
        }
        .normalized();
        assert_eq!(filter.skip(), i64::MAX as u64);

        let second = EventFilter {
            page: 2,
            limit: 25,
            ..Default::default()
        };
        assert_eq!(second.skip(), 25);
    }

    #[test]
    fn test_stored_dates_are_bson_datetimes() {
        let date = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(500);
        let doc = mongodb::bson::to_document(&sample("Half past midnight", 0.0, date)).unwrap();

        let stored = doc.get_datetime("date").unwrap();
        assert_eq!(stored.timestamp_millis(), date.timestamp_millis());
        assert!(doc.get_datetime("created_at").is_ok());
        assert!(doc.get_datetime("updated_at").is_ok());
    }

    #[test]
    fn test_details_embed_references() {
        let event = sample("Rust Meetup", 0.0, Utc::now());
        let organizer = Person::stub(event.organizer, "Olivia");
        let details = EventDetails::populate(event, None, Some(organizer), vec![]);

        let json = serde_json::to_value(details).unwrap();
        assert_eq!(json["organizer"]["name"], "Olivia");
        assert_eq!(json["organizer"]["role"], "organizer");
        assert!(json["location"].is_null());
        assert!(json.get("summary_embedding").is_none());
    }
}
