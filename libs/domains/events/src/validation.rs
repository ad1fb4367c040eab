//! Field rules and parsing for event input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::borrow::Cow;
use std::str::FromStr;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::error::{EventError, EventResult};
use crate::models::EventType;

const NAME_MAX: usize = 200;

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn validate_event_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("name_required", "Event name is required"));
    }
    if name.chars().count() > NAME_MAX {
        return Err(invalid(
            "name",
            "Event name cannot exceed 200 characters",
        ));
    }
    Ok(())
}

pub fn validate_event_link(link: &str) -> Result<(), ValidationError> {
    let link = link.trim();
    if link.is_empty() {
        return Ok(());
    }
    match reqwest::Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(invalid("event_link", "Event link must be a valid URL")),
    }
}

/// A reference id; `message` names the field, e.g. `Invalid organizer ID`.
pub fn parse_reference(raw: Option<&str>, message: &str) -> EventResult<Uuid> {
    raw.map(str::trim)
        .and_then(|r| Uuid::parse_str(r).ok())
        .ok_or_else(|| EventError::Validation(message.to_string()))
}

/// RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_event_date(raw: &str) -> EventResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|day| day.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| EventError::Validation("Invalid date format".to_string()))
}

pub fn parse_event_type(raw: &str) -> EventResult<EventType> {
    EventType::from_str(raw.trim())
        .map_err(|_| EventError::Validation(format!("{} is not a valid event type", raw.trim())))
}

/// Blank strings count as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Human-readable message of the first failing field, ordered by field name.
pub fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    let mut names: Vec<_> = fields.keys().collect();
    names.sort();

    names
        .first()
        .and_then(|name| {
            fields.get(*name).and_then(|errs| errs.first()).map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", name))
            })
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}
