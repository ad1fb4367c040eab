//! Plain-text event summaries; the embedded form backs semantic search.

use crate::directory::{Person, Venue};
use crate::models::Event;

pub fn summarize(event: &Event, venue: &Venue, organizer: &Person) -> String {
    let mut summary = format!(
        "{} is a {} taking place at {} on {}. {} This event is organized by {}. The event costs {} EUR",
        event.name.trim(),
        event.event_type,
        venue.address,
        event.date.format("%A, %B %-d, %Y at %H:%M UTC"),
        event.description.trim(),
        organizer.name,
        event.price,
    );

    match event.event_link.as_deref().map(str::trim) {
        Some(link) if !link.is_empty() => {
            summary.push_str(" and more details can be found at ");
            summary.push_str(link);
            summary.push('.');
        }
        _ => summary.push('.'),
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventType, NewEvent};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn event(link: Option<&str>) -> Event {
        Event::new(NewEvent {
            name: "Rust Helsinki".into(),
            description: "Talks about async Rust.".into(),
            date: Utc.with_ymd_and_hms(2025, 6, 5, 17, 0, 0).unwrap(),
            price: 12.5,
            event_type: EventType::Meetup,
            event_link: link.map(String::from),
            location: Uuid::now_v7(),
            organizer: Uuid::now_v7(),
            attendees: vec![],
            images: vec![],
        })
    }

    fn venue() -> Venue {
        Venue {
            address: "5, Mannerheimintie, Helsinki, Finland".into(),
            ..Venue::stub(Uuid::now_v7(), "Helsinki")
        }
    }

    fn organizer() -> Person {
        Person::stub(Uuid::now_v7(), "Olivia")
    }

    #[test]
    fn test_summary_template() {
        let summary = summarize(&event(Some("https://rust.fi")), &venue(), &organizer());
        assert_eq!(
            summary,
            "Rust Helsinki is a meetup taking place at 5, Mannerheimintie, Helsinki, Finland \
             on Thursday, June 5, 2025 at 17:00 UTC. Talks about async Rust. This event is \
             organized by Olivia. The event costs 12.5 EUR and more details can be found at \
             https://rust.fi."
        );
    }

    #[test]
    fn test_summary_without_link() {
        let summary = summarize(&event(None), &venue(), &organizer());
        assert!(summary.ends_with("The event costs 12.5 EUR."));
    }
}
