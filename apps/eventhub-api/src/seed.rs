//! Demo data for local development
//!
//! Records go through the domain services, so locations are geocoded and
//! events get their summary and embedding like any API-created record.
//! Anything already present is left alone and reruns only fill the gaps.

use domain_events::{CreateEvent, EventError, EventRepository, EventService};
use domain_locations::{CreateLocation, LocationFilter, LocationRepository, LocationService};
use domain_users::{CreateUser, Role, UserError, UserRepository, UserService};
use eyre::{Result, WrapErr, eyre};
use tracing::info;
use uuid::Uuid;

struct SeedLocation {
    country: &'static str,
    city: &'static str,
    post_code: &'static str,
    street: &'static str,
    number: &'static str,
}

struct SeedOrganizer {
    name: &'static str,
    email: &'static str,
}

struct SeedEvent {
    name: &'static str,
    description: &'static str,
    date: &'static str,
    price: f64,
    event_type: &'static str,
    link: Option<&'static str>,
    /// Indexes into `LOCATIONS` and `ORGANIZERS`
    location: usize,
    organizer: usize,
}

const LOCATIONS: [SeedLocation; 3] = [
    SeedLocation {
        country: "Finland",
        city: "Helsinki",
        post_code: "00100",
        street: "Mannerheimintie",
        number: "13",
    },
    SeedLocation {
        country: "Finland",
        city: "Espoo",
        post_code: "02150",
        street: "Otakaari",
        number: "1",
    },
    SeedLocation {
        country: "Finland",
        city: "Tampere",
        post_code: "33100",
        street: "Hämeenkatu",
        number: "25",
    },
];

const ORGANIZERS: [SeedOrganizer; 2] = [
    SeedOrganizer {
        name: "Aino Virtanen",
        email: "aino.organizer@example.com",
    },
    SeedOrganizer {
        name: "Mikko Laine",
        email: "mikko.organizer@example.com",
    },
];

const EVENTS: [SeedEvent; 4] = [
    SeedEvent {
        name: "Helsinki Rust Meetup",
        description: "Lightning talks on async Rust followed by pizza and networking.",
        date: "2027-03-18T17:30:00Z",
        price: 0.0,
        event_type: "meetup",
        link: Some("https://example.com/rust-meetup"),
        location: 0,
        organizer: 0,
    },
    SeedEvent {
        name: "Otaniemi Spring Hackathon",
        description: "A weekend of building prototypes with students and local startups.",
        date: "2027-04-10T09:00:00Z",
        price: 15.0,
        event_type: "hackathon",
        link: None,
        location: 1,
        organizer: 1,
    },
    SeedEvent {
        name: "Tampere Jazz Evening",
        description: "Live jazz quartet with an open jam session after the main set.",
        date: "2027-05-02T19:00:00Z",
        price: 25.0,
        event_type: "concert",
        link: Some("https://example.com/jazz-evening"),
        location: 2,
        organizer: 1,
    },
    SeedEvent {
        name: "Cloud Cost Workshop",
        description: "Hands-on workshop on measuring and trimming cloud spend.",
        date: "2027-05-20T12:00:00Z",
        price: 49.0,
        event_type: "workshop",
        link: None,
        location: 0,
        organizer: 0,
    },
];

/// What a seeding run changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub locations: usize,
    pub organizers: usize,
    pub events: usize,
    /// Records that were already present
    pub skipped: usize,
}

/// Insert the demo locations, organizer accounts and events.
/// Organizers sign in with `password`.
pub async fn run<U, L, E>(
    users: &UserService<U>,
    locations: &LocationService<L>,
    events: &EventService<E>,
    password: &str,
) -> Result<SeedReport>
where
    U: UserRepository,
    L: LocationRepository,
    E: EventRepository,
{
    let mut report = SeedReport::default();

    let mut venue_ids = Vec::with_capacity(LOCATIONS.len());
    for seed in &LOCATIONS {
        venue_ids.push(seed_location(locations, seed, &mut report).await?);
    }

    let mut organizer_ids = Vec::with_capacity(ORGANIZERS.len());
    for seed in &ORGANIZERS {
        organizer_ids.push(seed_organizer(users, seed, password, &mut report).await?);
    }

    for seed in &EVENTS {
        let organizer = organizer_ids[seed.organizer];
        let attendees = organizer_ids
            .iter()
            .filter(|id| **id != organizer)
            .map(Uuid::to_string)
            .collect();
        let input = CreateEvent {
            name: Some(seed.name.to_string()),
            description: Some(seed.description.to_string()),
            date: Some(seed.date.to_string()),
            price: Some(seed.price),
            event_type: Some(seed.event_type.to_string()),
            event_link: seed.link.map(str::to_string),
            location: Some(venue_ids[seed.location].to_string()),
            organizer: Some(organizer.to_string()),
            attendees,
            images: Vec::new(),
        };

        match events.create_event(input, Vec::new()).await {
            Ok(created) => {
                info!(event_id = %created.id, name = seed.name, "event seeded");
                report.events += 1;
            }
            Err(EventError::DuplicateName) => report.skipped += 1,
            Err(e) => return Err(e).wrap_err_with(|| format!("seeding event {}", seed.name)),
        }
    }

    info!(
        locations = report.locations,
        organizers = report.organizers,
        events = report.events,
        skipped = report.skipped,
        "Seeding complete"
    );
    Ok(report)
}

async fn seed_location<L: LocationRepository>(
    service: &LocationService<L>,
    seed: &SeedLocation,
    report: &mut SeedReport,
) -> Result<Uuid> {
    let same = |value: Option<&str>, expected: &str| {
        value.is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
    };

    let filter = LocationFilter {
        country: Some(seed.country.to_string()),
        city: Some(seed.city.to_string()),
        limit: 100,
        ..Default::default()
    };
    let existing = service
        .list_locations(filter)
        .await
        .wrap_err("listing locations")?;
    if let Some(found) = existing.locations.iter().find(|l| {
        same(l.street.as_deref(), seed.street) && same(l.address_number.as_deref(), seed.number)
    }) {
        report.skipped += 1;
        return Ok(found.id);
    }

    let created = service
        .create_location(CreateLocation {
            country: seed.country.to_string(),
            city: seed.city.to_string(),
            post_code: Some(seed.post_code.to_string()),
            district: None,
            ward: None,
            street: Some(seed.street.to_string()),
            address_number: Some(seed.number.to_string()),
        })
        .await
        .wrap_err_with(|| format!("seeding location in {}", seed.city))?;
    info!(location_id = %created.id, city = seed.city, "location seeded");
    report.locations += 1;
    Ok(created.id)
}

async fn seed_organizer<U: UserRepository>(
    service: &UserService<U>,
    seed: &SeedOrganizer,
    password: &str,
    report: &mut SeedReport,
) -> Result<Uuid> {
    let input = CreateUser {
        name: seed.name.to_string(),
        email: seed.email.to_string(),
        password: password.to_string(),
        role: Role::Organizer,
    };

    match service.create_user(input).await {
        Ok(created) => {
            info!(user_id = %created.id, email = seed.email, "organizer seeded");
            report.organizers += 1;
            Ok(created.id)
        }
        Err(UserError::DuplicateEmail) => {
            let existing = service
                .repository()
                .get_by_email(seed.email)
                .await?
                .ok_or_else(|| eyre!("{} disappeared while seeding", seed.email))?;
            report.skipped += 1;
            Ok(existing.id)
        }
        Err(e) => Err(e).wrap_err_with(|| format!("seeding organizer {}", seed.email)),
    }
}
