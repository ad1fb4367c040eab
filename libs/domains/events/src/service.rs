//! Event Service - reference checks, summaries and embeddings

use chrono::Utc;
use domain_locations::LocationResponse;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::directory::{PeopleDirectory, Person, Venue, VenueDirectory};
use crate::embedding::Embedder;
use crate::error::{EventError, EventResult};
use crate::images::{ImageStore, ImageUpload, MAX_IMAGES};
use crate::models::{
    ChatMessage, CreateEvent, Event, EventDetails, EventFilter, EventList, EventResponse,
    NewEvent, ScoredEvent, UpdateEvent,
};
use crate::repository::EventRepository;
use crate::summary::summarize;
use crate::validation::{non_blank, parse_event_date, parse_event_type, parse_reference};

const MISSING_FIELDS: &str = "Ensure you have added all necessary information";

pub struct EventService<R: EventRepository> {
    repository: Arc<R>,
    people: Arc<dyn PeopleDirectory>,
    venues: Arc<dyn VenueDirectory>,
    embedder: Arc<dyn Embedder>,
    images: Arc<dyn ImageStore>,
}

impl<R: EventRepository> EventService<R> {
    pub fn new(
        repository: R,
        people: Arc<dyn PeopleDirectory>,
        venues: Arc<dyn VenueDirectory>,
        embedder: Arc<dyn Embedder>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            people,
            venues,
            embedder,
            images,
        }
    }

    /// Check references and fields, summarize and embed, store uploads, then persist.
    /// A failure at any step leaves nothing behind in the database.
    #[instrument(skip(self, input, uploads), fields(uploads = uploads.len()))]
    pub async fn create_event(
        &self,
        input: CreateEvent,
        uploads: Vec<ImageUpload>,
    ) -> EventResult<EventResponse> {
        let (draft, organizer, venue) = self.validate_new(input, uploads.len()).await?;

        if self.repository.name_exists(&draft.name, None).await? {
            return Err(EventError::DuplicateName);
        }

        let mut event = Event::new(draft);
        self.refresh_summary(&mut event, &venue, &organizer).await?;

        for upload in uploads {
            let url = self.images.store(upload).await?;
            event.images.push(url);
        }

        let created = self.repository.create(event).await?;
        tracing::info!(event_id = %created.id, name = %created.name, "event created");
        Ok(created.into())
    }

    /// The event with organizer, attendees and location resolved
    #[instrument(skip(self))]
    pub async fn get_event(&self, id: Uuid) -> EventResult<EventDetails> {
        let event = self.find(id).await?;
        let mut populated = self.populate(vec![event]).await?;
        populated.pop().ok_or(EventError::NotFound(id))
    }

    /// Organizer of a stored event, for ownership checks
    pub async fn event_organizer(&self, id: Uuid) -> EventResult<Uuid> {
        Ok(self.find(id).await?.organizer)
    }

    #[instrument(skip(self))]
    pub async fn list_events(&self, filter: EventFilter) -> EventResult<EventList> {
        let filter = filter.normalized();
        let total = self.repository.count(filter.clone()).await?;
        let events = self.repository.list(filter.clone()).await?;

        Ok(EventList {
            events: self.populate(events).await?,
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    /// Resolves references, looking each id up once per call.
    async fn populate(&self, events: Vec<Event>) -> EventResult<Vec<EventDetails>> {
        let mut people: HashMap<Uuid, Option<Person>> = HashMap::new();
        let mut places: HashMap<Uuid, Option<LocationResponse>> = HashMap::new();
        let mut populated = Vec::with_capacity(events.len());

        for event in events {
            let organizer = self.person_cached(&mut people, event.organizer).await?;
            let mut attendees = Vec::with_capacity(event.attendees.len());
            for &id in &event.attendees {
                if let Some(person) = self.person_cached(&mut people, id).await? {
                    attendees.push(person);
                }
            }

            let location = match places.get(&event.location) {
                Some(hit) => hit.clone(),
                None => {
                    let found = self
                        .venues
                        .venue(event.location)
                        .await?
                        .map(|venue| venue.location);
                    places.insert(event.location, found.clone());
                    found
                }
            };

            populated.push(EventDetails::populate(event, location, organizer, attendees));
        }
        Ok(populated)
    }

    async fn person_cached(
        &self,
        cache: &mut HashMap<Uuid, Option<Person>>,
        id: Uuid,
    ) -> EventResult<Option<Person>> {
        if let Some(hit) = cache.get(&id) {
            return Ok(hit.clone());
        }
        let found = self.people.person(id).await?;
        cache.insert(id, found.clone());
        Ok(found)
    }

    /// Partial update. Changed references are re-checked and the summary is
    /// recomputed whenever one of its inputs changes.
    #[instrument(skip(self, input))]
    pub async fn update_event(&self, id: Uuid, input: UpdateEvent) -> EventResult<EventResponse> {
        input.validate()?;
        let mut event = self.find(id).await?;
        let mut summary_stale = false;

        if let Some(name) = non_blank(input.name.as_deref()) {
            if name != event.name {
                if self.repository.name_exists(name, Some(id)).await? {
                    return Err(EventError::DuplicateName);
                }
                event.name = name.to_string();
                summary_stale = true;
            }
        }
        if let Some(description) = non_blank(input.description.as_deref()) {
            summary_stale |= description != event.description;
            event.description = description.to_string();
        }
        if let Some(date) = non_blank(input.date.as_deref()) {
            let date = parse_event_date(date)?;
            summary_stale |= date != event.date;
            event.date = date;
        }
        if let Some(price) = input.price {
            summary_stale |= price != event.price;
            event.price = price;
        }
        if let Some(event_type) = non_blank(input.event_type.as_deref()) {
            let event_type = parse_event_type(event_type)?;
            summary_stale |= event_type != event.event_type;
            event.event_type = event_type;
        }
        if let Some(link) = input.event_link {
            let link = non_blank(Some(&link)).map(str::to_string);
            summary_stale |= link != event.event_link;
            event.event_link = link;
        }
        if input.organizer.is_some() {
            let organizer = parse_reference(input.organizer.as_deref(), "Invalid organizer ID")?;
            summary_stale |= organizer != event.organizer;
            event.organizer = organizer;
        }
        if input.location.is_some() {
            let location = parse_reference(input.location.as_deref(), "Invalid location ID")?;
            summary_stale |= location != event.location;
            event.location = location;
        }
        if let Some(attendees) = input.attendees {
            event.attendees = parse_attendees(&attendees)?;
        }
        if let Some(images) = input.images {
            if images.len() > MAX_IMAGES {
                return Err(too_many_images());
            }
            event.images = images;
        }

        if summary_stale {
            let organizer = self.organizer(event.organizer).await?;
            let venue = self.venue(event.location).await?;
            self.refresh_summary(&mut event, &venue, &organizer).await?;
            tracing::debug!(event_id = %id, "summary inputs changed, embedding refreshed");
        }

        event.updated_at = Utc::now();
        let updated = self.repository.update(event).await?;
        Ok(updated.into())
    }

    /// Removes the event only; its location and organizer are untouched.
    #[instrument(skip(self))]
    pub async fn delete_event(&self, id: Uuid) -> EventResult<()> {
        if !self.repository.delete(id).await? {
            return Err(EventError::NotFound(id));
        }
        Ok(())
    }

    /// Append a chat message to the event's log.
    #[instrument(skip(self, message), fields(sender = %message.sender))]
    pub async fn append_message(&self, id: Uuid, message: ChatMessage) -> EventResult<()> {
        if !self.repository.push_message(id, message).await? {
            return Err(EventError::NotFound(id));
        }
        Ok(())
    }

    /// Events whose summaries are semantically closest to `query`.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: usize) -> EventResult<Vec<ScoredEvent>> {
        let embedding = self.embedder.embed(query).await?;
        self.repository.search_similar(embedding, limit).await
    }

    async fn find(&self, id: Uuid) -> EventResult<Event> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(EventError::NotFound(id))
    }

    async fn organizer(&self, id: Uuid) -> EventResult<Person> {
        self.people
            .person(id)
            .await?
            .ok_or_else(|| EventError::Validation("Organizer not found".to_string()))
    }

    async fn venue(&self, id: Uuid) -> EventResult<Venue> {
        self.venues
            .venue(id)
            .await?
            .ok_or_else(|| EventError::Validation("Location not found".to_string()))
    }

    async fn refresh_summary(
        &self,
        event: &mut Event,
        venue: &Venue,
        organizer: &Person,
    ) -> EventResult<()> {
        let summary = summarize(event, venue, organizer);
        let embedding = self.embedder.embed(&summary).await?;
        event.set_summary(summary, embedding);
        Ok(())
    }

    /// References first, then required fields, then formats.
    async fn validate_new(
        &self,
        input: CreateEvent,
        upload_count: usize,
    ) -> EventResult<(NewEvent, Person, Venue)> {
        let organizer_id = parse_reference(input.organizer.as_deref(), "Invalid organizer ID")?;
        let location_id = parse_reference(input.location.as_deref(), "Invalid location ID")?;
        let organizer = self.organizer(organizer_id).await?;
        let venue = self.venue(location_id).await?;

        let (Some(name), Some(description), Some(date), Some(price), Some(event_type)) = (
            non_blank(input.name.as_deref()),
            non_blank(input.description.as_deref()),
            non_blank(input.date.as_deref()),
            input.price,
            non_blank(input.event_type.as_deref()),
        ) else {
            return Err(EventError::Validation(MISSING_FIELDS.to_string()));
        };

        input.validate()?;
        if input.images.len() + upload_count > MAX_IMAGES {
            return Err(too_many_images());
        }

        let draft = NewEvent {
            name: name.to_string(),
            description: description.to_string(),
            date: parse_event_date(date)?,
            price,
            event_type: parse_event_type(event_type)?,
            event_link: non_blank(input.event_link.as_deref()).map(str::to_string),
            location: location_id,
            organizer: organizer_id,
            attendees: parse_attendees(&input.attendees)?,
            images: input.images.clone(),
        };
        Ok((draft, organizer, venue))
    }
}

fn parse_attendees(raw: &[String]) -> EventResult<Vec<Uuid>> {
    let mut attendees = Vec::with_capacity(raw.len());
    for id in raw {
        let id = parse_reference(Some(id), "Invalid attendee ID")?;
        if !attendees.contains(&id) {
            attendees.push(id);
        }
    }
    Ok(attendees)
}

fn too_many_images() -> EventError {
    EventError::Upload(format!("An event can have at most {MAX_IMAGES} images"))
}

impl<R: EventRepository> Clone for EventService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            people: Arc::clone(&self.people),
            venues: Arc::clone(&self.venues),
            embedder: Arc::clone(&self.embedder),
            images: Arc::clone(&self.images),
        }
    }
}
