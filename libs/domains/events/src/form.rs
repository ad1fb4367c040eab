//! Multipart create requests: event fields plus up to five image files.

use axum::extract::Multipart;

use crate::error::{EventError, EventResult};
use crate::images::{ImageUpload, MAX_IMAGES};
use crate::models::CreateEvent;

/// Field that carries the whole event as a JSON document
pub const DATA_FIELD: &str = "data";

/// A create request read from `multipart/form-data`.
#[derive(Debug, Default)]
pub struct EventForm {
    pub event: CreateEvent,
    pub uploads: Vec<ImageUpload>,
}

impl EventForm {
    /// Parts with a file name are image uploads. Text parts are either a
    /// `data` JSON document or individual event fields.
    pub async fn read(mut multipart: Multipart) -> EventResult<Self> {
        let mut form = EventForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| EventError::Upload(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_some() {
                if form.uploads.len() == MAX_IMAGES {
                    return Err(EventError::Upload(format!(
                        "An event can have at most {MAX_IMAGES} images"
                    )));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| EventError::Upload(e.body_text()))?;
                form.uploads
                    .push(ImageUpload::new(file_name, content_type.as_deref(), data)?);
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| EventError::Upload(e.body_text()))?;
            form.set_text(&name, value)?;
        }

        Ok(form)
    }

    fn set_text(&mut self, name: &str, value: String) -> EventResult<()> {
        let event = &mut self.event;
        match name {
            DATA_FIELD => {
                let parsed: CreateEvent = serde_json::from_str(&value).map_err(|_| {
                    EventError::Validation("Event data must be valid JSON".to_string())
                })?;
                let images = std::mem::take(&mut event.images);
                *event = parsed;
                event.images.extend(images);
            }
            "name" => event.name = Some(value),
            "description" => event.description = Some(value),
            "date" => event.date = Some(value),
            "price" => {
                let price = value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| EventError::Validation("Price must be a number".to_string()))?;
                event.price = Some(price);
            }
            "event_type" => event.event_type = Some(value),
            "event_link" => event.event_link = Some(value),
            "location" => event.location = Some(value),
            "organizer" => event.organizer = Some(value),
            "attendees" => event.attendees.extend(split_list(&value)),
            "images" => event.images.extend(split_list(&value)),
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
        Ok(())
    }
}

/// A repeated field value: a JSON array, or a comma-separated list.
fn split_list(value: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(value) {
        return items;
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
