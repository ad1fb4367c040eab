use mongodb::bson::{Bson, ser::SerializerOptions, to_bson_with_options};
use serde::Serialize;

/// Encode a value the way the driver encodes it inside stored documents.
///
/// The driver writes documents non-human-readably, so e.g. a `Uuid` field is
/// stored as binary. Query values must use the same form to match.
pub fn stored_bson<T: Serialize + ?Sized>(value: &T) -> Bson {
    let options = SerializerOptions::builder().human_readable(false).build();
    to_bson_with_options(value, options).unwrap_or(Bson::Null)
}
