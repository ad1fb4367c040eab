use mongodb::{Database, IndexModel, bson::Document, options::IndexOptions};
use tracing::info;

/// Declarative index for [`ensure_indexes`].
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub keys: Document,
    pub unique: bool,
    /// Only index documents where the indexed field exists.
    pub sparse: bool,
}

impl IndexSpec {
    pub fn new(collection: &'static str, keys: Document) -> Self {
        Self {
            collection,
            keys,
            unique: false,
            sparse: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    fn into_model(self) -> IndexModel {
        let options = IndexOptions::builder()
            .unique(self.unique)
            .sparse(self.sparse)
            .build();
        IndexModel::builder().keys(self.keys).options(options).build()
    }
}

/// Create every index in `specs`. MongoDB treats re-creating an identical index as a no-op.
pub async fn ensure_indexes(
    db: &Database,
    specs: Vec<IndexSpec>,
) -> Result<(), mongodb::error::Error> {
    for spec in specs {
        let collection = spec.collection;
        let keys = spec.keys.clone();
        db.collection::<Document>(collection)
            .create_index(spec.into_model())
            .await?;
        info!(collection, ?keys, "index ensured");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_index_spec_builder_flags() {
        let spec = IndexSpec::new("users", doc! { "google_id": 1 }).unique().sparse();
        assert!(spec.unique);
        assert!(spec.sparse);

        let model = spec.into_model();
        let options = model.options.unwrap();
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.sparse, Some(true));
    }
}
