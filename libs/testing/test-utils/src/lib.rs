//! Shared test infrastructure for the domain crates.
//!
//! - [`TestMongo`]: throwaway MongoDB container, removed on drop
//! - [`TestDataBuilder`]: deterministic names, emails and ids per test
//!
//! ```rust,ignore
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! #[ignore] // Requires Docker
//! async fn stores_events() {
//!     let mongo = TestMongo::new().await;
//!     let db = mongo.database("stores_events");
//!     let data = TestDataBuilder::from_test_name("stores_events");
//!     let name = data.name("event", "main");
//! }
//! ```

mod mongo;

pub use mongo::TestMongo;

use uuid::Uuid;

/// Seeded generator so a test produces the same data on every run.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed derived from the test name.
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Stable id for slot `n` of this test.
    pub fn id(&self, n: u8) -> Uuid {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.seed.to_le_bytes());
        bytes[8..].copy_from_slice(&self.seed.rotate_left(u32::from(n)).to_be_bytes());
        bytes[15] ^= n;
        Uuid::from_bytes(bytes)
    }

    /// `test-{prefix}-{seed}-{suffix}`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Unique lowercase address under `example.com`.
    pub fn email(&self, local: &str) -> String {
        format!("{}.{}@example.com", local.to_lowercase(), self.seed)
    }
}
