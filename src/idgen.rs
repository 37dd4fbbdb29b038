//! Opaque unique-id generation
//!
//! The registries consume ids through a handle so tests can pin them.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Production generator: random v4 UUIDs.
#[derive(Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic generator for tests: id-1, id-2, ...
#[derive(Debug, Default)]
pub struct SequentialGenerator {
    counter: AtomicU64,
}

impl IdGenerator for SequentialGenerator {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("id-{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_generator_is_unique() {
        let gen = UuidGenerator;
        assert_ne!(gen.generate(), gen.generate());
    }

    #[test]
    fn test_sequential_generator() {
        let gen = SequentialGenerator::default();
        assert_eq!(gen.generate(), "id-1");
        assert_eq!(gen.generate(), "id-2");
    }
}
