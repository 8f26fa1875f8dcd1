//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a cryptographically secure random token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // Use UUID v4 for tokens (no time component)
        Uuid::new_v4().simple().to_string()
    }
}

/// Check whether a path-supplied identifier is well-formed.
///
/// Relation endpoints receive target ids as raw path strings; a string that
/// does not parse as a ULID can never match a stored row and is reported as
/// a malformed identifier rather than a missing target.
#[must_use]
pub fn is_well_formed(id: &str) -> bool {
    Ulid::from_string(&id.to_uppercase()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generated_ids_are_well_formed() {
        let id_gen = IdGenerator::new();
        assert!(is_well_formed(&id_gen.generate()));
    }

    #[test]
    fn test_malformed_ids_rejected() {
        assert!(!is_well_formed("abc"));
        assert!(!is_well_formed("not-a-ulid-at-all-oh-no-!!"));
        assert!(!is_well_formed(""));
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();
        assert_eq!(token.len(), 32);
    }
}
