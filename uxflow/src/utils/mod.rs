//! Run identifier helpers.

use uuid::Uuid;

/// Generates a new run id (UUID v4).
///
/// v4 ids carry 122 random bits, so concurrent runs never collide in
/// practice and ids cannot be guessed from one another.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Parses a run id supplied by a caller. Surrounding whitespace is ignored.
#[must_use]
pub fn parse_run_id(text: &str) -> Option<Uuid> {
    Uuid::parse_str(text.trim()).ok()
}
