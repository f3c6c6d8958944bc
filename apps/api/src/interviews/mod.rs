// Interview listing, detail, and feedback endpoints.
// Interviews are read-only here; creation happens elsewhere.

pub mod card;
pub mod feedback;
pub mod handlers;
