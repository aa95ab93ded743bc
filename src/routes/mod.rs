pub mod docs;
pub mod health;
mod router;
pub mod types;
pub mod url_handlers;

pub use router::create_router;

// Re-export AppState for convenience
pub use crate::state::AppState;
