// File-backed state, one JSON document per concern
pub mod json_file;
pub mod repositories;

// Re-export commonly used types
pub use json_file::JsonFile;
pub use repositories::{AutoModeRepository, LedgerRepository, SubscriberRepository};
