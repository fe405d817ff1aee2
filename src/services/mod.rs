pub mod admission;
pub mod eviction;
pub mod intake;
pub mod interaction;
pub mod monitor;
pub mod notification_handler;
