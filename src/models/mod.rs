pub mod auto_mode;
pub mod payout;

pub use auto_mode::AutoModeConfig;
pub use payout::{MutationRequest, MutationResult, Payout, PayoutList};
