pub mod auto_mode;
pub mod ledger;
pub mod subscribers;

pub use auto_mode::AutoModeRepository;
pub use ledger::LedgerRepository;
pub use subscribers::SubscriberRepository;
