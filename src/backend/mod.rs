pub mod client;

pub use client::BackendClient;

use crate::models::{MutationResult, Payout};

/// Read/mutate access to the payouts backend.
///
/// Implementations never fail: fetches degrade to an empty list and
/// mutations report per-id failures through [`MutationResult::error`].
#[async_trait::async_trait]
pub trait PayoutSource: Send + Sync {
    async fn fetch_payouts(&self) -> Vec<Payout>;
    async fn fetch_pending_payouts(&self) -> Vec<Payout>;
    async fn accept_payouts(&self, ids: &[String]) -> MutationResult;
    async fn cancel_payouts(&self, ids: &[String]) -> MutationResult;
}
