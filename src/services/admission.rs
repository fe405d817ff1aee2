use log::{error, info, warn};

use crate::backend::PayoutSource;
use crate::models::{AutoModeConfig, Payout};
use crate::services::eviction::choose_victim;
use crate::services::interaction::{build_prompt, Prompt};

pub const DEFAULT_PENDING_CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AutoAccept,
    AutoEvictSmallestThenAccept,
    DeferToHuman,
}

/// What actually happened after an [`Action`] was carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted,
    EvictedAndAccepted { victim: Payout },
    Deferred(Prompt),
    Failed(String),
}

/// Pick an action for a qualifying payout. Rules apply in order:
/// disabled auto mode defers, an amount outside a configured range defers,
/// room in the queue accepts, otherwise evict the smallest and accept.
pub fn decide(
    payout: &Payout,
    pending: &[Payout],
    auto_mode: &AutoModeConfig,
    capacity: usize,
) -> Action {
    if !auto_mode.is_enabled() {
        return Action::DeferToHuman;
    }
    if let AutoModeConfig::Ranged { .. } = auto_mode {
        match payout.amount_value() {
            Some(amount) if auto_mode.covers(amount) => {}
            _ => return Action::DeferToHuman,
        }
    }
    if pending.len() < capacity {
        Action::AutoAccept
    } else {
        Action::AutoEvictSmallestThenAccept
    }
}

/// Carry out `action` against the backend. Never fails; problems end up in
/// [`Outcome::Failed`] and the log.
pub async fn execute(
    backend: &dyn PayoutSource,
    payout: &Payout,
    pending: &[Payout],
    action: Action,
    capacity: usize,
) -> Outcome {
    match action {
        Action::DeferToHuman => Outcome::Deferred(build_prompt(&payout.uuid, pending, capacity)),
        Action::AutoAccept => match accept(backend, &payout.uuid).await {
            Ok(()) => Outcome::Accepted,
            Err(reason) => Outcome::Failed(reason),
        },
        Action::AutoEvictSmallestThenAccept => {
            let Some(victim) = choose_victim(pending) else {
                warn!(
                    "No evictable pending payout for {}, queue has {} items",
                    payout.uuid,
                    pending.len()
                );
                return Outcome::Failed("no pending payout with a comparable amount".to_string());
            };

            let ids = [victim.uuid.clone()];
            let cancelled = backend.cancel_payouts(&ids).await;
            if !cancelled.succeeded(&victim.uuid) {
                let reason = cancelled.reason(&victim.uuid);
                error!("Auto eviction of {} failed: {}", victim.uuid, reason);
                return Outcome::Failed(format!("cancel {}: {}", victim.uuid, reason));
            }
            info!("Auto evicted {} for {}", victim.uuid, payout.uuid);

            match accept(backend, &payout.uuid).await {
                Ok(()) => Outcome::EvictedAndAccepted {
                    victim: victim.clone(),
                },
                Err(reason) => Outcome::Failed(reason),
            }
        }
    }
}

async fn accept(backend: &dyn PayoutSource, id: &str) -> Result<(), String> {
    let ids = [id.to_string()];
    let result = backend.accept_payouts(&ids).await;
    if result.succeeded(id) {
        info!("Auto accepted payout {}", id);
        Ok(())
    } else {
        let reason = result.reason(id);
        error!("Auto accept of {} failed: {}", id, reason);
        Err(format!("accept {}: {}", id, reason))
    }
}
