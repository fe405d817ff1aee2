//! In-memory collaborators for exercising the decision logic without a
//! backend or Telegram.

use anyhow::{anyhow, Result};
use std::sync::Mutex;

use crate::backend::PayoutSource;
use crate::models::{MutationResult, Payout};
use crate::services::notification_handler::{NotificationType, Notifier};

#[derive(Default)]
struct BackendState {
    payouts: Vec<Payout>,
    pending: Vec<Payout>,
    accepted: Vec<String>,
    cancelled: Vec<String>,
    fail_cancels: bool,
    fail_accepts: bool,
}

/// Backend whose pending list reacts to accept/cancel like the real one.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

impl FakeBackend {
    /// Pending payouts `P0..Pn` with the given amounts.
    pub fn pending_of(amounts: &[f64]) -> Vec<Payout> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| Payout::new(&format!("P{}", i), *amount, ""))
            .collect()
    }

    pub fn with_pending(amounts: &[f64]) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().pending = Self::pending_of(amounts);
        backend
    }

    pub fn add_payout(&self, payout: Payout) {
        self.state.lock().unwrap().payouts.push(payout);
    }

    pub fn push_pending(&self, payout: Payout) {
        self.state.lock().unwrap().pending.push(payout);
    }

    pub fn remove_pending(&self, id: &str) {
        self.state.lock().unwrap().pending.retain(|p| p.uuid != id);
    }

    pub fn fail_cancels(&self) {
        self.state.lock().unwrap().fail_cancels = true;
    }

    pub fn fail_accepts(&self) {
        self.state.lock().unwrap().fail_accepts = true;
    }

    pub fn pending(&self) -> Vec<Payout> {
        self.state.lock().unwrap().pending.clone()
    }

    pub fn accepted(&self) -> Vec<String> {
        self.state.lock().unwrap().accepted.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }
}

#[async_trait::async_trait]
impl PayoutSource for FakeBackend {
    async fn fetch_payouts(&self) -> Vec<Payout> {
        self.state.lock().unwrap().payouts.clone()
    }

    async fn fetch_pending_payouts(&self) -> Vec<Payout> {
        self.pending()
    }

    async fn accept_payouts(&self, ids: &[String]) -> MutationResult {
        let mut state = self.state.lock().unwrap();
        if state.fail_accepts {
            return MutationResult::failed(ids, "accept disabled");
        }
        let mut result = MutationResult::default();
        for id in ids {
            if state.pending.iter().any(|p| &p.uuid == id) {
                result.error.insert(id.clone(), "already pending".to_string());
                continue;
            }
            let payout = state
                .payouts
                .iter()
                .find(|p| &p.uuid == id)
                .cloned()
                .unwrap_or_else(|| Payout {
                    uuid: id.clone(),
                    ..Default::default()
                });
            state.pending.push(payout);
            state.accepted.push(id.clone());
            result.success.push(id.clone());
        }
        result
    }

    async fn cancel_payouts(&self, ids: &[String]) -> MutationResult {
        let mut state = self.state.lock().unwrap();
        if state.fail_cancels {
            return MutationResult::failed(ids, "cancel disabled");
        }
        let mut result = MutationResult::default();
        for id in ids {
            let before = state.pending.len();
            state.pending.retain(|p| &p.uuid != id);
            if state.pending.len() < before {
                state.cancelled.push(id.clone());
                result.success.push(id.clone());
            } else {
                result.error.insert(id.clone(), "not pending".to_string());
            }
        }
        result
    }
}

/// Notifier that records what would have been sent.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, NotificationType)>>,
    unreachable: Mutex<Vec<i64>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(i64, NotificationType)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn make_unreachable(&self, chat_id: i64) {
        self.unreachable.lock().unwrap().push(chat_id);
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, chat_id: i64, notification: &NotificationType) -> Result<()> {
        if self.unreachable.lock().unwrap().contains(&chat_id) {
            return Err(anyhow!("chat {} blocked the bot", chat_id));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id, notification.clone()));
        Ok(())
    }
}
