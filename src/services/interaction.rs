//! Manual admission flow driven by inline buttons.
//!
//! Every button carries the action, a candidate index and the new payout id,
//! so a click can be resolved without any server-side session. Old messages
//! keep working across restarts.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use log::{info, warn};

use crate::backend::PayoutSource;
use crate::errors::{InteractionError, PayloadError};
use crate::models::Payout;
use crate::services::eviction::ranked_candidates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Accept,
    Evict,
}

impl ButtonAction {
    fn tag(self) -> &'static str {
        match self {
            ButtonAction::Accept => "a",
            ButtonAction::Evict => "e",
        }
    }
}

/// Decoded `callback_data` of an inline button: `<action>:<index>:<base64 id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPayload {
    pub action: ButtonAction,
    pub index: usize,
    pub payout_id: String,
}

impl ButtonPayload {
    pub fn accept(payout_id: &str) -> Self {
        Self {
            action: ButtonAction::Accept,
            index: 0,
            payout_id: payout_id.to_string(),
        }
    }

    pub fn evict(index: usize, payout_id: &str) -> Self {
        Self {
            action: ButtonAction::Evict,
            index,
            payout_id: payout_id.to_string(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            self.action.tag(),
            self.index,
            URL_SAFE_NO_PAD.encode(self.payout_id.as_bytes())
        )
    }

    pub fn decode(data: &str) -> Result<Self, PayloadError> {
        let mut parts = data.splitn(3, ':');
        let (Some(tag), Some(index), Some(encoded)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(PayloadError::Layout(data.to_string()));
        };

        let action = match tag {
            "a" => ButtonAction::Accept,
            "e" => ButtonAction::Evict,
            other => return Err(PayloadError::UnknownAction(other.to_string())),
        };
        let index = index
            .parse::<usize>()
            .map_err(|_| PayloadError::Index(index.to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| PayloadError::Encoding(e.to_string()))?;
        let payout_id =
            String::from_utf8(bytes).map_err(|e| PayloadError::Encoding(e.to_string()))?;
        if payout_id.is_empty() {
            return Err(PayloadError::Encoding("empty payout id".to_string()));
        }

        Ok(Self {
            action,
            index,
            payout_id,
        })
    }
}

/// What an operator is asked to do about a new payout.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// There is room: a single accept button.
    Offer { payout_id: String },
    /// The queue is full: one evict button per pending payout, smallest first.
    MustEvict {
        payout_id: String,
        candidates: Vec<Payout>,
    },
}

impl Prompt {
    pub fn payout_id(&self) -> &str {
        match self {
            Prompt::Offer { payout_id } | Prompt::MustEvict { payout_id, .. } => payout_id,
        }
    }

    /// Button payloads in display order.
    pub fn buttons(&self) -> Vec<ButtonPayload> {
        match self {
            Prompt::Offer { payout_id } => vec![ButtonPayload::accept(payout_id)],
            Prompt::MustEvict {
                payout_id,
                candidates,
            } => (0..candidates.len())
                .map(|index| ButtonPayload::evict(index, payout_id))
                .collect(),
        }
    }
}

pub fn build_prompt(payout_id: &str, pending: &[Payout], capacity: usize) -> Prompt {
    if pending.len() < capacity {
        Prompt::Offer {
            payout_id: payout_id.to_string(),
        }
    } else {
        Prompt::MustEvict {
            payout_id: payout_id.to_string(),
            candidates: ranked_candidates(pending),
        }
    }
}

/// Result of a successfully handled click.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The new payout was accepted; `evicted` is the payout cancelled by this click.
    Accepted {
        payout_id: String,
        evicted: Option<Payout>,
    },
    /// The queue is still full after this click; ask again.
    StillFull {
        evicted: Option<Payout>,
        prompt: Prompt,
    },
}

/// Resolve a button click against the live pending list.
pub async fn resolve_click(
    backend: &dyn PayoutSource,
    capacity: usize,
    payload: &ButtonPayload,
) -> Result<Resolution, InteractionError> {
    match payload.action {
        ButtonAction::Accept => accept_offer(backend, capacity, &payload.payout_id).await,
        ButtonAction::Evict => {
            evict_then_admit(backend, capacity, payload.index, &payload.payout_id).await
        }
    }
}

async fn accept_offer(
    backend: &dyn PayoutSource,
    capacity: usize,
    payout_id: &str,
) -> Result<Resolution, InteractionError> {
    let pending = backend.fetch_pending_payouts().await;
    if pending.len() >= capacity {
        info!(
            "Queue filled up before {} was accepted ({} pending)",
            payout_id,
            pending.len()
        );
        return Ok(Resolution::StillFull {
            evicted: None,
            prompt: build_prompt(payout_id, &pending, capacity),
        });
    }
    admit(backend, payout_id, None).await
}

async fn evict_then_admit(
    backend: &dyn PayoutSource,
    capacity: usize,
    index: usize,
    payout_id: &str,
) -> Result<Resolution, InteractionError> {
    // The index refers to the ranking at click time, not the rendered one.
    let candidates = ranked_candidates(&backend.fetch_pending_payouts().await);
    let victim = candidates
        .get(index)
        .cloned()
        .ok_or(InteractionError::IndexOutOfRange {
            index,
            len: candidates.len(),
        })?;

    let ids = [victim.uuid.clone()];
    let result = backend.cancel_payouts(&ids).await;
    if !result.succeeded(&victim.uuid) {
        warn!("Operator eviction of {} failed", victim.uuid);
        return Err(InteractionError::EvictionFailed {
            reason: result.reason(&victim.uuid),
            id: victim.uuid,
        });
    }
    info!("Operator evicted {} to make room for {}", victim.uuid, payout_id);

    let pending = backend.fetch_pending_payouts().await;
    if pending.len() >= capacity {
        return Ok(Resolution::StillFull {
            evicted: Some(victim),
            prompt: build_prompt(payout_id, &pending, capacity),
        });
    }
    admit(backend, payout_id, Some(victim)).await
}

async fn admit(
    backend: &dyn PayoutSource,
    payout_id: &str,
    evicted: Option<Payout>,
) -> Result<Resolution, InteractionError> {
    let ids = [payout_id.to_string()];
    let result = backend.accept_payouts(&ids).await;
    if !result.succeeded(payout_id) {
        return Err(InteractionError::AcceptFailed {
            id: payout_id.to_string(),
            reason: result.reason(payout_id),
        });
    }
    info!("Operator accepted payout {}", payout_id);
    Ok(Resolution::Accepted {
        payout_id: payout_id.to_string(),
        evicted,
    })
}
