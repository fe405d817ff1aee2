use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time;

use crate::context::AppContext;
use crate::models::{AutoModeConfig, Payout};
use crate::services::admission::{decide, execute, Outcome};
use crate::services::intake::IntakeFilter;
use crate::services::notification_handler::NotificationType;

/// Summary of one poll cycle.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    pub total: usize,
    pub pending: usize,
    pub handled: Vec<String>,
}

/// Periodic payout check: intake, admission and ledger update.
pub struct PayoutMonitor {
    ctx: Arc<AppContext>,
    filter: IntakeFilter,
}

impl PayoutMonitor {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let filter = IntakeFilter::new(ctx.monitor.recent_window());
        Self { ctx, filter }
    }

    /// Spawn the polling loop. Every error is logged and the loop keeps going.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "Starting payout monitor, interval {}s",
            self.ctx.monitor.check_interval_secs
        );
        tokio::spawn(async move {
            let mut interval = time::interval(self.ctx.monitor.check_interval());
            loop {
                interval.tick().await;
                if let Err(e) = self.run_cycle().await {
                    error!("Error in periodic check: {}", e);
                }
            }
        })
    }

    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.run_cycle_at(Utc::now()).await
    }

    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let processed = self.ctx.ledger.load().await?;

        let (all_payouts, pending_payouts) = futures::future::join(
            self.ctx.backend.fetch_payouts(),
            self.ctx.backend.fetch_pending_payouts(),
        )
        .await;

        let mut report = CycleReport {
            total: all_payouts.len(),
            pending: pending_payouts.len(),
            handled: Vec::new(),
        };

        if all_payouts.is_empty() || pending_payouts.is_empty() {
            info!("No payouts data.");
            return Ok(report);
        }

        let selected =
            self.filter
                .select_new_high_value(&all_payouts, &pending_payouts, &processed, now);
        if selected.is_empty() {
            info!(
                "No new high-value payouts. Total: {}, Pending: {}",
                report.total, report.pending
            );
            return Ok(report);
        }

        info!(
            "Found {} new high-value payouts. Total: {}, Pending: {}",
            selected.len(),
            report.total,
            report.pending
        );
        for payout in selected {
            self.handle_payout(&payout).await;
            // Marked even when delivery or mutation failed: never re-offer.
            if let Err(e) = self.ctx.ledger.mark_processed(&payout.uuid).await {
                error!("Failed to record payout {} as processed: {}", payout.uuid, e);
            }
            report.handled.push(payout.uuid);
        }

        Ok(report)
    }

    async fn handle_payout(&self, payout: &Payout) {
        let auto_mode = self.ctx.auto_mode.get().await.unwrap_or_else(|e| {
            error!("Failed to read automatic mode, assuming off: {}", e);
            AutoModeConfig::Disabled
        });
        // The pending set changes with every decision, so read it fresh.
        let pending = self.ctx.backend.fetch_pending_payouts().await;
        let capacity = self.ctx.capacity();

        let action = decide(payout, &pending, &auto_mode, capacity);
        debug!(
            "Payout {}: {:?} (auto mode {}, {} pending)",
            payout.uuid,
            action,
            auto_mode,
            pending.len()
        );

        let notification =
            match execute(self.ctx.backend.as_ref(), payout, &pending, action, capacity).await {
                Outcome::Accepted => NotificationType::AutoAccepted {
                    payout: payout.clone(),
                },
                Outcome::EvictedAndAccepted { victim } => NotificationType::AutoEvicted {
                    payout: payout.clone(),
                    victim,
                },
                Outcome::Deferred(prompt) => NotificationType::HighValuePayout {
                    payout: payout.clone(),
                    prompt,
                },
                Outcome::Failed(reason) => {
                    error!("Automatic handling of {} failed: {}", payout.uuid, reason);
                    return;
                }
            };

        self.ctx.broadcast(&notification).await;
    }
}
