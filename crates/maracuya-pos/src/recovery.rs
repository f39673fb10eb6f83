//! # Parked Sale Recovery
//!
//! Retries sales that failed to commit and were parked.
//!
//! ## Retry Discipline
//! - Only drafts whose backoff has elapsed are attempted (`list_due`).
//! - Validation failures are never retried; they sit on the recovery screen
//!   until someone discards them.
//! - Each parked sale gets at most `max_parked_retries` automatic attempts;
//!   past the cap it waits for manual retry or discard.
//! - Backoff doubles per attempt (`retry_backoff * 2^n`).
//!
//! A retry goes through the normal checkout commit, so it allocates a fresh
//! correlative; and because the draft keeps its original `request_id`, a
//! retry of a commit that actually landed (the failure was on the response
//! path) is answered with the existing sale instead of a duplicate.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use maracuya_core::{ParkedSale, Sale, SaleDraft};
use maracuya_db::Database;

use crate::checkout::Checkout;
use crate::config::AppConfig;
use crate::error::{PosError, PosResult};
use crate::session::Session;

/// Outcome of a recovery sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetryReport {
    pub attempted: usize,
    pub committed: usize,
    pub failed: usize,
    pub skipped_capped: usize,
}

/// The recovery service.
pub struct Recovery {
    db: Database,
    config: AppConfig,
    checkout: Arc<Checkout>,
}

impl Recovery {
    pub fn new(db: Database, config: AppConfig, checkout: Arc<Checkout>) -> Self {
        Recovery { db, config, checkout }
    }

    /// Everything currently parked, for the recovery screen.
    pub async fn list_parked(&self) -> PosResult<Vec<ParkedSale>> {
        Ok(self.db.parked_sales().list_all().await?)
    }

    /// Retries every due parked sale once. Called periodically and after
    /// connectivity returns.
    pub async fn retry_due(&self, session: &Session) -> PosResult<RetryReport> {
        let due = self.db.parked_sales().list_due(Utc::now()).await?;
        let mut report = RetryReport::default();

        for parked in due {
            if parked.attempts >= self.config.max_parked_retries as i64 {
                report.skipped_capped += 1;
                continue;
            }

            report.attempted += 1;
            match self.retry_one(&parked, session).await {
                Ok(sale) => {
                    info!(parked_id = %parked.id, correlative = %sale.correlative, "Parked sale recovered");
                    report.committed += 1;
                }
                Err(err) => {
                    warn!(parked_id = %parked.id, error = %err, "Parked sale retry failed");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Retries a single parked sale (also used by the screen's per-row
    /// "reintentar" button, which works past the automatic cap).
    pub async fn retry_one(&self, parked: &ParkedSale, session: &Session) -> PosResult<Sale> {
        let draft: SaleDraft = serde_json::from_str(&parked.draft_json)?;

        match self.checkout.commit(&draft, session).await {
            Ok(sale) => {
                self.db.parked_sales().delete(&parked.id).await?;
                self.db
                    .audit()
                    .log_action(
                        &session.user_id,
                        "sale.recover",
                        "sale",
                        &sale.id,
                        serde_json::json!({
                            "parked_id": parked.id,
                            "correlative": sale.correlative,
                            "attempts": parked.attempts + 1,
                        }),
                    )
                    .await?;
                Ok(sale)
            }
            Err(err) => {
                let attempt = (parked.attempts + 1) as u32;
                let backoff = self.config.backoff_for_attempt(attempt);
                let retry_after = Utc::now()
                    + chrono::Duration::from_std(backoff).unwrap_or(chrono::Duration::seconds(60));

                // Best effort; the original error matters more
                if let Err(e) = self
                    .db
                    .parked_sales()
                    .record_attempt(&parked.id, &err.to_string(), retry_after)
                    .await
                {
                    warn!(parked_id = %parked.id, error = %e, "Could not record retry attempt");
                }

                Err(err)
            }
        }
    }

    /// Removes a parked sale without committing it. Admin decision.
    pub async fn discard(&self, parked_id: &str, session: &Session) -> PosResult<()> {
        session.require("discard parked sale", maracuya_core::Role::Admin)?;

        self.db.parked_sales().delete(parked_id).await?;
        self.db
            .audit()
            .log_action(
                &session.user_id,
                "parked.discard",
                "parked_sale",
                parked_id,
                serde_json::json!({}),
            )
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
