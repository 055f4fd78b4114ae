//! Hiring: assign a gig to exactly one bidder, reject the rest, tell the
//! freelancer.
//!
//! The database work happens in one atomic unit through a [`HireStore`]. The
//! notification is emitted only after that unit has committed, so nothing
//! the notifier does can affect what was persisted.

pub mod memory;
pub mod store;

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{HireError, StoreError};
use crate::models::bids::{self, BidStatus};
use crate::models::gigs::{self, GigStatus};
use crate::realtime::{Delivery, Notifier, ServerEvent};

pub use memory::MemoryHireStore;
pub use store::{AtomicOp, AtomicReport, HireStore, SeaOrmHireStore};

/// Result of a committed hire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HireOutcome {
    pub gig_id: Uuid,
    pub bid_id: Uuid,
    pub freelancer_id: Uuid,
    /// Sibling bids moved to rejected.
    pub rejected_bids: u64,
    pub notification: Delivery,
}

/// A hire that has been committed and is waiting for its post-commit hook.
#[derive(Debug, Clone)]
struct CommittedHire {
    gig_id: Uuid,
    gig_title: String,
    bid_id: Uuid,
    freelancer_id: Uuid,
    rejected_bids: u64,
}

/// Drives `open -> assigned` for a gig in favor of one bid.
pub struct HireWorkflow {
    store: Arc<dyn HireStore>,
    notifier: Arc<dyn Notifier>,
}

impl HireWorkflow {
    pub fn new(store: Arc<dyn HireStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Hire `bid_id` on behalf of `requester`, who must own the bid's gig.
    ///
    /// Succeeds once the unit commits, whether or not the freelancer is
    /// online to receive the notification.
    pub async fn hire(&self, requester: Uuid, bid_id: Uuid) -> Result<HireOutcome, HireError> {
        let bid = self
            .store
            .find_bid(bid_id)
            .await
            .map_err(HireError::Persistence)?
            .ok_or(HireError::BidNotFound(bid_id))?;

        let gig = self
            .store
            .find_gig(bid.gig_id)
            .await
            .map_err(HireError::Persistence)?
            .ok_or(HireError::GigNotFound(bid.gig_id))?;

        if gig.owner_id != requester {
            return Err(HireError::Forbidden);
        }

        if gig.status == GigStatus::Assigned {
            return Err(HireError::AlreadyAssigned(gig.id));
        }

        let ops = hire_plan(&gig, &bid);
        let report = self.store.run_atomic(&ops).await.map_err(|e| match e {
            StoreError::Precondition(reason) => {
                tracing::info!(gig_id = %gig.id, %bid_id, "Hire lost a race: {reason}");
                HireError::AlreadyAssigned(gig.id)
            }
            StoreError::Db(e) => {
                tracing::error!(gig_id = %gig.id, %bid_id, "Hire transaction failed: {e}");
                HireError::Persistence(e)
            }
        })?;

        let committed = CommittedHire {
            gig_id: gig.id,
            gig_title: gig.title,
            bid_id: bid.id,
            freelancer_id: bid.freelancer_id,
            rejected_bids: report.rows_affected.last().copied().unwrap_or(0),
        };

        tracing::info!(
            gig_id = %committed.gig_id,
            bid_id = %committed.bid_id,
            freelancer_id = %committed.freelancer_id,
            rejected = committed.rejected_bids,
            "Freelancer hired"
        );

        let notification = self.after_commit(&committed).await;

        Ok(HireOutcome {
            gig_id: committed.gig_id,
            bid_id: committed.bid_id,
            freelancer_id: committed.freelancer_id,
            rejected_bids: committed.rejected_bids,
            notification,
        })
    }

    /// Post-commit hook: best-effort notification of the hired freelancer.
    async fn after_commit(&self, hired: &CommittedHire) -> Delivery {
        let event = ServerEvent::hired(&hired.gig_title, hired.freelancer_id);
        self.notifier.notify(hired.freelancer_id, event).await
    }
}

/// The writes that hire `bid` on `gig`. The gig assignment goes first so that
/// a concurrent hire is stopped before it touches any bid.
pub fn hire_plan(gig: &gigs::Model, bid: &bids::Model) -> Vec<AtomicOp> {
    vec![
        AtomicOp::AssignGig {
            gig_id: gig.id,
            freelancer_id: bid.freelancer_id,
        },
        AtomicOp::SetBidStatus {
            bid_id: bid.id,
            expected: BidStatus::Pending,
            status: BidStatus::Hired,
        },
        AtomicOp::SetSiblingBidStatus {
            gig_id: gig.id,
            except: bid.id,
            status: BidStatus::Rejected,
        },
    ]
}
