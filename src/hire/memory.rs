use async_trait::async_trait;
use sea_orm::DbErr;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;
use crate::hire::store::{AtomicOp, AtomicReport, HireStore};
use crate::models::bids;
use crate::models::gigs::{self, GigStatus};

#[derive(Debug, Clone, Default)]
struct Tables {
    gigs: HashMap<Uuid, gigs::Model>,
    bids: HashMap<Uuid, bids::Model>,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    /// One-shot: fail the next unit when it reaches this op index.
    fail_at: Option<usize>,
}

/// In-process [`HireStore`]. Units run on a staged copy of the tables which
/// replaces the live copy only after every op succeeded, all under one lock.
#[derive(Debug, Default)]
pub struct MemoryHireStore {
    state: Mutex<State>,
}

impl MemoryHireStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_gig(&self, gig: gigs::Model) {
        self.state.lock().await.tables.gigs.insert(gig.id, gig);
    }

    pub async fn insert_bid(&self, bid: bids::Model) {
        self.state.lock().await.tables.bids.insert(bid.id, bid);
    }

    pub async fn gig(&self, id: Uuid) -> Option<gigs::Model> {
        self.state.lock().await.tables.gigs.get(&id).cloned()
    }

    pub async fn bid(&self, id: Uuid) -> Option<bids::Model> {
        self.state.lock().await.tables.bids.get(&id).cloned()
    }

    /// Bids on a gig, oldest first.
    pub async fn bids_for_gig(&self, gig_id: Uuid) -> Vec<bids::Model> {
        let state = self.state.lock().await;
        let mut bids: Vec<_> = state
            .tables
            .bids
            .values()
            .filter(|b| b.gig_id == gig_id)
            .cloned()
            .collect();
        bids.sort_by_key(|b| b.created_at);
        bids
    }

    /// Make the next unit fail with a database error at op `index`.
    pub async fn fail_at_op(&self, index: usize) {
        self.state.lock().await.fail_at = Some(index);
    }
}

#[async_trait]
impl HireStore for MemoryHireStore {
    async fn find_bid(&self, id: Uuid) -> Result<Option<bids::Model>, DbErr> {
        Ok(self.bid(id).await)
    }

    async fn find_gig(&self, id: Uuid) -> Result<Option<gigs::Model>, DbErr> {
        Ok(self.gig(id).await)
    }

    async fn run_atomic(&self, ops: &[AtomicOp]) -> Result<AtomicReport, StoreError> {
        let mut state = self.state.lock().await;
        let fail_at = state.fail_at.take();
        let mut staged = state.tables.clone();
        let mut report = AtomicReport::default();

        for (index, op) in ops.iter().enumerate() {
            if fail_at == Some(index) {
                return Err(StoreError::Db(DbErr::Custom(format!(
                    "injected fault at op {index}"
                ))));
            }
            report.rows_affected.push(apply(&mut staged, op)?);
        }

        state.tables = staged;
        Ok(report)
    }
}

fn apply(tables: &mut Tables, op: &AtomicOp) -> Result<u64, StoreError> {
    match op {
        AtomicOp::AssignGig {
            gig_id,
            freelancer_id,
        } => match tables.gigs.get_mut(gig_id) {
            Some(gig) if gig.status == GigStatus::Open => {
                gig.status = GigStatus::Assigned;
                gig.hired_freelancer_id = Some(*freelancer_id);
                Ok(1)
            }
            _ => Err(StoreError::Precondition(format!("gig {gig_id} is not open"))),
        },
        AtomicOp::SetBidStatus {
            bid_id,
            expected,
            status,
        } => match tables.bids.get_mut(bid_id) {
            Some(bid) if bid.status == *expected => {
                bid.status = *status;
                Ok(1)
            }
            _ => Err(StoreError::Precondition(format!(
                "bid {bid_id} is not {expected:?}"
            ))),
        },
        AtomicOp::SetSiblingBidStatus {
            gig_id,
            except,
            status,
        } => {
            let mut rows = 0;
            for bid in tables
                .bids
                .values_mut()
                .filter(|b| b.gig_id == *gig_id && b.id != *except)
            {
                bid.status = *status;
                rows += 1;
            }
            Ok(rows)
        }
    }
}

