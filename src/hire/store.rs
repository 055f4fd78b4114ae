use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::bids::{self, BidStatus};
use crate::models::gigs::{self, GigStatus};

/// One write step of an atomic unit.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicOp {
    /// Move an open gig to assigned and record the hired freelancer.
    /// Fails the unit unless the gig is still open.
    AssignGig { gig_id: Uuid, freelancer_id: Uuid },
    /// Set one bid's status. Fails the unit unless its status is `expected`.
    SetBidStatus {
        bid_id: Uuid,
        expected: BidStatus,
        status: BidStatus,
    },
    /// Set the status of every bid on a gig except `except`.
    SetSiblingBidStatus {
        gig_id: Uuid,
        except: Uuid,
        status: BidStatus,
    },
}

/// Rows touched by each op of a committed unit, in op order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomicReport {
    pub rows_affected: Vec<u64>,
}

/// Point reads and all-or-nothing writes over gigs and bids.
#[async_trait]
pub trait HireStore: Send + Sync {
    async fn find_bid(&self, id: Uuid) -> Result<Option<bids::Model>, DbErr>;

    async fn find_gig(&self, id: Uuid) -> Result<Option<gigs::Model>, DbErr>;

    /// Apply `ops` in order inside one transaction. Either every op takes
    /// effect or none does.
    async fn run_atomic(&self, ops: &[AtomicOp]) -> Result<AtomicReport, StoreError>;
}

/// [`HireStore`] backed by a SeaORM database transaction.
#[derive(Clone)]
pub struct SeaOrmHireStore {
    db: DatabaseConnection,
}

impl SeaOrmHireStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HireStore for SeaOrmHireStore {
    async fn find_bid(&self, id: Uuid) -> Result<Option<bids::Model>, DbErr> {
        bids::Entity::find_by_id(id).one(&self.db).await
    }

    async fn find_gig(&self, id: Uuid) -> Result<Option<gigs::Model>, DbErr> {
        gigs::Entity::find_by_id(id).one(&self.db).await
    }

    async fn run_atomic(&self, ops: &[AtomicOp]) -> Result<AtomicReport, StoreError> {
        let txn = self.db.begin().await?;
        let mut report = AtomicReport::default();

        for op in ops {
            match apply(&txn, op).await {
                Ok(rows) => report.rows_affected.push(rows),
                Err(e) => {
                    if let Err(rollback) = txn.rollback().await {
                        tracing::warn!("Rollback failed after {e}: {rollback}");
                    }
                    return Err(e);
                }
            }
        }

        txn.commit().await?;
        Ok(report)
    }
}

async fn apply(txn: &DatabaseTransaction, op: &AtomicOp) -> Result<u64, StoreError> {
    match op {
        AtomicOp::AssignGig {
            gig_id,
            freelancer_id,
        } => {
            // Re-checking status in the WHERE clause makes a concurrent hire
            // wait on the row lock and then match nothing.
            let result = gigs::Entity::update_many()
                .col_expr(
                    gigs::Column::Status,
                    Expr::value(GigStatus::Assigned.to_value()),
                )
                .col_expr(gigs::Column::HiredFreelancerId, Expr::value(*freelancer_id))
                .filter(gigs::Column::Id.eq(*gig_id))
                .filter(gigs::Column::Status.eq(GigStatus::Open))
                .exec(txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(StoreError::Precondition(format!("gig {gig_id} is not open")));
            }
            Ok(result.rows_affected)
        }
        AtomicOp::SetBidStatus {
            bid_id,
            expected,
            status,
        } => {
            let result = bids::Entity::update_many()
                .col_expr(bids::Column::Status, Expr::value(status.to_value()))
                .filter(bids::Column::Id.eq(*bid_id))
                .filter(bids::Column::Status.eq(*expected))
                .exec(txn)
                .await?;

            if result.rows_affected == 0 {
                return Err(StoreError::Precondition(format!(
                    "bid {bid_id} is not {}",
                    expected.to_value()
                )));
            }
            Ok(result.rows_affected)
        }
        AtomicOp::SetSiblingBidStatus {
            gig_id,
            except,
            status,
        } => {
            let result = bids::Entity::update_many()
                .col_expr(bids::Column::Status, Expr::value(status.to_value()))
                .filter(bids::Column::GigId.eq(*gig_id))
                .filter(bids::Column::Id.ne(*except))
                .exec(txn)
                .await?;
            Ok(result.rows_affected)
        }
    }
}
