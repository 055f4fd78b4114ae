use sea_orm::*;
use uuid::Uuid;

use crate::error::BidError;
use crate::models::bids::{self, BidStatus, BidWithGig, CreateBid};
use crate::models::gigs::{self, GigStatus};

/// Insert a new pending bid for `freelancer_id` on an open gig.
///
/// The gig row is locked for the length of the transaction, so a hire
/// committing concurrently is either seen as `assigned` here or waits
/// until this bid has landed as `pending` and then rejects it.
pub async fn place_bid(
    db: &DatabaseConnection,
    input: CreateBid,
    freelancer_id: Uuid,
) -> Result<bids::Model, BidError> {
    let txn = db.begin().await?;

    // Returning early drops `txn`, which rolls it back.
    let gig = gigs::Entity::find_by_id(input.gig_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or(BidError::GigNotFound)?;

    if gig.status == GigStatus::Assigned {
        return Err(BidError::GigAssigned);
    }
    if gig.owner_id == freelancer_id {
        return Err(BidError::OwnGig);
    }

    let bid = bids::ActiveModel {
        id: Set(Uuid::new_v4()),
        gig_id: Set(input.gig_id),
        freelancer_id: Set(freelancer_id),
        message: Set(input.message),
        price: Set(input.price),
        status: Set(BidStatus::Pending),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(bid)
}

/// Fetch all bids for a gig, oldest first.
pub async fn get_bids_by_gig_id(
    db: &DatabaseConnection,
    gig_id: Uuid,
) -> Result<Vec<bids::Model>, DbErr> {
    bids::Entity::find()
        .filter(bids::Column::GigId.eq(gig_id))
        .order_by_asc(bids::Column::CreatedAt)
        .all(db)
        .await
}

/// Fetch every bid a freelancer has placed, with the target gig's title.
pub async fn get_bids_by_freelancer(
    db: &DatabaseConnection,
    freelancer_id: Uuid,
) -> Result<Vec<BidWithGig>, DbErr> {
    let rows = bids::Entity::find()
        .filter(bids::Column::FreelancerId.eq(freelancer_id))
        .find_also_related(gigs::Entity)
        .order_by_desc(bids::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(bid, gig)| BidWithGig {
            bid,
            gig_title: gig.map(|g| g.title).unwrap_or_else(|| "Deleted Gig".to_string()),
        })
        .collect())
}
