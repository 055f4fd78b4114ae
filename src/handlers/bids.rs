use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::authorization::verify_gig_owner;
use crate::auth::middleware::AuthenticatedUser;
use crate::cache::CacheData;
use crate::db::bids as bid_db;
use crate::error::{BidError, HireError};
use crate::hire::HireWorkflow;
use crate::models::bids::CreateBid;

/// POST /api/bids — place a bid on an open gig.
///
/// The freelancer is the authenticated caller. Owners cannot bid on their
/// own gigs and nobody can bid once a gig is assigned.
pub async fn create_bid(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CreateBid>,
) -> Result<HttpResponse, BidError> {
    let input = body.into_inner();

    if input.price < 0.0 {
        return Err(BidError::NegativePrice);
    }

    let bid = bid_db::place_bid(db.get_ref(), input, user.0.id)
        .await
        .inspect_err(|e| {
            if let BidError::Db(e) = e {
                tracing::error!(user_id = %user.0.id, "Failed to place bid: {e}");
            }
        })?;

    Ok(HttpResponse::Created().json(bid))
}

/// GET /api/bids/{gig_id} — all bids on a gig (gig owner only).
pub async fn get_bids_for_gig(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let gig_id = path.into_inner();

    if let Err(resp) = verify_gig_owner(db.get_ref(), gig_id, user.0.id).await {
        return resp;
    }

    match bid_db::get_bids_by_gig_id(db.get_ref(), gig_id).await {
        Ok(bids) => HttpResponse::Ok().json(bids),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// PATCH /api/bids/{bid_id}/hire — hire the freelancer behind a bid.
///
/// Assigns the gig, rejects every other bid on it, and pushes a `hired`
/// event to the freelancer if they are connected. Cached gig views are
/// dropped when a cache is configured.
pub async fn hire_bid(
    user: AuthenticatedUser,
    workflow: web::Data<HireWorkflow>,
    cache: Option<web::Data<CacheData>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, HireError> {
    let bid_id = path.into_inner();

    let outcome = workflow.hire(user.0.id, bid_id).await.inspect_err(|e| {
        if e.is_client_error() {
            tracing::debug!(%bid_id, "Hire refused: {e}");
        }
    })?;

    if let Some(cache) = cache {
        cache.invalidate_gig(&outcome.gig_id.to_string()).await;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Freelancer hired successfully",
        "hire": outcome,
    })))
}
