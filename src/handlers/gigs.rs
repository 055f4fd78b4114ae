use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::authorization::verify_gig_owner;
use crate::auth::middleware::AuthenticatedUser;
use crate::cache::{CacheData, keys};
use crate::db::bids as bid_db;
use crate::db::gigs as gig_db;
use crate::models::gigs::{CreateGig, GigDetail, GigSearchQuery, UpdateGig};

/// GET /api/gigs?search= — list open gigs, optionally filtered by title (public).
pub async fn get_gigs(
    db: web::Data<DatabaseConnection>,
    cache: web::Data<CacheData>,
    query: web::Query<GigSearchQuery>,
) -> impl Responder {
    let search = query.term().to_lowercase();
    let key = keys::gig_list(&search);

    match cache.get::<Vec<crate::models::gigs::Model>>(&key).await {
        Ok(Some(gigs)) => return HttpResponse::Ok().json(gigs),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache read failed for {key}: {e}"),
    }

    match gig_db::get_open_gigs(db.get_ref(), &search).await {
        Ok(gigs) => {
            if let Err(e) = cache.set(&key, &gigs, cache.config().gig_list_ttl).await {
                tracing::warn!("Cache write failed for {key}: {e}");
            }
            HttpResponse::Ok().json(gigs)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to fetch gigs: {e}"),
        })),
    }
}

/// GET /api/gigs/{id} — a single gig with its hired freelancer (public).
pub async fn get_gig(
    db: web::Data<DatabaseConnection>,
    cache: web::Data<CacheData>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();
    let key = keys::gig(&id.to_string());

    match cache.get::<GigDetail>(&key).await {
        Ok(Some(detail)) => return HttpResponse::Ok().json(detail),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache read failed for {key}: {e}"),
    }

    match gig_db::get_gig_detail(db.get_ref(), id).await {
        Ok(Some(detail)) => {
            if let Err(e) = cache.set(&key, &detail, cache.config().gig_ttl).await {
                tracing::warn!("Cache write failed for {key}: {e}");
            }
            HttpResponse::Ok().json(detail)
        }
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Gig not found",
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}

/// POST /api/gigs — create a new open gig owned by the caller.
pub async fn create_gig(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<CacheData>,
    body: web::Json<CreateGig>,
) -> impl Responder {
    let input = body.into_inner();
    if input.title.trim().is_empty() || input.budget < 0.0 {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "A title and a non-negative budget are required",
        }));
    }

    match gig_db::insert_gig(db.get_ref(), input, user.0.id).await {
        Ok(gig) => {
            cache.invalidate_gig_lists().await;
            HttpResponse::Created().json(gig)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to create gig: {e}"),
        })),
    }
}

/// PUT /api/gigs/{id} — edit title, description or budget (owner only).
pub async fn update_gig(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<CacheData>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateGig>,
) -> impl Responder {
    let id = path.into_inner();

    let gig = match verify_gig_owner(db.get_ref(), id, user.0.id).await {
        Ok(gig) => gig,
        Err(resp) => return resp,
    };

    match gig_db::update_gig(db.get_ref(), gig, body.into_inner()).await {
        Ok(updated) => {
            cache.invalidate_gig(&id.to_string()).await;
            HttpResponse::Ok().json(updated)
        }
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to update gig: {e}"),
        })),
    }
}

/// DELETE /api/gigs/{id} — delete a gig and its bids (owner only).
pub async fn delete_gig(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    cache: web::Data<CacheData>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();

    if let Err(resp) = verify_gig_owner(db.get_ref(), id, user.0.id).await {
        return resp;
    }

    match gig_db::delete_gig(db.get_ref(), id).await {
        Ok(result) if result.rows_affected > 0 => {
            cache.invalidate_gig(&id.to_string()).await;
            HttpResponse::Ok().json(serde_json::json!({
                "message": "Gig deleted successfully",
            }))
        }
        Ok(_) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Gig not found",
        })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to delete gig: {e}"),
        })),
    }
}

/// GET /api/gigs/my-bids — every bid the caller has placed, with gig titles.
pub async fn get_my_bids(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> impl Responder {
    match bid_db::get_bids_by_freelancer(db.get_ref(), user.0.id).await {
        Ok(bids) => HttpResponse::Ok().json(bids),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        })),
    }
}
