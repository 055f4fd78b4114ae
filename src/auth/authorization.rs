use actix_web::HttpResponse;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::db::gigs as gig_db;
use crate::models::gigs;

/// Load a gig and check that `user_id` owns it.
pub async fn verify_gig_owner(
    db: &DatabaseConnection,
    gig_id: Uuid,
    user_id: Uuid,
) -> Result<gigs::Model, HttpResponse> {
    match gig_db::get_gig_by_id(db, gig_id).await {
        Ok(Some(gig)) if gig.owner_id == user_id => Ok(gig),
        Ok(Some(_)) => Err(HttpResponse::Forbidden().json(serde_json::json!({
            "error": "Forbidden",
        }))),
        Ok(None) => Err(HttpResponse::NotFound().json(serde_json::json!({
            "error": "Gig not found",
        }))),
        Err(e) => Err(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {e}"),
        }))),
    }
}
