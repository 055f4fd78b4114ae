pub mod auth;
pub mod bids;
pub mod gigs;
pub mod realtime;

use actix_web::{HttpResponse, web};

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // ── Auth routes ──
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .route("/me", web::get().to(auth::me))
            .route("/logout", web::post().to(auth::logout)),
    );

    // ── Gig routes (listing and detail are public) ──
    cfg.service(
        web::scope("/gigs")
            .route("", web::get().to(gigs::get_gigs))
            .route("", web::post().to(gigs::create_gig))
            .route("/my-bids", web::get().to(gigs::get_my_bids))
            .route("/{id}", web::get().to(gigs::get_gig))
            .route("/{id}", web::put().to(gigs::update_gig))
            .route("/{id}", web::delete().to(gigs::delete_gig)),
    );

    // ── Bid routes (all protected) ──
    cfg.service(
        web::scope("/bids")
            .route("", web::post().to(bids::create_bid))
            .route("/{gig_id}", web::get().to(bids::get_bids_for_gig))
            .route("/{bid_id}/hire", web::patch().to(bids::hire_bid)),
    );

    // ── Realtime ──
    cfg.service(web::scope("/realtime").route("/ws", web::get().to(realtime::ws_connect)));
}

/// Fallback for unknown routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Route not found",
    }))
}
