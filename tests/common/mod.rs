//! Fixtures shared by the HTTP and socket tests.
#![allow(dead_code)]

use actix_web::web;
use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

use gigmarket_backend::auth::AuthConfig;
use gigmarket_backend::auth::jwt::issue_token;
use gigmarket_backend::models::bids::{self, BidStatus};
use gigmarket_backend::models::gigs::{self, GigStatus};
use gigmarket_backend::models::users;

pub const TEST_SECRET: &str = "test-secret-at-least-256-bits-long-for-hs256-xxxxxxx";

pub fn auth_config() -> web::Data<AuthConfig> {
    web::Data::new(AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl: Duration::from_secs(3600),
        secure_cookies: false,
    })
}

pub fn user(name: &str) -> users::Model {
    users::Model {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        created_at: Utc::now(),
    }
}

pub fn token_for(user: &users::Model) -> String {
    issue_token(user.id, TEST_SECRET, Duration::from_secs(3600)).unwrap()
}

pub fn bearer(user: &users::Model) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user)))
}

pub fn gig(owner_id: Uuid, status: GigStatus) -> gigs::Model {
    gigs::Model {
        id: Uuid::new_v4(),
        owner_id,
        title: "Landing page".to_string(),
        description: "Responsive landing page for a bakery".to_string(),
        budget: 500.0,
        status,
        hired_freelancer_id: None,
        created_at: Utc::now(),
    }
}

pub fn bid(gig_id: Uuid, freelancer_id: Uuid) -> bids::Model {
    bids::Model {
        id: Uuid::new_v4(),
        gig_id,
        freelancer_id,
        message: "I can ship this in a week".to_string(),
        price: 450.0,
        status: BidStatus::Pending,
        created_at: Utc::now(),
    }
}
