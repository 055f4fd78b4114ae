use actix_web::{HttpResponse, Responder, web};
use sea_orm::DatabaseConnection;

use crate::auth::middleware::AuthenticatedUser;
use crate::auth::{AuthConfig, jwt, password};
use crate::db::users as user_db;
use crate::models::users::{LoginUser, RegisterUser, UserResponse};

/// Issue a session token for `user` and answer with it set as a cookie.
fn signed_in(
    auth: &AuthConfig,
    user: crate::models::users::Model,
    mut status: actix_web::HttpResponseBuilder,
) -> HttpResponse {
    match jwt::issue_token(user.id, &auth.jwt_secret, auth.token_ttl) {
        Ok(token) => status
            .cookie(auth.session_cookie(token))
            .json(serde_json::json!({ "user": UserResponse::from(user) })),
        Err(e) => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Failed to issue token: {e}"),
        })),
    }
}

/// POST /api/auth/register — create an account and sign it in.
pub async fn register(
    db: web::Data<DatabaseConnection>,
    auth: web::Data<AuthConfig>,
    body: web::Json<RegisterUser>,
) -> impl Responder {
    let RegisterUser {
        name,
        email,
        password: plain,
    } = body.into_inner();
    let email = email.trim().to_lowercase();

    if name.trim().is_empty() || email.is_empty() || plain.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Name, email and password are required",
        }));
    }

    match user_db::get_user_by_email(db.get_ref(), &email).await {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "User already exists",
            }));
        }
        Ok(None) => {}
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    }

    let password_hash = match password::hash(plain).await {
        Ok(h) => h,
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to hash password: {e}"),
            }));
        }
    };

    let inserted = user_db::insert_user(
        db.get_ref(),
        name.trim().to_string(),
        email.clone(),
        password_hash,
    )
    .await;

    match inserted {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User registered");
            signed_in(auth.get_ref(), user, HttpResponse::Created())
        }
        // A concurrent registration can win the unique email index between
        // the check above and the insert.
        Err(e) => match user_db::get_user_by_email(db.get_ref(), &email).await {
            Ok(Some(_)) => {
                tracing::debug!("Duplicate registration lost the race: {e}");
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "User already exists",
                }))
            }
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Failed to create user: {e}"),
            })),
        },
    }
}

/// POST /api/auth/login — check credentials and set the session cookie.
pub async fn login(
    db: web::Data<DatabaseConnection>,
    auth: web::Data<AuthConfig>,
    body: web::Json<LoginUser>,
) -> impl Responder {
    let LoginUser {
        email,
        password: plain,
    } = body.into_inner();
    let email = email.trim().to_lowercase();

    let user = match user_db::get_user_by_email(db.get_ref(), &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid credentials",
            }));
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {e}"),
            }));
        }
    };

    if !password::verify(plain, user.password.clone()).await {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Invalid credentials",
        }));
    }

    signed_in(auth.get_ref(), user, HttpResponse::Ok())
}

/// GET /api/auth/me — return the currently authenticated user's profile.
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "user": UserResponse::from(user.0) }))
}

/// POST /api/auth/logout — expire the session cookie.
pub async fn logout(auth: web::Data<AuthConfig>) -> impl Responder {
    HttpResponse::Ok()
        .cookie(auth.cleared_cookie())
        .json(serde_json::json!({ "message": "Logged out" }))
}
