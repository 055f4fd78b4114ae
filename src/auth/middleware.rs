use actix_web::FromRequest;
use actix_web::{Error, HttpRequest, dev::Payload, web};
use sea_orm::DatabaseConnection;
use std::future::Future;
use std::pin::Pin;

use crate::auth::{AuthConfig, TOKEN_COOKIE, jwt};
use crate::db::users::get_user_by_id;
use crate::models::users;

pub struct AuthenticatedUser(pub users::Model);

/// The session token from `Authorization: Bearer ...` or the session cookie.
pub fn request_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string()))
}

/// Resolve a session token to the user it was issued for.
pub async fn authenticate(
    token: &str,
    auth: &AuthConfig,
    db: &DatabaseConnection,
) -> Result<users::Model, Error> {
    let claims = jwt::validate_token(token, &auth.jwt_secret)
        .map_err(|e| actix_web::error::ErrorUnauthorized(format!("Invalid token: {e}")))?;

    let user_id = claims
        .user_id()
        .map_err(actix_web::error::ErrorUnauthorized)?;

    get_user_by_id(db, user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Database error: {e}")))?
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("User no longer exists"))
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = request_token(&req)
                .ok_or_else(|| actix_web::error::ErrorUnauthorized("Not authorized, no token"))?;

            let auth = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
                actix_web::error::ErrorInternalServerError("Auth not configured")
            })?;

            let db = req
                .app_data::<web::Data<DatabaseConnection>>()
                .ok_or_else(|| {
                    actix_web::error::ErrorInternalServerError("Database not configured")
                })?;

            let user = authenticate(&token, auth.get_ref(), db.get_ref()).await?;
            Ok(AuthenticatedUser(user))
        })
    }
}
