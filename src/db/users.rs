use sea_orm::*;
use uuid::Uuid;

use crate::models::users;

/// Insert a new user. `password_hash` must already be a PHC string.
pub async fn insert_user(
    db: &DatabaseConnection,
    name: String,
    email: String,
    password_hash: String,
) -> Result<users::Model, DbErr> {
    let new_user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        email: Set(email),
        password: Set(password_hash),
        created_at: Set(chrono::Utc::now()),
    };

    new_user.insert(db).await
}

/// Fetch a single user by ID.
pub async fn get_user_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find_by_id(id).one(db).await
}

/// Fetch a user by email (emails are stored lowercased).
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
}
