use sea_orm::*;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::models::gigs::{self, CreateGig, GigDetail, GigStatus, UpdateGig};
use crate::models::users;

/// Insert a new gig. New gigs are always open.
pub async fn insert_gig(
    db: &DatabaseConnection,
    input: CreateGig,
    owner_id: Uuid,
) -> Result<gigs::Model, DbErr> {
    let new_gig = gigs::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner_id),
        title: Set(input.title),
        description: Set(input.description),
        budget: Set(input.budget),
        status: Set(GigStatus::Open),
        hired_freelancer_id: Set(None),
        created_at: Set(chrono::Utc::now()),
    };

    new_gig.insert(db).await
}

/// Fetch open gigs whose title contains `search`, case-insensitively.
pub async fn get_open_gigs(
    db: &DatabaseConnection,
    search: &str,
) -> Result<Vec<gigs::Model>, DbErr> {
    let mut query = gigs::Entity::find().filter(gigs::Column::Status.eq(GigStatus::Open));

    if !search.is_empty() {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        query = query.filter(Expr::cust_with_values(
            r#"LOWER("gigs"."title") LIKE ?"#,
            [pattern],
        ));
    }

    query
        .order_by_desc(gigs::Column::CreatedAt)
        .all(db)
        .await
}

/// Fetch a single gig by ID.
pub async fn get_gig_by_id(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<gigs::Model>, DbErr> {
    gigs::Entity::find_by_id(id).one(db).await
}

/// Fetch a gig together with its hired freelancer, if any.
pub async fn get_gig_detail(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<Option<GigDetail>, DbErr> {
    let Some(gig) = gigs::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let hired_freelancer = match gig.hired_freelancer_id {
        Some(freelancer_id) => users::Entity::find_by_id(freelancer_id)
            .one(db)
            .await?
            .map(Into::into),
        None => None,
    };

    Ok(Some(GigDetail {
        gig,
        hired_freelancer,
    }))
}

/// Update the editable fields of a gig. Status is never touched here.
pub async fn update_gig(
    db: &DatabaseConnection,
    gig: gigs::Model,
    input: UpdateGig,
) -> Result<gigs::Model, DbErr> {
    let mut active: gigs::ActiveModel = gig.into();

    if let Some(title) = input.title.filter(|t| !t.trim().is_empty()) {
        active.title = Set(title);
    }
    if let Some(description) = input.description.filter(|d| !d.trim().is_empty()) {
        active.description = Set(description);
    }
    if let Some(budget) = input.budget {
        active.budget = Set(budget);
    }

    active.update(db).await
}

/// Delete a gig by ID. Its bids go with it (FK cascade).
pub async fn delete_gig(db: &DatabaseConnection, id: Uuid) -> Result<DeleteResult, DbErr> {
    gigs::Entity::delete_by_id(id).exec(db).await
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
