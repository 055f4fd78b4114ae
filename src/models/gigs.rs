use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::users::UserSummary;

/// Gig lifecycle stored as a lowercase string. `Assigned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum GigStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "assigned")]
    Assigned,
}

/// SeaORM entity for the `gigs` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gigs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub budget: f64,
    pub status: GigStatus,
    pub hired_freelancer_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bids::Entity")]
    Bids,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,
}

impl Related<super::bids::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bids.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGig {
    pub title: String,
    pub description: String,
    pub budget: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GigSearchQuery {
    pub search: Option<String>,
}

impl GigSearchQuery {
    /// Trimmed search term; empty means "match everything".
    pub fn term(&self) -> &str {
        self.search.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Gig detail with the hired freelancer resolved, for `GET /api/gigs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GigDetail {
    #[serde(flatten)]
    pub gig: Model,
    pub hired_freelancer: Option<UserSummary>,
}
