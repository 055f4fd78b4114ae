use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Failures of the hire workflow, mapped one-to-one onto HTTP statuses.
#[derive(Debug, Error)]
pub enum HireError {
    #[error("Bid {0} not found")]
    BidNotFound(Uuid),

    #[error("Gig {0} not found")]
    GigNotFound(Uuid),

    #[error("Only the gig owner can hire a freelancer")]
    Forbidden,

    #[error("Gig {0} is already assigned")]
    AlreadyAssigned(Uuid),

    #[error("Database error: {0}")]
    Persistence(#[source] DbErr),
}

impl HireError {
    /// Client errors are not worth retrying without changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, HireError::Persistence(_))
    }
}

impl ResponseError for HireError {
    fn status_code(&self) -> StatusCode {
        match self {
            HireError::BidNotFound(_) | HireError::GigNotFound(_) => StatusCode::NOT_FOUND,
            HireError::Forbidden => StatusCode::FORBIDDEN,
            HireError::AlreadyAssigned(_) => StatusCode::CONFLICT,
            HireError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

/// Failures of an atomic unit in the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A guarded write matched no row; the unit was rolled back.
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Missing or malformed environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Refusals and failures when placing a bid.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Gig not found")]
    GigNotFound,

    #[error("Cannot bid on assigned gig")]
    GigAssigned,

    #[error("You cannot bid on your own gig")]
    OwnGig,

    #[error("Price cannot be negative")]
    NegativePrice,

    #[error("Failed to create bid: {0}")]
    Db(#[from] DbErr),
}

impl ResponseError for BidError {
    fn status_code(&self) -> StatusCode {
        match self {
            BidError::GigNotFound => StatusCode::NOT_FOUND,
            BidError::GigAssigned | BidError::OwnGig | BidError::NegativePrice => {
                StatusCode::BAD_REQUEST
            }
            BidError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}
