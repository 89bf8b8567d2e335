use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, From};
use serde_json::json;

use crate::payroll::{PayrollError, ValidationError};

/// Failures a payroll handler can answer with.
#[derive(Debug, Display, From)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Validation(ValidationError),

    #[display(fmt = "{}", _0)]
    Payroll(PayrollError),

    #[display(fmt = "{}", _0)]
    NotFound(&'static str),

    #[display(fmt = "Internal Server Error")]
    Database(sqlx::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Payroll(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

/// Logs a database failure and wraps it for the response.
pub fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> ApiError {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        ApiError::Database(e)
    }
}
