//! API error types with HTTP response mapping.

use application::AppError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contracts::ErrorResponse;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be read (bad JSON, bad path or query).
    #[error("{0}")]
    BadRequest(String),

    /// A request handler failed.
    #[error(transparent)]
    App(#[from] AppError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::App(err) => match err {
                AppError::Validation(_) => StatusCode::BAD_REQUEST,
                AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                AppError::Forbidden(_) => StatusCode::FORBIDDEN,
                AppError::NotFound { .. } => StatusCode::NOT_FOUND,
                AppError::Conflict(_) => StatusCode::CONFLICT,
                AppError::Domain(domain) if domain.is_state_conflict() => StatusCode::CONFLICT,
                AppError::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
                AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::App(AppError::Validation(errors)) => {
                ErrorResponse::new("Validation failed").with_details(errors.fields().clone())
            }
            ApiError::App(err @ (AppError::Store(_) | AppError::Internal(_))) => {
                tracing::error!(error = %err, "internal server error");
                ErrorResponse::new("Internal server error")
            }
            other => ErrorResponse::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::ValidationErrors;
    use domain::{
        DomainError, OrderError, OrderStatus, ProductError, ProductId, ShipmentError,
        ShipmentStatus,
    };

    fn status_of(err: AppError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn request_errors_map_to_statuses() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "is required");
        assert_eq!(status_of(AppError::Validation(errors)), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AppError::Unauthorized("no".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AppError::forbidden()), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AppError::not_found("Order", "42")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Conflict("taken".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn transitions_are_conflicts_and_rules_are_unprocessable() {
        let transition = DomainError::from(OrderError::InvalidStatusTransition {
            current: OrderStatus::Paid,
            action: "cancel",
        });
        assert_eq!(status_of(transition.into()), StatusCode::CONFLICT);

        let transition = DomainError::from(ShipmentError::InvalidStatusTransition {
            current: ShipmentStatus::Delivered,
            action: "ship",
        });
        assert_eq!(status_of(transition.into()), StatusCode::CONFLICT);

        let rule = DomainError::from(ProductError::InsufficientStock {
            product_id: ProductId::new(),
            requested: 5,
            available: 1,
        });
        assert_eq!(status_of(rule.into()), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn bad_requests_are_400() {
        let response = ApiError::BadRequest("Invalid ID".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
