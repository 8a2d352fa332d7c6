//! Request extractors: the calling actor, JSON bodies and query strings.

use std::str::FromStr;
use std::sync::Arc;

use application::{Actor, AddressInput, AppError, ValidationErrors};
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use contracts::AddressDto;
use serde::de::DeserializeOwned;
use shared_kernel::Enumeration;

use crate::AppState;
use crate::error::ApiError;

/// The caller, resolved from an `Authorization: Bearer` header.
///
/// Requests without the header run as [`Actor::Anonymous`]; a header that is
/// present but not a valid token is rejected with 401.
#[derive(Debug, Clone)]
pub struct Auth(pub Actor);

impl FromRequestParts<Arc<AppState>> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Auth(Actor::Anonymous));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Expected a bearer token".to_string())
            })?;

        let actor = state
            .mediator
            .context()
            .tokens
            .verify(token)
            .map_err(AppError::from)?;
        Ok(Auth(actor))
    }
}

/// `Json` that rejects with the API's error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// `Query` that rejects with the API's error body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Parses an identifier taken from the path.
pub fn parse_id<T: FromStr>(id: &str) -> Result<T, ApiError> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid ID format: {id}")))
}

/// Parses an enumeration name, reporting unknown names against `field`.
pub fn parse_name<E: Enumeration>(field: &str, name: &str) -> Result<E, ApiError> {
    E::from_name(name).ok_or_else(|| {
        let mut errors = ValidationErrors::new();
        errors.add(field, format!("must be one of: {}", E::names()));
        ApiError::App(AppError::Validation(errors))
    })
}

pub fn address_input(dto: AddressDto) -> AddressInput {
    AddressInput {
        street: dto.street,
        city: dto.city,
        state: dto.state,
        postal_code: dto.postal_code,
        country: dto.country,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{OrderId, PaymentMethod};

    #[test]
    fn ids_parse_or_reject() {
        let id = OrderId::new();
        assert_eq!(parse_id::<OrderId>(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_id::<OrderId>("not-a-uuid"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn unknown_names_list_the_choices() {
        assert_eq!(
            parse_name::<PaymentMethod>("payment_method", "pix").unwrap(),
            PaymentMethod::Pix
        );

        let Err(ApiError::App(AppError::Validation(errors))) =
            parse_name::<PaymentMethod>("payment_method", "Cash")
        else {
            panic!("expected a validation error");
        };
        let messages = &errors.fields()["payment_method"];
        assert!(messages[0].contains("CreditCard"));
    }
}
