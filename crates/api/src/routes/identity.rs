//! Registration, login and user account endpoints.

use std::sync::Arc;

use application::requests::{
    ChangePassword, ChangeUserRole, GetCurrentUser, GetUser, ListUsers, Login, RegisterUser,
    SetShippingAddress, UpdateProfile,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use contracts::{
    AddressDto, ChangePasswordRequest, ChangeRoleRequest, LoginRequest, PageQuery, PagedResponse,
    RegisterRequest, TokenResponse, UpdateProfileRequest, UserResponse,
};
use domain::{Role, UserId};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, Auth, address_input, parse_id, parse_name};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users/me", get(me).put(update_me))
        .route("/users/me/password", put(change_password))
        .route("/users/me/address", put(set_address))
        .route("/users", get(list))
        .route("/users/{id}", get(get_one))
        .route("/users/{id}/role", put(change_role))
}

/// POST /auth/register: create a customer account.
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .mediator
        .send(
            actor,
            RegisterUser {
                name: req.name,
                email: req.email,
                password: req.password,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login: exchange credentials for a bearer token.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let session = state
        .mediator
        .send(
            actor,
            Login {
                email: req.email,
                password: req.password,
            },
        )
        .await?;
    Ok(Json(TokenResponse::bearer(
        session.token.token,
        session.token.expires_at,
        UserResponse::from(&session.user),
    )))
}

/// GET /users/me: the caller's account.
#[tracing::instrument(skip_all)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.mediator.send(actor, GetCurrentUser).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /users/me: change the caller's name and email.
#[tracing::instrument(skip_all)]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = actor.require_user()?;
    let user = state
        .mediator
        .send(
            actor,
            UpdateProfile {
                user_id,
                name: req.name,
                email: req.email,
            },
        )
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /users/me/password
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = actor.require_user()?;
    state
        .mediator
        .send(
            actor,
            ChangePassword {
                user_id,
                current_password: req.current_password,
                new_password: req.new_password,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /users/me/address: save the default shipping address.
#[tracing::instrument(skip_all)]
pub async fn set_address(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiJson(req): ApiJson<AddressDto>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = actor.require_user()?;
    let user = state
        .mediator
        .send(
            actor,
            SetShippingAddress {
                user_id,
                address: address_input(req),
            },
        )
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /users: every account, for administrators.
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<PagedResponse<UserResponse>>, ApiError> {
    let users = state
        .mediator
        .send(actor, ListUsers { page: query.page() })
        .await?;
    Ok(Json(PagedResponse::map(users, |user| {
        UserResponse::from(&user)
    })))
}

/// GET /users/{id}
#[tracing::instrument(skip_all)]
pub async fn get_one(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id: UserId = parse_id(&id)?;
    let user = state.mediator.send(actor, GetUser { user_id }).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /users/{id}/role: promote or demote an account.
#[tracing::instrument(skip_all)]
pub async fn change_role(
    State(state): State<Arc<AppState>>,
    Auth(actor): Auth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ChangeRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id: UserId = parse_id(&id)?;
    let role: Role = parse_name("role", &req.role)?;
    let user = state
        .mediator
        .send(actor, ChangeUserRole { user_id, role })
        .await?;
    Ok(Json(UserResponse::from(&user)))
}
