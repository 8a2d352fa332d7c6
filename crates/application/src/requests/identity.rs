//! Registration, login and user profiles.

use async_trait::async_trait;
use domain::specifications::{AllUsers, UserByEmail};
use domain::{Email, Role, User, UserId};
use shared_kernel::{AggregateRoot, Page, Paged};

use crate::authorization::{Actor, Policy};
use crate::error::{AppError, Result};
use crate::mediator::{Mediator, Request};
use crate::services::IssuedToken;
use crate::session::Session;
use crate::validation::{AddressInput, ValidationErrors};

const MAX_NAME_LEN: usize = 100;

fn validate_profile(errors: &mut ValidationErrors, name: &str, email: &str) {
    errors.require("name", name);
    errors.max_len("name", name, MAX_NAME_LEN);
    errors.email("email", email);
}

/// Fails with `Conflict` if another user already has `email`.
async fn ensure_email_free(session: &Session, email: &Email, except: Option<UserId>) -> Result<()> {
    let existing = session
        .repository::<User>()
        .find_one(&UserByEmail(email.clone()))
        .await?;
    match existing {
        Some(user) if Some(user.id()) != except => Err(AppError::Conflict(format!(
            "Email {email} is already registered"
        ))),
        _ => Ok(()),
    }
}

/// Scope of the unique key held for every registered email.
const EMAIL_KEY: &str = "Email";

#[derive(Clone)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[async_trait]
impl Request for RegisterUser {
    type Response = User;
    const NAME: &'static str = "register_user";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_profile(errors, &self.name, &self.email);
        errors.password("password", &self.password);
    }

    async fn handle(self, session: &mut Session) -> Result<User> {
        let email = Email::parse(&self.email)?;
        ensure_email_free(session, &email, None).await?;

        let hash = session.context().hasher.hash(&self.password);
        let mut user = User::register(&self.name, email, hash, Role::Customer, session.now())?;
        session
            .claim_unique(EMAIL_KEY, user.email().as_str(), user.id().as_uuid())
            .await?;
        session.save(&mut user).await?;

        tracing::info!(user_id = %user.id(), "user registered");
        Ok(user)
    }
}

/// A signed-in user and their token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: IssuedToken,
    pub user: User,
}

#[derive(Clone)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[async_trait]
impl Request for Login {
    type Response = AuthSession;
    const NAME: &'static str = "login";

    fn policy(&self) -> Policy {
        Policy::Public
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.require("email", &self.email);
        errors.require("password", &self.password);
    }

    async fn handle(self, session: &mut Session) -> Result<AuthSession> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let email = Email::parse(&self.email).map_err(|_| invalid())?;
        let user = session
            .repository::<User>()
            .find_one(&UserByEmail(email))
            .await?
            .ok_or_else(invalid)?;

        if !session
            .context()
            .hasher
            .verify(&self.password, user.password_hash())
        {
            return Err(invalid());
        }

        let token = session.context().tokens.issue(user.id(), user.role())?;
        Ok(AuthSession { token, user })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetCurrentUser;

#[async_trait]
impl Request for GetCurrentUser {
    type Response = User;
    const NAME: &'static str = "get_current_user";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<User> {
        let id = session.actor().require_user()?;
        session.load(id).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetUser {
    pub user_id: UserId,
}

#[async_trait]
impl Request for GetUser {
    type Response = User;
    const NAME: &'static str = "get_user";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    async fn handle(self, session: &mut Session) -> Result<User> {
        session.actor().ensure_owner_or_admin(self.user_id)?;
        session.load(self.user_id).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListUsers {
    pub page: Page,
}

#[async_trait]
impl Request for ListUsers {
    type Response = Paged<User>;
    const NAME: &'static str = "list_users";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<Paged<User>> {
        Ok(session.repository::<User>().find(&AllUsers, self.page).await?)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProfile {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

#[async_trait]
impl Request for UpdateProfile {
    type Response = User;
    const NAME: &'static str = "update_profile";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        validate_profile(errors, &self.name, &self.email);
    }

    async fn handle(self, session: &mut Session) -> Result<User> {
        session.actor().ensure_owner_or_admin(self.user_id)?;
        let email = Email::parse(&self.email)?;
        ensure_email_free(session, &email, Some(self.user_id)).await?;

        let mut user: User = session.load(self.user_id).await?;
        if user.email() != &email {
            session.release_unique(EMAIL_KEY, user.email().as_str()).await?;
            session
                .claim_unique(EMAIL_KEY, email.as_str(), user.id().as_uuid())
                .await?;
        }
        user.update_profile(&self.name, email, session.now())?;
        session.save(&mut user).await?;
        Ok(user)
    }
}

/// Changes the caller's own password.
#[derive(Clone)]
pub struct ChangePassword {
    pub user_id: UserId,
    pub current_password: String,
    pub new_password: String,
}

#[async_trait]
impl Request for ChangePassword {
    type Response = ();
    const NAME: &'static str = "change_password";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.require("current_password", &self.current_password);
        errors.password("new_password", &self.new_password);
        errors.check(
            self.current_password != self.new_password,
            "new_password",
            "must differ from the current password",
        );
    }

    async fn handle(self, session: &mut Session) -> Result<()> {
        if session.actor().require_user()? != self.user_id {
            return Err(AppError::forbidden());
        }

        let mut user: User = session.load(self.user_id).await?;
        let hasher = session.context().hasher.clone();
        if !hasher.verify(&self.current_password, user.password_hash()) {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        user.change_password(hasher.hash(&self.new_password), session.now())?;
        session.save(&mut user).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeUserRole {
    pub user_id: UserId,
    pub role: Role,
}

#[async_trait]
impl Request for ChangeUserRole {
    type Response = User;
    const NAME: &'static str = "change_user_role";

    fn policy(&self) -> Policy {
        Policy::Admin
    }

    async fn handle(self, session: &mut Session) -> Result<User> {
        if session.actor().user_id() == Some(self.user_id) && !self.role.is_admin() {
            return Err(AppError::Conflict(
                "Administrators cannot revoke their own role".to_string(),
            ));
        }

        let mut user: User = session.load(self.user_id).await?;
        user.change_role(self.role, session.now());
        session.save(&mut user).await?;
        Ok(user)
    }
}

#[derive(Debug, Clone)]
pub struct SetShippingAddress {
    pub user_id: UserId,
    pub address: AddressInput,
}

#[async_trait]
impl Request for SetShippingAddress {
    type Response = User;
    const NAME: &'static str = "set_shipping_address";

    fn policy(&self) -> Policy {
        Policy::Authenticated
    }

    fn validate(&self, errors: &mut ValidationErrors) {
        errors.address("address", &self.address);
    }

    async fn handle(self, session: &mut Session) -> Result<User> {
        session.actor().ensure_owner_or_admin(self.user_id)?;
        let address = self.address.to_address()?;

        let mut user: User = session.load(self.user_id).await?;
        user.set_shipping_address(address, session.now());
        session.save(&mut user).await?;
        Ok(user)
    }
}

/// Makes sure an administrator account exists for `email`.
///
/// Registers the account if needed and promotes it. Existing accounts keep
/// their password.
pub async fn seed_admin(mediator: &Mediator, name: &str, email: &str, password: &str) -> Result<User> {
    let parsed = Email::parse(email)?;
    let existing = Session::new(mediator.context().clone(), Actor::System)
        .repository::<User>()
        .find_one(&UserByEmail(parsed))
        .await?;

    let user = match existing {
        Some(user) => user,
        None => {
            mediator
                .send(
                    Actor::System,
                    RegisterUser {
                        name: name.to_string(),
                        email: email.to_string(),
                        password: password.to_string(),
                    },
                )
                .await?
        }
    };

    if user.is_admin() {
        return Ok(user);
    }
    mediator
        .send(
            Actor::System,
            ChangeUserRole {
                user_id: user.id(),
                role: Role::Admin,
            },
        )
        .await
}
