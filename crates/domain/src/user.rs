//! User aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_kernel::{AggregateRoot, DomainEvent, Enumeration, Version};
use thiserror::Error;

use crate::{Address, Email, UserId};

/// Longest accepted display name.
pub const MAX_NAME_LEN: usize = 100;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    /// Name is blank.
    #[error("User name is required")]
    NameRequired,

    /// Name is longer than [`MAX_NAME_LEN`].
    #[error("User name must be at most 100 characters")]
    NameTooLong,

    /// Password hash is blank.
    #[error("Password hash is required")]
    PasswordHashRequired,
}

/// Role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    /// Returns true for administrators.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Enumeration for Role {
    fn all() -> &'static [Self] {
        &[Role::Customer, Role::Admin]
    }

    fn id(&self) -> i32 {
        match self {
            Role::Customer => 1,
            Role::Admin => 2,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Events raised by the user aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UserEvent {
    Registered {
        user_id: UserId,
        email: Email,
        role: Role,
    },
    ProfileUpdated {
        user_id: UserId,
        name: String,
        email: Email,
    },
    PasswordChanged {
        user_id: UserId,
    },
    RoleChanged {
        user_id: UserId,
        old_role: Role,
        new_role: Role,
    },
    ShippingAddressChanged {
        user_id: UserId,
        address: Address,
    },
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Registered { .. } => "UserRegistered",
            UserEvent::ProfileUpdated { .. } => "UserProfileUpdated",
            UserEvent::PasswordChanged { .. } => "UserPasswordChanged",
            UserEvent::RoleChanged { .. } => "UserRoleChanged",
            UserEvent::ShippingAddressChanged { .. } => "UserShippingAddressChanged",
        }
    }
}

/// A registered customer or administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    name: String,
    email: Email,
    password_hash: String,
    role: Role,
    shipping_address: Option<Address>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    version: Version,
    #[serde(skip)]
    events: Vec<UserEvent>,
}

fn validate_name(name: &str) -> Result<String, UserError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::NameRequired);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(UserError::NameTooLong);
    }
    Ok(name.to_string())
}

impl User {
    /// Registers a new user. Email uniqueness is the caller's concern.
    pub fn register(
        name: &str,
        email: Email,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let name = validate_name(name)?;
        if password_hash.is_empty() {
            return Err(UserError::PasswordHashRequired);
        }

        let id = UserId::new();
        Ok(Self {
            id,
            name,
            email: email.clone(),
            password_hash,
            role,
            shipping_address: None,
            created_at: now,
            updated_at: now,
            version: Version::initial(),
            events: vec![UserEvent::Registered {
                user_id: id,
                email,
                role,
            }],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn shipping_address(&self) -> Option<&Address> {
        self.shipping_address.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Changes name and email.
    pub fn update_profile(
        &mut self,
        name: &str,
        email: Email,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        let name = validate_name(name)?;
        self.name = name.clone();
        self.email = email.clone();
        self.updated_at = now;
        self.events.push(UserEvent::ProfileUpdated {
            user_id: self.id,
            name,
            email,
        });
        Ok(())
    }

    /// Replaces the stored password hash.
    pub fn change_password(
        &mut self,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        if password_hash.is_empty() {
            return Err(UserError::PasswordHashRequired);
        }
        self.password_hash = password_hash;
        self.updated_at = now;
        self.events
            .push(UserEvent::PasswordChanged { user_id: self.id });
        Ok(())
    }

    /// Changes the role. Setting the current role again is a no-op.
    pub fn change_role(&mut self, role: Role, now: DateTime<Utc>) {
        if self.role == role {
            return;
        }
        let old_role = self.role;
        self.role = role;
        self.updated_at = now;
        self.events.push(UserEvent::RoleChanged {
            user_id: self.id,
            old_role,
            new_role: role,
        });
    }

    /// Sets the default shipping address.
    pub fn set_shipping_address(&mut self, address: Address, now: DateTime<Utc>) {
        self.shipping_address = Some(address.clone());
        self.updated_at = now;
        self.events.push(UserEvent::ShippingAddressChanged {
            user_id: self.id,
            address,
        });
    }
}

impl AggregateRoot for User {
    type Id = UserId;
    type Event = UserEvent;

    fn aggregate_type() -> &'static str {
        "User"
    }

    fn id(&self) -> UserId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn take_events(&mut self) -> Vec<UserEvent> {
        std::mem::take(&mut self.events)
    }
}
