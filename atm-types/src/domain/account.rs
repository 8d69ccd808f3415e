//! Account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::money::Money;
use crate::error::{DomainError, ValidationError};

/// Unique identifier for an Account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Creates a new random AccountId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AccountId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AccountId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Who the account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(ValidationError::InvalidField(format!("Unknown role: {other}"))),
        }
    }
}

/// A bank account operated through the machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Account holder name
    pub name: String,
    pub email: String,
    /// Ten-digit mobile number used to log in
    pub mobile: String,
    pub role: Role,
    /// Current balance
    pub balance: Money,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with zero balance.
    ///
    /// # Validation
    /// - Name cannot be empty
    /// - Email must contain `@`
    /// - Mobile must be ten digits
    pub fn new(name: String, email: String, mobile: String, role: Role) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidField("Name cannot be empty".into()).into());
        }
        validate_email(&email)?;
        validate_mobile(&mobile)?;

        Ok(Self {
            id: AccountId::new(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            mobile,
            role,
            balance: Money::zero(),
            created_at: Utc::now(),
        })
    }

    /// Creates an account with all fields specified (for database reconstruction).
    pub fn from_parts(
        id: AccountId,
        name: String,
        email: String,
        mobile: String,
        role: Role,
        balance: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            mobile,
            role,
            balance,
            created_at,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Applies a signed change to the balance; the balance never goes negative.
    pub fn adjust(&mut self, delta: i64) -> Result<Money, DomainError> {
        self.balance = self.balance.apply_delta(delta)?;
        Ok(self.balance)
    }
}

/// Mobile numbers are exactly ten ASCII digits.
pub fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    if mobile.len() != 10 || !mobile.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidField(
            "Mobile number must be 10 digits".into(),
        ));
    }
    Ok(())
}

/// PINs are four to six ASCII digits.
pub fn validate_pin(pin: &str) -> Result<(), ValidationError> {
    if !(4..=6).contains(&pin.len()) || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidField(
            "PIN must be 4 to 6 digits".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidField("Invalid email address".into())),
    }
}
