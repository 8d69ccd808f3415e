//! Login outcomes.

use serde::{Deserialize, Serialize};

use super::account::{Account, AccountId, Role};

/// A logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    pub mobile: String,
}

/// A logged-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub id: AccountId,
    pub name: String,
    pub mobile: String,
}

/// What a successful login yields, tagged by `role` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum LoginResult {
    #[serde(rename = "customer")]
    User(UserSession),
    Admin(AdminSession),
}

impl LoginResult {
    pub fn mobile(&self) -> &str {
        match self {
            LoginResult::User(s) => &s.mobile,
            LoginResult::Admin(s) => &s.mobile,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, LoginResult::Admin(_))
    }
}

impl From<&Account> for LoginResult {
    fn from(account: &Account) -> Self {
        match account.role {
            Role::Admin => LoginResult::Admin(AdminSession {
                id: account.id,
                name: account.name.clone(),
                mobile: account.mobile.clone(),
            }),
            Role::Customer => LoginResult::User(UserSession {
                id: account.id,
                name: account.name.clone(),
                email: account.email.clone(),
                mobile: account.mobile.clone(),
            }),
        }
    }
}
