//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Account, AccountId, DenominationCount, DenominationSet, Money, Role, Withdrawal,
};
use crate::error::ValidationError;

// ─────────────────────────────────────────────────────────────────────────────
// Auth DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Login with mobile number and PIN.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "9876543210")]
    pub mobile: String,
    #[schema(example = "1234")]
    pub pin: String,
}

/// Request to open a customer account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Name of the account holder
    #[schema(example = "Asha")]
    pub name: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[schema(example = "9876543210")]
    pub mobile: String,
    #[schema(example = "1234")]
    pub pin: String,
}

/// Request to change the PIN of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePinRequest {
    pub old_pin: String,
    pub new_pin: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Cash DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Notes handed to the machine together with the amount they are claimed to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// Claimed total in rupees
    #[schema(example = 250)]
    pub amount: i64,
    /// Note counts keyed by face value
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"100": 2, "50": 1}))]
    pub denominations: DenominationCount,
}

impl DepositRequest {
    /// Checks the request against the accepted denominations.
    ///
    /// The amount must be positive, every note must be accepted and the notes
    /// must add up to exactly the claimed amount. Nothing is corrected.
    pub fn validate(&self, allowed: &DenominationSet) -> Result<Money, ValidationError> {
        let amount = Money::positive(self.amount)?;
        self.denominations.ensure_within(allowed)?;

        let counted = self.denominations.total_value()?;
        if counted != self.amount {
            return Err(ValidationError::SumMismatch {
                claimed: self.amount,
                counted,
            });
        }
        Ok(amount)
    }
}

/// Request to withdraw cash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawRequest {
    /// Amount in rupees
    #[schema(example = 150)]
    pub amount: i64,
}

/// Balance of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 1000)]
    pub balance: i64,
}

/// Outcome of a withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawResponse {
    /// Balance after the withdrawal
    #[schema(example = 850)]
    pub balance: i64,
    /// Notes handed out
    #[schema(value_type = Object, example = json!({"100": 1, "50": 1}))]
    pub dispensed: DenominationCount,
}

impl From<Withdrawal> for WithdrawResponse {
    fn from(w: Withdrawal) -> Self {
        Self {
            balance: w.balance.amount(),
            dispensed: w.dispensed.without_zeros(),
        }
    }
}

/// Total cash held by the machine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AtmBalanceResponse {
    #[schema(example = 25000)]
    pub atm_balance: i64,
}

/// Notes held by the machine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryResponse {
    #[schema(value_type = Object, example = json!({"50": 10, "100": 20, "200": 10, "500": 40}))]
    pub denominations: DenominationCount,
    #[schema(example = 24500)]
    pub total: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Account DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    /// Unique account identifier
    pub id: AccountId,
    #[schema(example = "Asha")]
    pub name: String,
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[schema(example = "9876543210")]
    pub mobile: String,
    pub role: Role,
    /// Current balance in rupees
    #[schema(example = 1000)]
    pub balance: i64,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            mobile: account.mobile,
            role: account.role,
            balance: account.balance.amount(),
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "PIN changed successfully")]
    pub message: String,
}

/// Identifies the administrator on admin routes (`?adminMobile=`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminQuery {
    #[serde(rename = "adminMobile")]
    pub admin_mobile: String,
}
