//! Compensation profile and pay period models.
//!
//! A [`CompensationProfile`] is owned by the employee records subsystem and
//! consumed read-only here; it is snapshotted onto every payroll record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A named allowance paid on top of the base salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    /// Name of the allowance (e.g., "housing").
    pub name: String,
    /// Amount paid per period.
    pub amount: Decimal,
}

/// How an employee is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Transfer to the employee's bank account.
    #[default]
    BankTransfer,
    /// Paper check.
    Check,
    /// Cash payment.
    Cash,
    /// Mobile or digital wallet.
    DigitalWallet,
}

/// Bank account details used for bank transfers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    /// Name of the bank.
    #[serde(default)]
    pub bank_name: Option<String>,
    /// Account number.
    #[serde(default)]
    pub account_number: Option<String>,
    /// SWIFT/BIC code.
    #[serde(default)]
    pub swift_code: Option<String>,
    /// Routing or sort code.
    #[serde(default)]
    pub routing_number: Option<String>,
}

impl BankDetails {
    /// Returns true when an account number is present and non-blank.
    pub fn has_account_number(&self) -> bool {
        self.account_number
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }
}

/// The compensation of one employee for payroll purposes.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{CompensationProfile, PaymentMethod};
/// use rust_decimal::Decimal;
///
/// let profile = CompensationProfile {
///     employee_id: "emp_001".to_string(),
///     country: "US".to_string(),
///     base_salary: Decimal::new(5000, 0),
///     allowances: vec![],
///     currency: "USD".to_string(),
///     payment_method: PaymentMethod::Cash,
///     bank_details: None,
/// };
/// assert_eq!(profile.gross_amount().unwrap(), Decimal::new(5000, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationProfile {
    /// Unique identifier of the employee.
    pub employee_id: String,
    /// Country the employee is paid in.
    pub country: String,
    /// Base salary per period.
    pub base_salary: Decimal,
    /// Allowances paid per period.
    #[serde(default)]
    pub allowances: Vec<Allowance>,
    /// ISO 4217 currency code of the salary.
    pub currency: String,
    /// How the employee is paid.
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Bank account for transfers.
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
}

impl CompensationProfile {
    /// Returns base salary plus all allowances, unrounded.
    ///
    /// Fails with `InvalidInput` when the sum overflows.
    pub fn gross_amount(&self) -> EngineResult<Decimal> {
        self.allowances
            .iter()
            .try_fold(self.base_salary, |total, allowance| {
                total.checked_add(allowance.amount)
            })
            .ok_or_else(|| EngineError::InvalidInput {
                field: "gross".to_string(),
                message: format!(
                    "base salary plus allowances overflows for employee '{}'",
                    self.employee_id
                ),
            })
    }
}

/// A monthly pay period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Calendar month, 1 through 12.
    pub month: u32,
    /// Calendar year.
    pub year: i32,
}

impl PayPeriod {
    /// Earliest year accepted for a pay period.
    pub const MIN_YEAR: i32 = 1970;
    /// Latest year accepted for a pay period.
    pub const MAX_YEAR: i32 = 9999;

    /// Creates a pay period, validating month and year.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::PayPeriod;
    ///
    /// assert!(PayPeriod::new(3, 2026).is_ok());
    /// assert!(PayPeriod::new(13, 2026).is_err());
    /// ```
    pub fn new(month: u32, year: i32) -> EngineResult<Self> {
        let period = Self { month, year };
        period.validate()?;
        Ok(period)
    }

    /// Checks that the month is within 1..=12 and the year is plausible.
    pub fn validate(&self) -> EngineResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(EngineError::InvalidInput {
                field: "month".to_string(),
                message: format!("month must be between 1 and 12, got {}", self.month),
            });
        }
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&self.year) {
            return Err(EngineError::InvalidInput {
                field: "year".to_string(),
                message: format!(
                    "year must be between {} and {}, got {}",
                    Self::MIN_YEAR,
                    Self::MAX_YEAR,
                    self.year
                ),
            });
        }
        Ok(())
    }
}
