//! Compliance checks run when a payroll record is generated.

use rust_decimal::Decimal;

use crate::models::{ComplianceCheck, ComplianceStatus};

/// Name of the minimum wage check.
pub const MINIMUM_WAGE_CHECK: &str = "Minimum Wage Compliance";

/// Checks the base salary against the country's minimum wage.
///
/// Returns `None` when the country defines no minimum wage.
pub fn check_minimum_wage(
    base_salary: Decimal,
    minimum_wage: Option<Decimal>,
) -> Option<ComplianceCheck> {
    let minimum = minimum_wage?;

    let check = if base_salary >= minimum {
        ComplianceCheck {
            name: MINIMUM_WAGE_CHECK.to_string(),
            status: ComplianceStatus::Passed,
            message: "Salary meets minimum wage requirements".to_string(),
        }
    } else {
        ComplianceCheck {
            name: MINIMUM_WAGE_CHECK.to_string(),
            status: ComplianceStatus::Failed,
            message: format!(
                "Base salary {} is below the minimum wage of {}",
                base_salary.normalize(),
                minimum.normalize()
            ),
        }
    };

    Some(check)
}
