//! Calculation logic for the payroll engine.
//!
//! This module contains the pure payroll calculator: currency rounding,
//! progressive bracket tax, flat statutory deductions with employer
//! contributions, compliance checks, and the [`compute_payroll`] entry
//! point that combines them into a payroll breakdown.

mod compliance;
mod flat_deductions;
mod payroll;
mod progressive_tax;
mod rounding;

pub use compliance::{MINIMUM_WAGE_CHECK, check_minimum_wage};
pub use flat_deductions::{FlatDeductionsResult, calculate_flat_deductions};
pub use payroll::{PayrollBreakdown, TAX_DEDUCTION_NAME, compute_payroll};
pub use progressive_tax::{BracketPortion, ProgressiveTaxResult, calculate_progressive_tax};
pub use rounding::{DEFAULT_MINOR_UNITS, minor_units, round_half_even, round_money};
