//! Debt domain - amortization schedules and installment payments
//!
//! [`schedule::InstallmentScheduler`] expands a payable into a flat
//! repayment schedule; [`payment::PaymentProcessor`] settles individual
//! installments, keeping the installment row, the parent payable, and the
//! journal in step inside one transaction.

pub mod payment;
pub mod schedule;

pub use payment::{InstallmentSummary, PayInstallment, PaymentProcessor, PaymentReceipt};
pub use schedule::{
    calculate_installments, InstallmentScheduler, InterestType, PlannedInstallment,
    ScheduleRequest,
};
