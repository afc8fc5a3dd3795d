//! Journal domain model
//!
//! Value types shared by the resolver and the posting engine: account
//! classification, entry reference/status enums, and the line-set builder
//! used to assemble balanced entries.

use chrono::NaiveDate;
use core_kernel::BranchId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resolver::ResolvedAccount;

/// Classification of a chart-of-accounts entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    /// Canonical name as stored in the `accounts.account_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }

    /// Whether a debit increases this account's balance
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    /// Names accepted by the fuzzy pattern search for this type
    ///
    /// Charts of accounts in the field carry both English and Indonesian
    /// type labels, so the diagnostic search matches either.
    pub fn search_synonyms(&self) -> Vec<String> {
        let names: &[&str] = match self {
            AccountType::Asset => &["asset", "Asset", "Aset", "aset"],
            AccountType::Liability => &["liability", "Liability", "Kewajiban", "kewajiban"],
            AccountType::Equity => &["equity", "Equity", "Modal", "modal"],
            AccountType::Revenue => &["revenue", "Revenue", "Pendapatan", "pendapatan"],
            AccountType::Expense => &["expense", "Expense", "Beban", "beban"],
        };
        names.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The business record a journal entry originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Transaction,
    Expense,
    Payroll,
    Advance,
    Transfer,
    Receivable,
    Payable,
    Manual,
    Adjustment,
    Closing,
    Opening,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Transaction => "transaction",
            ReferenceType::Expense => "expense",
            ReferenceType::Payroll => "payroll",
            ReferenceType::Advance => "advance",
            ReferenceType::Transfer => "transfer",
            ReferenceType::Receivable => "receivable",
            ReferenceType::Payable => "payable",
            ReferenceType::Manual => "manual",
            ReferenceType::Adjustment => "adjustment",
            ReferenceType::Closing => "closing",
            ReferenceType::Opening => "opening",
        }
    }
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a journal entry header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Draft,
    Posted,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Posted => "posted",
        }
    }
}

/// One line of a journal entry, carrying the account snapshot taken at
/// build time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: Uuid,
    pub account_code: String,
    pub account_name: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub description: String,
}

/// Input to [`crate::posting::PostingEngine::post`]
#[derive(Debug, Clone)]
pub struct CreateJournalEntry {
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
    pub branch_id: BranchId,
    pub lines: Vec<JournalLine>,
    /// Post immediately (status `posted`, approval stamped) instead of
    /// leaving the entry in `draft`
    pub auto_post: bool,
    /// Idempotency key; a retry carrying the same id returns the entry
    /// written by the first attempt
    pub request_id: Option<Uuid>,
}

/// Builder for a balanced set of journal lines
///
/// Each call snapshots the resolved account's code and name into the line,
/// so the entry stays readable even if the account is later renamed.
#[derive(Debug, Clone, Default)]
pub struct EntryLines {
    lines: Vec<JournalLine>,
}

impl EntryLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debit(
        mut self,
        account: &ResolvedAccount,
        amount: Decimal,
        memo: impl Into<String>,
    ) -> Self {
        self.lines.push(JournalLine {
            account_id: account.id,
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            debit_amount: amount,
            credit_amount: Decimal::ZERO,
            description: memo.into(),
        });
        self
    }

    pub fn credit(
        mut self,
        account: &ResolvedAccount,
        amount: Decimal,
        memo: impl Into<String>,
    ) -> Self {
        self.lines.push(JournalLine {
            account_id: account.id,
            account_code: account.code.clone(),
            account_name: account.name.clone(),
            debit_amount: Decimal::ZERO,
            credit_amount: amount,
            description: memo.into(),
        });
        self
    }

    pub fn build(self) -> Vec<JournalLine> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(code: &str, name: &str) -> ResolvedAccount {
        ResolvedAccount {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn entry_lines_builder_snapshots_account_fields() {
        let cash = account("1-10001", "Kas");
        let payable = account("2-10100", "Hutang Usaha");

        let lines = EntryLines::new()
            .debit(&payable, dec!(112000), "Angsuran #1 - CV Sumber Rejeki")
            .credit(&cash, dec!(112000), "Angsuran #1 - CV Sumber Rejeki")
            .build();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].account_code, "2-10100");
        assert_eq!(lines[0].debit_amount, dec!(112000));
        assert_eq!(lines[0].credit_amount, Decimal::ZERO);
        assert_eq!(lines[1].account_name, "Kas");
        assert_eq!(lines[1].credit_amount, dec!(112000));
    }

    #[test]
    fn reference_type_round_trips_through_serde() {
        let json = serde_json::to_string(&ReferenceType::Payable).unwrap();
        assert_eq!(json, "\"payable\"");
        assert_eq!(ReferenceType::Payable.as_str(), "payable");
    }

    #[test]
    fn account_type_normal_sides() {
        assert!(AccountType::Asset.is_debit_normal());
        assert!(AccountType::Expense.is_debit_normal());
        assert!(!AccountType::Liability.is_debit_normal());
        assert!(!AccountType::Revenue.is_debit_normal());
        assert!(!AccountType::Equity.is_debit_normal());
    }

    #[test]
    fn liability_synonyms_include_indonesian_label() {
        let names = AccountType::Liability.search_synonyms();
        assert!(names.iter().any(|n| n == "Kewajiban"));
        assert!(names.iter().any(|n| n == "liability"));
    }
}
