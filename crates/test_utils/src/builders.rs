//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields they care about; the insert helpers seed
//! the rows a database test needs.

use chrono::NaiveDate;
use core_kernel::{BranchId, PayableId};
use domain_debt::{InterestType, ScheduleRequest};
use domain_journal::{CreateJournalEntry, JournalLine, ReferenceType};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use crate::fixtures::{StringFixtures, TemporalFixtures};

/// Builder for seeding chart-of-accounts rows
pub struct TestAccountBuilder {
    id: Uuid,
    code: String,
    name: String,
    account_type: String,
    is_header: bool,
    is_active: bool,
    branch_id: BranchId,
}

impl TestAccountBuilder {
    /// A posting-eligible cash account
    pub fn cash(branch_id: BranchId) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: StringFixtures::cash_account_code().to_string(),
            name: StringFixtures::cash_account_name().to_string(),
            account_type: "asset".to_string(),
            is_header: false,
            is_active: true,
            branch_id,
        }
    }

    /// A posting-eligible trade payable account
    pub fn payable(branch_id: BranchId) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: StringFixtures::payable_account_code().to_string(),
            name: StringFixtures::payable_account_name().to_string(),
            account_type: "liability".to_string(),
            is_header: false,
            is_active: true,
            branch_id,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = account_type.into();
        self
    }

    pub fn header(mut self) -> Self {
        self.is_header = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Inserts the account and returns its id
    pub async fn insert(self, pool: &PgPool) -> Result<Uuid, sqlx::Error> {
        sqlx::query(
            "INSERT INTO accounts (id, code, name, account_type, is_header, is_active, branch_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(self.id)
        .bind(&self.code)
        .bind(&self.name)
        .bind(&self.account_type)
        .bind(self.is_header)
        .bind(self.is_active)
        .bind(self.branch_id.as_uuid())
        .execute(pool)
        .await?;

        Ok(self.id)
    }
}

/// Builder for seeding accounts_payable rows
pub struct TestPayableBuilder {
    id: PayableId,
    supplier_name: String,
    amount: Decimal,
    paid_amount: Decimal,
    status: String,
    branch_id: BranchId,
}

impl TestPayableBuilder {
    pub fn new(branch_id: BranchId) -> Self {
        Self {
            id: PayableId::new(),
            supplier_name: CompanyName().fake(),
            amount: dec!(1000000),
            paid_amount: Decimal::ZERO,
            status: "open".to_string(),
            branch_id,
        }
    }

    pub fn with_supplier(mut self, name: impl Into<String>) -> Self {
        self.supplier_name = name.into();
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_paid(mut self, paid_amount: Decimal, status: impl Into<String>) -> Self {
        self.paid_amount = paid_amount;
        self.status = status.into();
        self
    }

    /// Inserts the payable and returns its id
    pub async fn insert(self, pool: &PgPool) -> Result<PayableId, sqlx::Error> {
        sqlx::query(
            "INSERT INTO accounts_payable (id, supplier_name, amount, paid_amount, status, branch_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(self.id.as_uuid())
        .bind(&self.supplier_name)
        .bind(self.amount)
        .bind(self.paid_amount)
        .bind(&self.status)
        .bind(self.branch_id.as_uuid())
        .execute(pool)
        .await?;

        Ok(self.id)
    }
}

/// Builder for schedule requests
pub struct ScheduleRequestBuilder {
    request: ScheduleRequest,
}

impl ScheduleRequestBuilder {
    pub fn new(debt_id: PayableId, branch_id: BranchId) -> Self {
        Self {
            request: ScheduleRequest {
                debt_id,
                principal: dec!(1000000),
                interest_rate: dec!(12),
                interest_type: InterestType::Flat,
                tenor_months: 10,
                start_date: TemporalFixtures::schedule_start(),
                branch_id,
            },
        }
    }

    pub fn with_principal(mut self, principal: Decimal) -> Self {
        self.request.principal = principal;
        self
    }

    pub fn with_rate(mut self, rate: Decimal, interest_type: InterestType) -> Self {
        self.request.interest_rate = rate;
        self.request.interest_type = interest_type;
        self
    }

    pub fn with_tenor(mut self, months: u32) -> Self {
        self.request.tenor_months = months;
        self
    }

    pub fn with_start(mut self, start_date: NaiveDate) -> Self {
        self.request.start_date = start_date;
        self
    }

    pub fn build(self) -> ScheduleRequest {
        self.request
    }
}

/// Builder for posting-engine inputs
pub struct JournalEntryBuilder {
    entry: CreateJournalEntry,
}

impl JournalEntryBuilder {
    pub fn new(branch_id: BranchId) -> Self {
        Self {
            entry: CreateJournalEntry {
                entry_date: TemporalFixtures::schedule_start(),
                description: StringFixtures::entry_description().to_string(),
                reference_type: ReferenceType::Manual,
                reference_id: None,
                branch_id,
                lines: Vec::new(),
                auto_post: true,
                request_id: None,
            },
        }
    }

    pub fn with_lines(mut self, lines: Vec<JournalLine>) -> Self {
        self.entry.lines = lines;
        self
    }

    pub fn with_reference(mut self, reference_type: ReferenceType, reference_id: Uuid) -> Self {
        self.entry.reference_type = reference_type;
        self.entry.reference_id = Some(reference_id);
        self
    }

    pub fn draft(mut self) -> Self {
        self.entry.auto_post = false;
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.entry.request_id = Some(request_id);
        self
    }

    pub fn build(self) -> CreateJournalEntry {
        self.entry
    }
}
