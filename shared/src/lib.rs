use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A month/year pair identifying one accounting period.
///
/// Periods are the unit of fetching and caching: every list request and every
/// cache bucket is keyed by one of these (or by the "all periods" sentinel,
/// which lives in the client crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    /// The period containing today's date.
    pub fn current() -> Self {
        let now = chrono::Local::now();
        Self {
            month: now.month(),
            year: now.year(),
        }
    }

    /// Render as a reference month string in `YYYY-MM` format.
    pub fn reference_month(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Parse a reference month string in `YYYY-MM` format.
    pub fn from_reference(reference: &str) -> Result<Self, PeriodError> {
        let mut parts = reference.splitn(2, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or(PeriodError::InvalidFormat)?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or(PeriodError::InvalidFormat)?;
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self { month, year })
    }

    /// Derive the period from an ISO `YYYY-MM-DD` date string.
    pub fn from_iso_date(date: &str) -> Result<Self, PeriodError> {
        let prefix = date.get(..7).ok_or(PeriodError::InvalidFormat)?;
        Self::from_reference(prefix)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeriodError {
    InvalidFormat,
    InvalidMonth(u32),
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::InvalidFormat => write!(f, "Invalid period format, expected YYYY-MM"),
            PeriodError::InvalidMonth(month) => write!(f, "Invalid month value: {}", month),
        }
    }
}

impl std::error::Error for PeriodError {}

/// How many rows of a recurring series a mutation affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only the row identified by the request.
    Single,
    /// The identified row and every later row of the same series.
    Future,
    /// The whole series.
    All,
}

/// Kind of commitment, carried on the wire as the backend's literal labels.
///
/// The backend stores free text in this column, so any label it sends that is
/// not recognized deserializes as `Variable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum CommitmentType {
    #[serde(rename = "Fixo")]
    Fixed,
    #[serde(rename = "Variável")]
    Variable,
    #[serde(rename = "Cartão")]
    Card,
}

impl CommitmentType {
    pub fn label(&self) -> &'static str {
        match self {
            CommitmentType::Fixed => "Fixo",
            CommitmentType::Variable => "Variável",
            CommitmentType::Card => "Cartão",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Fixo" => CommitmentType::Fixed,
            "Variável" => CommitmentType::Variable,
            "Cartão" => CommitmentType::Card,
            _ => CommitmentType::Variable,
        }
    }
}

impl From<String> for CommitmentType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl Default for CommitmentType {
    fn default() -> Self {
        CommitmentType::Variable
    }
}

/// An income row as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    /// Server-assigned row identity, unique per entity type.
    pub row_index: u32,
    pub description: String,
    pub amount: f64,
    /// ISO 8601 date (YYYY-MM-DD) the income is expected on.
    pub expected_date: String,
    /// Set once the income has actually been received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_date: Option<String>,
    /// Reference month in YYYY-MM format.
    pub reference_month: String,
}

impl Income {
    pub fn is_received(&self) -> bool {
        self.received_date.is_some()
    }
}

/// An expense row as returned by the backend. No recurrence: mutations affect
/// exactly one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub row_index: u32,
    pub description: String,
    pub category: String,
    pub amount: f64,
    /// ISO 8601 date (YYYY-MM-DD) the expense was paid on.
    pub payment_date: String,
}

/// A commitment row: a fixed or variable monthly obligation, or one
/// installment of a credit-card plan. Recurring rows share a series identity
/// on the backend; mutations carry a [`Scope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    pub row_index: u32,
    pub description: String,
    pub category: String,
    #[serde(rename = "type", default)]
    pub commitment_type: CommitmentType,
    pub amount: f64,
    /// ISO 8601 date (YYYY-MM-DD) the commitment is due on.
    pub due_date: String,
    /// Presence means the commitment has been paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    /// Card name, only meaningful for `Cartão` rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    /// 1-based position within a card installment plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_installments: Option<u32>,
    /// Reference month in YYYY-MM format.
    pub reference_month: String,
}

impl Commitment {
    pub fn is_paid(&self) -> bool {
        self.payment_date.is_some()
    }

    /// Display label for a card installment, e.g. "3/12".
    pub fn installment_label(&self) -> Option<String> {
        match (self.installment, self.total_installments) {
            (Some(current), Some(total)) => Some(format!("{}/{}", current, total)),
            _ => None,
        }
    }
}

/// Aggregated totals for one period, computed server-side per request.
/// Opaque beyond display; never cached per-row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSummary {
    pub total_incomes: f64,
    pub total_expenses: f64,
    pub total_commitments: f64,
    /// Subtotal of incomes already received this month.
    pub received_incomes: f64,
    /// Subtotal of commitments already paid this month.
    pub paid_commitments: f64,
    /// Balance carried over from the previous month.
    pub accumulated_balance: f64,
    /// Years that have any data, for the year selector.
    #[serde(default)]
    pub years: Vec<i32>,
}

impl FullSummary {
    /// Net result of the month itself, before the carried balance.
    pub fn month_balance(&self) -> f64 {
        self.total_incomes - self.total_expenses - self.total_commitments
    }

    /// Month balance including the balance carried from the previous month.
    pub fn projected_balance(&self) -> f64 {
        self.accumulated_balance + self.month_balance()
    }
}

/// Every POST action the backend understands, one variant per action with
/// explicit typed fields. Serialized internally tagged so the body carries
/// the `action` field the backend dispatches on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ApiRequest {
    CreateExpense {
        description: String,
        category: String,
        amount: f64,
        payment_date: String,
    },
    UpdateExpense {
        row_index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        payment_date: Option<String>,
    },
    DeleteExpense {
        row_index: u32,
    },
    CreateIncome {
        description: String,
        amount: f64,
        expected_date: String,
        reference_month: String,
    },
    UpdateIncome {
        row_index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        received_date: Option<String>,
        scope: Scope,
    },
    DeleteIncome {
        row_index: u32,
        scope: Scope,
    },
    CreateCommitment {
        description: String,
        category: String,
        #[serde(rename = "type")]
        commitment_type: CommitmentType,
        amount: f64,
        due_date: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        card: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        total_installments: Option<u32>,
        reference_month: String,
    },
    UpdateCommitment {
        row_index: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        due_date: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        payment_date: Option<String>,
        scope: Scope,
    },
    DeleteCommitment {
        row_index: u32,
        scope: Scope,
    },
}

impl ApiRequest {
    /// The backend action name this request dispatches to.
    pub fn action(&self) -> &'static str {
        match self {
            ApiRequest::CreateExpense { .. } => "createExpense",
            ApiRequest::UpdateExpense { .. } => "updateExpense",
            ApiRequest::DeleteExpense { .. } => "deleteExpense",
            ApiRequest::CreateIncome { .. } => "createIncome",
            ApiRequest::UpdateIncome { .. } => "updateIncome",
            ApiRequest::DeleteIncome { .. } => "deleteIncome",
            ApiRequest::CreateCommitment { .. } => "createCommitment",
            ApiRequest::UpdateCommitment { .. } => "updateCommitment",
            ApiRequest::DeleteCommitment { .. } => "deleteCommitment",
        }
    }
}

/// Maximum accepted description length, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 256;
/// Smallest accepted currency amount.
pub const MIN_AMOUNT: f64 = 0.01;
/// Largest accepted currency amount.
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Client-side validation errors. A failed validation blocks the network
/// call entirely; no cache interaction occurs.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyDescription,
    DescriptionTooLong(usize),
    AmountNotPositive,
    AmountTooLarge,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyDescription => write!(f, "Description must not be empty"),
            ValidationError::DescriptionTooLong(len) => write!(
                f,
                "Description is {} characters, maximum is {}",
                len, MAX_DESCRIPTION_LENGTH
            ),
            ValidationError::AmountNotPositive => {
                write!(f, "Amount must be at least {:.2}", MIN_AMOUNT)
            }
            ValidationError::AmountTooLarge => {
                write!(f, "Amount must be at most {:.2}", MAX_AMOUNT)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    let len = trimmed.chars().count();
    if len > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong(len));
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() || amount < MIN_AMOUNT {
        return Err(ValidationError::AmountNotPositive);
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::AmountTooLarge);
    }
    Ok(())
}
