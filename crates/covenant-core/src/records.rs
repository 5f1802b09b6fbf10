//! Input records for contract generation: worker, contract, company, payment.
//!
//! Records are deserialised from JSON by `covenant-store` and are read-only
//! once loaded. Enumerated fields are closed sum types; the payment cycle is
//! the one exception and keeps unknown values verbatim.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Allowed slack between a recorded net amount and `gross - withheld`.
///
/// Absorbs rounding in upstream payroll tools. Fixed, not scaled by amount.
pub const NET_AMOUNT_TOLERANCE: f64 = 1.0;

/// Template used for the companion non-disclosure agreement.
pub const NDA_TEMPLATE: &str = "nda.md";

// ── Enumerations ──

/// Employment relationship of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerType {
    Freelancer,
    DailyWorker,
    Contractor,
}

impl WorkerType {
    pub const ALL: [WorkerType; 3] = [Self::Freelancer, Self::DailyWorker, Self::Contractor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freelancer => "freelancer",
            Self::DailyWorker => "daily_worker",
            Self::Contractor => "contractor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Contract template, selected by exact filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateName {
    #[serde(rename = "freelancer_contract.md")]
    FreelancerContract,
    #[serde(rename = "daily_worker_contract.md")]
    DailyWorkerContract,
    #[serde(rename = "contractor_contract.md")]
    ContractorContract,
}

impl TemplateName {
    pub const ALL: [TemplateName; 3] = [
        Self::FreelancerContract,
        Self::DailyWorkerContract,
        Self::ContractorContract,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::FreelancerContract => "freelancer_contract.md",
            Self::DailyWorkerContract => "daily_worker_contract.md",
            Self::ContractorContract => "contractor_contract.md",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.file_name() == s)
    }
}

/// Lifecycle state of a single payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// How often a contract pays out.
///
/// Unrecognised cycles are kept as [`PaymentCycle::Other`] and rendered
/// verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentCycle {
    Daily,
    Weekly,
    Monthly,
    LumpSum,
    Other(String),
}

impl PaymentCycle {
    /// Label printed in the contract body.
    ///
    /// daily → 일급 (daily wage), weekly → 주급 (weekly wage),
    /// monthly → 월급 (monthly salary), lump_sum → 일시불 (lump sum).
    pub fn label(&self) -> &str {
        match self {
            Self::Daily => "일급",
            Self::Weekly => "주급",
            Self::Monthly => "월급",
            Self::LumpSum => "일시불",
            Self::Other(raw) => raw,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::LumpSum => "lump_sum",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for PaymentCycle {
    fn from(s: String) -> Self {
        match s.as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            "lump_sum" => Self::LumpSum,
            _ => Self::Other(s),
        }
    }
}

impl From<PaymentCycle> for String {
    fn from(cycle: PaymentCycle) -> Self {
        match cycle {
            PaymentCycle::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Day of the pay period, written either as a number (`25`) or free text
/// (`"매월 말일"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentDay {
    Number(i64),
    Text(String),
}

impl fmt::Display for PaymentDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Records ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankInfo {
    pub name: String,
    pub account: String,
    pub holder: String,
}

/// A worker party to the contract.
///
/// Fields that no document prints (`worker_id`, `type`, `tax_rate`) are
/// lenient: absent or out-of-set values decode to `None` and are left to the
/// validation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub worker_id: Option<String>,
    pub name: String,
    /// Resident registration (national ID) number.
    pub rrn: String,
    pub phone: String,
    pub address: String,
    pub email: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_worker_type")]
    pub worker_type: Option<WorkerType>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub tax_rate: Option<f64>,
    pub bank: BankInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTerms {
    pub total_amount: f64,
    pub payment_cycle: PaymentCycle,
    pub tax_rate: f64,
    pub payment_day: Option<PaymentDay>,
    #[serde(alias = "payment_method")]
    pub method: Option<String>,
}

/// A contract between the company and one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub contract_id: String,
    /// Not printed; see [`WorkerRecord`] for the lenient-field convention.
    #[serde(default, deserialize_with = "lenient_string")]
    pub worker_id: Option<String>,
    /// ISO 8601 date string.
    pub contract_date: String,
    pub start_date: String,
    pub end_date: String,
    pub work_location: Option<String>,
    pub work_description: String,
    pub template: TemplateName,
    #[serde(default)]
    pub nda_required: bool,
    pub payment: PaymentTerms,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractDefaults {
    pub nda_retention_years: Option<u32>,
}

/// The contracting company, usually read from `config/company.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_name: String,
    pub company_ceo: String,
    pub company_address: String,
    pub company_registration_number: String,
    pub company_phone: Option<String>,
    #[serde(default)]
    pub contract_defaults: ContractDefaults,
}

/// A single disbursement against a contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub contract_id: String,
    pub worker_id: String,
    pub payment_date: String,
    pub gross_amount: f64,
    pub tax_withheld: f64,
    pub net_amount: f64,
    pub status: PaymentStatus,
}

// ── Lenient fields ──

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.and_then(|v| v.as_str().map(str::to_string)))
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.and_then(|v| v.as_f64()))
}

fn lenient_worker_type<'de, D: Deserializer<'de>>(d: D) -> Result<Option<WorkerType>, D::Error> {
    let raw = Option::<Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(WorkerType::parse))
}

/// Whether `net` agrees with `gross - withheld`, within [`NET_AMOUNT_TOLERANCE`].
pub(crate) fn net_within_tolerance(gross: f64, withheld: f64, net: f64) -> bool {
    (net - (gross - withheld)).abs() <= NET_AMOUNT_TOLERANCE
}
