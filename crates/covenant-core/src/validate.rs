//! Rule-based validation of raw worker, contract, and payment records.
//!
//! Validation runs over untyped JSON so that missing and mistyped fields can
//! be reported instead of aborting deserialisation. Every rule runs against
//! the same record and appends to one accumulator: a missing `worker_id`
//! still lets the phone and type rules report.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::records::{PaymentStatus, TemplateName, WorkerType, net_within_tolerance};

static WORKER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^W[0-9]{7}$").expect("worker id pattern"));
static CONTRACT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C[0-9]{7}$").expect("contract id pattern"));
static PAYMENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^P[0-9]{7}$").expect("payment id pattern"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^01[0-9]-[0-9]{4}-[0-9]{4}$").expect("phone pattern"));

const DATE_FORMAT: &str = "%Y-%m-%d";

const WORKER_FIELDS: &[&str] = &[
    "worker_id",
    "name",
    "rrn",
    "phone",
    "address",
    "bank",
    "type",
    "tax_rate",
];
const BANK_FIELDS: &[&str] = &["name", "account", "holder"];

const CONTRACT_FIELDS: &[&str] = &[
    "contract_id",
    "worker_id",
    "contract_date",
    "start_date",
    "end_date",
    "work_description",
    "payment",
    "template",
];
const PAYMENT_TERMS_FIELDS: &[&str] = &["total_amount", "payment_cycle", "tax_rate"];

const PAYMENT_FIELDS: &[&str] = &[
    "payment_id",
    "contract_id",
    "worker_id",
    "payment_date",
    "gross_amount",
    "tax_withheld",
    "net_amount",
    "status",
];

/// Which rule set to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Worker,
    Contract,
    Payment,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Contract => "contract",
            Self::Payment => "payment",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed rule. `Display` gives the line shown to users.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    MissingField(String),
    WrongType {
        field: String,
        expected: &'static str,
    },
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    NotAllowed {
        field: &'static str,
        value: String,
        allowed: String,
    },
    StartAfterEnd {
        start: String,
        end: String,
    },
    NonPositiveAmount(f64),
    TaxRateOutOfRange(f64),
    NetAmountMismatch {
        actual: f64,
        expected: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::WrongType { field, expected } => write!(f, "{field} must be {expected}"),
            Self::InvalidFormat {
                field,
                value,
                expected,
            } => write!(f, "{field} has invalid format: {value:?} (expected {expected})"),
            Self::NotAllowed {
                field,
                value,
                allowed,
            } => write!(f, "invalid {field}: {value} (allowed: {allowed})"),
            Self::StartAfterEnd { start, end } => {
                write!(f, "start_date {start} is after end_date {end}")
            }
            Self::NonPositiveAmount(amount) => {
                write!(f, "payment.total_amount must be greater than 0 (got {amount})")
            }
            Self::TaxRateOutOfRange(rate) => {
                write!(f, "payment.tax_rate must be between 0 and 100 (got {rate})")
            }
            Self::NetAmountMismatch { actual, expected } => {
                write!(f, "net_amount mismatch: {actual} != {expected}")
            }
        }
    }
}

impl Violation {
    /// Dotted path of the field the rule concerns.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField(field) | Self::WrongType { field, .. } => field.as_str(),
            Self::InvalidFormat { field, .. } | Self::NotAllowed { field, .. } => *field,
            Self::StartAfterEnd { .. } => "start_date",
            Self::NonPositiveAmount(_) => "payment.total_amount",
            Self::TaxRateOutOfRange(_) => "payment.tax_rate",
            Self::NetAmountMismatch { .. } => "net_amount",
        }
    }
}

/// Apply the rule set for `kind` and return every violation found, in rule
/// order. An empty list means the record is valid.
pub fn validate(kind: RecordKind, record: &Value) -> Vec<Violation> {
    let violations = match kind {
        RecordKind::Worker => validate_worker(record),
        RecordKind::Contract => validate_contract(record),
        RecordKind::Payment => validate_payment(record),
    };
    debug!(kind = %kind, violations = violations.len(), "validated record");
    violations
}

pub fn validate_worker(record: &Value) -> Vec<Violation> {
    let mut out = Vec::new();

    require_fields(record, WORKER_FIELDS, None, &mut out);
    check_pattern(
        record,
        "worker_id",
        &WORKER_ID,
        "'W' + 7 digits, e.g. W2024001",
        &mut out,
    );
    check_pattern(
        record,
        "phone",
        &PHONE,
        "01X-XXXX-XXXX, e.g. 010-1234-5678",
        &mut out,
    );
    if let Some(bank) = record.get("bank") {
        check_nested(bank, "bank", BANK_FIELDS, &mut out);
    }
    check_member(record, "type", |s| WorkerType::parse(s).is_some(), worker_types, &mut out);

    out
}

pub fn validate_contract(record: &Value) -> Vec<Violation> {
    let mut out = Vec::new();

    require_fields(record, CONTRACT_FIELDS, None, &mut out);
    check_pattern(
        record,
        "contract_id",
        &CONTRACT_ID,
        "'C' + 7 digits, e.g. C2024001",
        &mut out,
    );
    check_pattern(
        record,
        "worker_id",
        &WORKER_ID,
        "'W' + 7 digits, e.g. W2024001",
        &mut out,
    );
    check_date_order(record, &mut out);
    if let Some(payment) = record.get("payment") {
        check_payment_terms(payment, &mut out);
    }
    check_member(
        record,
        "template",
        |s| TemplateName::parse(s).is_some(),
        template_names,
        &mut out,
    );

    out
}

pub fn validate_payment(record: &Value) -> Vec<Violation> {
    let mut out = Vec::new();

    require_fields(record, PAYMENT_FIELDS, None, &mut out);
    check_pattern(
        record,
        "payment_id",
        &PAYMENT_ID,
        "'P' + 7 digits, e.g. P2024001",
        &mut out,
    );
    check_net_amount(record, &mut out);
    check_member(
        record,
        "status",
        |s| PaymentStatus::parse(s).is_some(),
        payment_statuses,
        &mut out,
    );

    out
}

// ── Rules ──

fn require_fields(record: &Value, fields: &[&str], prefix: Option<&str>, out: &mut Vec<Violation>) {
    for &field in fields {
        if record.get(field).is_none() {
            let path = match prefix {
                Some(p) => format!("{p}.{field}"),
                None => field.to_string(),
            };
            out.push(Violation::MissingField(path));
        }
    }
}

fn check_nested(value: &Value, name: &str, fields: &[&str], out: &mut Vec<Violation>) {
    if value.is_object() {
        require_fields(value, fields, Some(name), out);
    } else {
        out.push(Violation::WrongType {
            field: name.to_string(),
            expected: "an object",
        });
    }
}

fn check_pattern(
    record: &Value,
    field: &'static str,
    pattern: &Regex,
    expected: &'static str,
    out: &mut Vec<Violation>,
) {
    let Some(value) = record.get(field) else {
        return;
    };
    match value.as_str() {
        Some(s) if pattern.is_match(s) => {}
        Some(s) => out.push(Violation::InvalidFormat {
            field,
            value: s.to_string(),
            expected,
        }),
        None => out.push(Violation::WrongType {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

fn check_member(
    record: &Value,
    field: &'static str,
    is_member: impl Fn(&str) -> bool,
    allowed: fn() -> String,
    out: &mut Vec<Violation>,
) {
    let Some(value) = record.get(field) else {
        return;
    };
    let accepted = value.as_str().is_some_and(&is_member);
    if !accepted {
        let value = match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        };
        out.push(Violation::NotAllowed {
            field,
            value,
            allowed: allowed(),
        });
    }
}

fn check_date_order(record: &Value, out: &mut Vec<Violation>) {
    let (Some(start), Some(end)) = (record.get("start_date"), record.get("end_date")) else {
        return;
    };
    match (start.as_str(), end.as_str()) {
        (Some(start), Some(end)) => {
            if starts_after_end(start, end) {
                out.push(Violation::StartAfterEnd {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        (start_str, end_str) => {
            for (field, s) in [("start_date", start_str), ("end_date", end_str)] {
                if s.is_none() {
                    out.push(Violation::WrongType {
                        field: field.to_string(),
                        expected: "a date string",
                    });
                }
            }
        }
    }
}

/// Chronological comparison when both sides are `YYYY-MM-DD`, lexical otherwise.
fn starts_after_end(start: &str, end: &str) -> bool {
    match (
        NaiveDate::parse_from_str(start, DATE_FORMAT),
        NaiveDate::parse_from_str(end, DATE_FORMAT),
    ) {
        (Ok(s), Ok(e)) => s > e,
        _ => start > end,
    }
}

fn check_payment_terms(payment: &Value, out: &mut Vec<Violation>) {
    if !payment.is_object() {
        out.push(Violation::WrongType {
            field: "payment".to_string(),
            expected: "an object",
        });
        return;
    }
    require_fields(payment, PAYMENT_TERMS_FIELDS, Some("payment"), out);

    if let Some(amount) = payment.get("total_amount") {
        match amount.as_f64() {
            Some(v) if v > 0.0 => {}
            Some(v) => out.push(Violation::NonPositiveAmount(v)),
            None => out.push(number_expected("payment.total_amount")),
        }
    }
    if let Some(rate) = payment.get("tax_rate") {
        match rate.as_f64() {
            Some(v) if (0.0..=100.0).contains(&v) => {}
            Some(v) => out.push(Violation::TaxRateOutOfRange(v)),
            None => out.push(number_expected("payment.tax_rate")),
        }
    }
}

fn check_net_amount(record: &Value, out: &mut Vec<Violation>) {
    let (Some(gross), Some(withheld), Some(net)) = (
        record.get("gross_amount"),
        record.get("tax_withheld"),
        record.get("net_amount"),
    ) else {
        return;
    };
    match (gross.as_f64(), withheld.as_f64(), net.as_f64()) {
        (Some(gross), Some(withheld), Some(net)) => {
            if !net_within_tolerance(gross, withheld, net) {
                out.push(Violation::NetAmountMismatch {
                    actual: net,
                    expected: gross - withheld,
                });
            }
        }
        (g, w, n) => {
            for (field, v) in [("gross_amount", g), ("tax_withheld", w), ("net_amount", n)] {
                if v.is_none() {
                    out.push(number_expected(field));
                }
            }
        }
    }
}

fn number_expected(field: &str) -> Violation {
    Violation::WrongType {
        field: field.to_string(),
        expected: "a number",
    }
}

// ── Allowed-value listings ──

fn worker_types() -> String {
    join(WorkerType::ALL.iter().map(|t| t.as_str()))
}

fn template_names() -> String {
    join(TemplateName::ALL.iter().map(|t| t.file_name()))
}

fn payment_statuses() -> String {
    join(PaymentStatus::ALL.iter().map(|t| t.as_str()))
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}
