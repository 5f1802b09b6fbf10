//! Template variables derived from worker, contract, and company records.
//!
//! Derivation builds typed variable sets ([`ContractVariables`],
//! [`NdaVariables`]) and converts them into a flat [`VariableMap`] only at the
//! renderer boundary, so the placeholder names live in exactly one place.

use tracing::debug;

use crate::records::{CompanyRecord, ContractRecord, WorkerRecord};

/// Printed when a contract leaves the work location open ("to be negotiated").
pub const DEFAULT_WORK_LOCATION: &str = "협의";
/// Printed when no payment method is given ("bank transfer").
pub const DEFAULT_PAYMENT_METHOD: &str = "계좌이체";
pub const DEFAULT_NDA_RETENTION_YEARS: u32 = 3;

/// Placeholder names filled for a main contract document, in output order.
pub const CONTRACT_KEYS: [&str; 25] = [
    "contract_id",
    "contract_date",
    "start_date",
    "end_date",
    "work_location",
    "work_description",
    "company_name",
    "company_ceo",
    "company_address",
    "company_registration_number",
    "company_phone",
    "name",
    "rrn",
    "phone",
    "email",
    "address",
    "bank_name",
    "account_number",
    "account_holder",
    "payment_amount",
    "payment_cycle",
    "payment_day",
    "payment_method",
    "tax_rate",
    "net_amount",
];

/// Placeholder names filled for the NDA document, in output order.
pub const NDA_KEYS: [&str; 5] = [
    "contract_date",
    "company_name",
    "name",
    "end_date",
    "retention_years",
];

// ── VariableMap ──

/// Ordered placeholder name → rendered value mapping consumed by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableMap {
    entries: Vec<(String, String)>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value. Overwriting keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// ── Typed variable sets ──

/// Every value a main contract template can reference, already rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractVariables {
    pub contract_id: String,
    pub contract_date: String,
    pub start_date: String,
    pub end_date: String,
    pub work_location: String,
    pub work_description: String,
    pub company_name: String,
    pub company_ceo: String,
    pub company_address: String,
    pub company_registration_number: String,
    pub company_phone: String,
    pub name: String,
    pub rrn: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    pub payment_amount: String,
    pub payment_cycle: String,
    pub payment_day: String,
    pub payment_method: String,
    pub tax_rate: String,
    pub net_amount: String,
}

impl From<ContractVariables> for VariableMap {
    fn from(v: ContractVariables) -> Self {
        let values = [
            v.contract_id,
            v.contract_date,
            v.start_date,
            v.end_date,
            v.work_location,
            v.work_description,
            v.company_name,
            v.company_ceo,
            v.company_address,
            v.company_registration_number,
            v.company_phone,
            v.name,
            v.rrn,
            v.phone,
            v.email,
            v.address,
            v.bank_name,
            v.account_number,
            v.account_holder,
            v.payment_amount,
            v.payment_cycle,
            v.payment_day,
            v.payment_method,
            v.tax_rate,
            v.net_amount,
        ];
        CONTRACT_KEYS.into_iter().zip(values).collect()
    }
}

/// Values referenced by the NDA template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdaVariables {
    pub contract_date: String,
    pub company_name: String,
    pub name: String,
    pub end_date: String,
    pub retention_years: u32,
}

impl From<NdaVariables> for VariableMap {
    fn from(v: NdaVariables) -> Self {
        let values = [
            v.contract_date,
            v.company_name,
            v.name,
            v.end_date,
            v.retention_years.to_string(),
        ];
        NDA_KEYS.into_iter().zip(values).collect()
    }
}

// ── Derivation ──

/// Build the main contract variables.
///
/// Net pay is `gross - gross * (tax_rate / 100)` computed in `f64`; it is
/// truncated to whole currency units only when formatted.
///
/// Amount formatting is fixed: the gross amount goes through
/// [`format_amount`] and keeps any fraction the record carries, net pay
/// through [`format_currency`]. Neither is configurable per company or
/// template.
pub fn derive_contract_variables(
    worker: &WorkerRecord,
    contract: &ContractRecord,
    company: &CompanyRecord,
) -> ContractVariables {
    let terms = &contract.payment;
    let net = net_amount(terms.total_amount, terms.tax_rate);
    debug!(
        contract_id = %contract.contract_id,
        gross = terms.total_amount,
        tax_rate = terms.tax_rate,
        net,
        "derived net amount"
    );

    ContractVariables {
        contract_id: contract.contract_id.clone(),
        contract_date: contract.contract_date.clone(),
        start_date: contract.start_date.clone(),
        end_date: contract.end_date.clone(),
        work_location: contract
            .work_location
            .clone()
            .unwrap_or_else(|| DEFAULT_WORK_LOCATION.to_string()),
        work_description: contract.work_description.clone(),

        company_name: company.company_name.clone(),
        company_ceo: company.company_ceo.clone(),
        company_address: company.company_address.clone(),
        company_registration_number: company.company_registration_number.clone(),
        company_phone: company.company_phone.clone().unwrap_or_default(),

        name: worker.name.clone(),
        rrn: worker.rrn.clone(),
        phone: worker.phone.clone(),
        email: worker.email.clone().unwrap_or_default(),
        address: worker.address.clone(),

        bank_name: worker.bank.name.clone(),
        account_number: worker.bank.account.clone(),
        account_holder: worker.bank.holder.clone(),

        payment_amount: format_amount(terms.total_amount),
        payment_cycle: terms.payment_cycle.label().to_string(),
        payment_day: terms
            .payment_day
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        payment_method: terms
            .method
            .clone()
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
        tax_rate: format_rate(terms.tax_rate),
        net_amount: format_currency(net),
    }
}

/// Build the reduced variable set for the companion NDA.
pub fn derive_nda_variables(
    worker: &WorkerRecord,
    contract: &ContractRecord,
    company: &CompanyRecord,
) -> NdaVariables {
    NdaVariables {
        contract_date: contract.contract_date.clone(),
        company_name: company.company_name.clone(),
        name: worker.name.clone(),
        end_date: contract.end_date.clone(),
        retention_years: company
            .contract_defaults
            .nda_retention_years
            .unwrap_or(DEFAULT_NDA_RETENTION_YEARS),
    }
}

pub fn net_amount(gross: f64, tax_rate: f64) -> f64 {
    gross - gross * (tax_rate / 100.0)
}

/// Render an amount as a thousands-grouped integer, truncating any fraction.
///
/// `1234567.89` → `"1,234,567"`, `-1500` → `"-1,500"`.
pub fn format_currency(amount: f64) -> String {
    let whole = amount.trunc() as i64;
    group_thousands(whole < 0, &whole.unsigned_abs().to_string(), None)
}

/// Render an amount as given, grouping the integer part and keeping any
/// fraction in shortest form.
///
/// `1000000` → `"1,000,000"`, `1000000.5` → `"1,000,000.5"`.
pub fn format_amount(amount: f64) -> String {
    let plain = amount.abs().to_string();
    let (int, frac) = match plain.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (plain.as_str(), None),
    };
    group_thousands(amount < 0.0, int, frac)
}

fn group_thousands(negative: bool, digits: &str, fraction: Option<&str>) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if negative {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Whole rates print without a decimal point (`10`), others in shortest form (`3.3`).
fn format_rate(rate: f64) -> String {
    rate.to_string()
}
