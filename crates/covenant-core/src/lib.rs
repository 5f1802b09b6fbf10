//! Core of Covenant: input records, validation rules, variable derivation,
//! and placeholder rendering. Everything here is pure; I/O lives in
//! `covenant-store` and the CLI.

pub mod records;
pub mod template;
pub mod validate;
pub mod variables;

pub use records::{
    BankInfo, CompanyRecord, ContractDefaults, ContractRecord, NDA_TEMPLATE,
    NET_AMOUNT_TOLERANCE, PaymentCycle, PaymentDay, PaymentRecord, PaymentStatus, PaymentTerms,
    TemplateName, WorkerRecord, WorkerType,
};
pub use template::{Rendered, render, unresolved_placeholders};
pub use validate::{RecordKind, Violation, validate};
pub use variables::{
    ContractVariables, NdaVariables, VariableMap, derive_contract_variables, derive_nda_variables,
    format_amount, format_currency,
};
