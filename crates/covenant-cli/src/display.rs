//! Terminal output for validation results and generation summaries.

use std::path::Path;

use covenant_core::{RecordKind, Violation};

use crate::generate::GenerationReport;

/// Print the outcome of validating one file, one violation per line.
pub fn print_validation(path: &Path, kind: RecordKind, violations: &[Violation]) {
    println!("Validating {} ({kind})", path.display());
    if violations.is_empty() {
        println!("  OK");
        return;
    }
    println!("  FAILED ({} violation(s)):", violations.len());
    for v in violations {
        println!("   - {v}");
    }
}

/// Print per-record violations that stopped a strict generation run.
pub fn print_rejection(worker: &[Violation], contract: &[Violation]) {
    for (kind, violations) in [(RecordKind::Worker, worker), (RecordKind::Contract, contract)] {
        if violations.is_empty() {
            continue;
        }
        println!("{kind} record ({} violation(s)):", violations.len());
        for v in violations {
            println!("   - {v}");
        }
    }
}

/// Print where each document landed and what stayed unresolved.
pub fn print_report(report: &GenerationReport) {
    println!("=== {} ===", report.contract_id);
    for doc in &report.documents {
        println!("  {:<10} {}", doc.kind.as_str(), doc.path.display());
        if !doc.unresolved.is_empty() {
            let names: Vec<&str> = doc.unresolved.iter().map(String::as_str).collect();
            println!("  {:<10} {}", "unresolved", names.join(", "));
        }
    }
}
