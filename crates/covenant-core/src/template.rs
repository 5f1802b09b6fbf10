//! `{{identifier}}` placeholder substitution.
//!
//! Not a template language: there are no conditionals, loops, or escapes.
//! Placeholders without a value are left in the output and reported, so a
//! partially filled document can still be written and inspected.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::variables::VariableMap;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("placeholder pattern"));

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Distinct identifiers still wrapped in `{{ }}` after substitution.
    pub unresolved: BTreeSet<String>,
}

impl Rendered {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Replace every `{{key}}` for each key in `vars`, then rescan for leftovers.
///
/// Values are inserted verbatim. A value that itself contains a placeholder
/// gives an order-dependent result.
pub fn render(template: &str, vars: &VariableMap) -> Rendered {
    let mut text = template.to_string();
    for (key, value) in vars.iter() {
        let placeholder = format!("{{{{{key}}}}}");
        if text.contains(&placeholder) {
            text = text.replace(&placeholder, value);
        }
    }

    let unresolved = unresolved_placeholders(&text);
    if !unresolved.is_empty() {
        warn!(
            unresolved = %unresolved.iter().map(String::as_str).collect::<Vec<_>>().join(", "),
            "template has unresolved placeholders"
        );
    }

    Rendered { text, unresolved }
}

/// Distinct identifiers of all `{{...}}` placeholders in `text`.
pub fn unresolved_placeholders(text: &str) -> BTreeSet<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}
