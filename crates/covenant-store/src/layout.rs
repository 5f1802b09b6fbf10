//! On-disk project layout rooted at a base directory.
//!
//! ```text
//! <base>/
//!   config/company.json
//!   templates/<template>.md
//!   outputs/contracts/
//! ```

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    base: PathBuf,
}

impl Layout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.base.join("templates")
    }

    /// Company record used when none is given explicitly.
    pub fn company_path(&self) -> PathBuf {
        self.base.join("config").join("company.json")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.base.join("outputs").join("contracts")
    }
}
