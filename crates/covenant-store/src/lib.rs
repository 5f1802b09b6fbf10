//! Storage layer: JSON record loading, template lookup, document output.

mod error;
pub use error::StoreError;

pub mod layout;
pub use layout::Layout;

pub mod loader;
pub use loader::{TemplateStore, decode, load_record, load_value};

pub mod sink;
pub use sink::{ArtifactSink, MarkdownSink, sanitize_stem};
