//! Merge data sources: records with named fields, loaded by pluggable backends.

pub mod error;
pub mod fixed;
mod input;
pub mod record;
pub mod registry;
pub mod source;
pub mod text;
pub mod vcard;

pub use error::MergeError;
pub use fixed::FixedBackend;
pub use input::STDIN_LOCATOR;
pub use record::{count_selected, eval_key, MergeField, MergeRecord};
pub use registry::{
    backend_descriptions, backends, create, description_to_id, find_backend, register_backend,
    BackendCapabilities, BackendInfo,
};
pub use source::{MergeBackend, MergeSource, SourceType};
pub use text::TextBackend;
pub use vcard::VCardBackend;
