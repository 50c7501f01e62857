use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading template definitions.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode template XML: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("invalid length '{0}'")]
    InvalidLength(String),
    #[error("invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: &'static str, value: String },
    #[error("template has neither brand/part nor a name")]
    MissingName,
    #[error("template '{0}' uses paper 'Other' without width/height")]
    MissingPageSize(String),
    #[error("template '{0}' defines no label frame")]
    NoFrame(String),
    #[error("template '{name}' is equivalent to unknown part '{equiv}'")]
    UnknownEquivalent { name: String, equiv: String },
    #[error("template '{0}' not found")]
    NotFound(String),
}
