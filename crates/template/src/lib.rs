//! Label templates: sheet geometry, paper sizes and the XML template database.

pub mod db;
pub mod error;
pub mod frame;
pub mod paper;
pub mod template;
pub mod units;
mod xml;

pub use db::TemplateDb;
pub use error::TemplateError;
pub use frame::{Frame, FrameShape, Layout, Origin, Outline, OutlineKind};
pub use paper::{find_paper, Paper, PAPERS, PAPER_ID_OTHER};
pub use template::{Template, TemplateGeometry};
pub use units::{parse_length, Units};
