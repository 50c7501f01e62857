//! Label model: field-substitution text and the label document.

pub mod label;
pub mod text_node;

pub use label::{open_merge, BoxObject, Color, Label, LabelError, LabelFile, LabelObject, MergeSpec, TextObject};
pub use text_node::{
    expand_document, expand_line, expand_lines, parse_document, parse_line_from_text, parse_node,
    TextDocument, TextLine, TextNode,
};
