//! Label text made of literal fragments and `${key}` field references.

use std::fmt;
use std::str::FromStr;

use rustlabels_merge::{eval_key, MergeRecord};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const FIELD_START: &str = "${";
const FIELD_END: char = '}';

/// 文字片段：字面文字或合併欄位參照。 / One text fragment: literal text or a merge field reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextNode {
    pub field_flag: bool,
    /// Field key when `field_flag` is set, literal text otherwise.
    pub data: String,
}

/// 單行文字的片段序列。 / Fragments of one line, in concatenation order.
pub type TextLine = Vec<TextNode>;

impl TextNode {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            field_flag: false,
            data: text.into(),
        }
    }

    pub fn field(key: impl Into<String>) -> Self {
        Self {
            field_flag: true,
            data: key.into(),
        }
    }

    /// 依據合併資料展開片段。 / Expands the fragment against an optional record.
    ///
    /// Without a record a field renders as its `${key}` placeholder; with one
    /// it renders as the field value, or nothing when the key is absent.
    pub fn expand(&self, record: Option<&MergeRecord>) -> String {
        if !self.field_flag {
            return self.data.clone();
        }
        match record {
            None => format!("{FIELD_START}{}{FIELD_END}", self.data),
            Some(record) => eval_key(record, &self.data).unwrap_or_default().to_string(),
        }
    }

    /// True for a field that resolves to nothing under `record`.
    /// Never true without a record.
    pub fn is_empty_field(&self, record: Option<&MergeRecord>) -> bool {
        match record {
            Some(record) if self.field_flag => eval_key(record, &self.data)
                .map(str::is_empty)
                .unwrap_or(true),
            _ => false,
        }
    }
}

/// 從文字開頭解析一個片段。 / Parses one fragment from the start of `text`.
///
/// Returns the node and the number of bytes consumed. A field runs to the
/// next `}` (consumed) or the end of input; a literal stops before the next
/// `${` or newline. `text` must not start with a newline.
pub fn parse_node(text: &str) -> (TextNode, usize) {
    if let Some(rest) = text.strip_prefix(FIELD_START) {
        return match rest.find(FIELD_END) {
            Some(end) => (
                TextNode::field(&rest[..end]),
                FIELD_START.len() + end + FIELD_END.len_utf8(),
            ),
            None => (TextNode::field(rest), text.len()),
        };
    }

    let end = match (text.find(FIELD_START), text.find('\n')) {
        (Some(field), Some(newline)) => field.min(newline),
        (Some(field), None) => field,
        (None, Some(newline)) => newline,
        (None, None) => text.len(),
    };
    (TextNode::literal(&text[..end]), end)
}

/// 解析一行文字（不含換行符號）。 / Parses fragments up to the next newline or end of input.
///
/// The returned byte count excludes the terminating newline, which is left
/// for the caller. Newlines inside an unterminated or multi-line field key
/// belong to the field.
pub fn parse_line_from_text(text: &str) -> (TextLine, usize) {
    let mut line = TextLine::new();
    let mut consumed = 0;
    while consumed < text.len() && !text[consumed..].starts_with('\n') {
        let (node, used) = parse_node(&text[consumed..]);
        line.push(node);
        consumed += used;
    }
    (line, consumed)
}

/// 多行文字文件。 / A document of text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDocument {
    pub lines: Vec<TextLine>,
}

/// 將文字解析為文件。 / Parses text into lines of fragments.
///
/// A trailing newline closes the last line without starting an empty one.
pub fn parse_document(text: &str) -> TextDocument {
    let mut lines = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let (line, used) = parse_line_from_text(&text[pos..]);
        lines.push(line);
        pos += used;
        if text[pos..].starts_with('\n') {
            pos += 1;
        }
    }
    TextDocument { lines }
}

/// 展開單行。 / Concatenates the expanded fragments of one line.
pub fn expand_line(line: &[TextNode], record: Option<&MergeRecord>) -> String {
    line.iter().map(|node| node.expand(record)).collect()
}

/// 展開整份文件。 / Expands every line, joined by `\n`.
///
/// A line holding a single field that resolves to nothing under `record`
/// is dropped together with its line break.
pub fn expand_document(document: &TextDocument, record: Option<&MergeRecord>) -> String {
    expand_lines(document, record).join("\n")
}

/// Expanded lines of the document, after dropping empty single-field lines.
pub fn expand_lines(document: &TextDocument, record: Option<&MergeRecord>) -> Vec<String> {
    document
        .lines
        .iter()
        .filter(|line| !matches!(line.as_slice(), [node] if node.is_empty_field(record)))
        .map(|line| expand_line(line, record))
        .collect()
}

impl TextDocument {
    pub fn new(lines: Vec<TextLine>) -> Self {
        Self { lines }
    }

    pub fn parse(text: &str) -> Self {
        parse_document(text)
    }

    /// 以佔位字串序列化。 / Serialises with `${key}` placeholders.
    pub fn to_text(&self) -> String {
        expand_document(self, None)
    }

    pub fn expand(&self, record: Option<&MergeRecord>) -> String {
        expand_document(self, record)
    }

    /// Field keys referenced by the document, first occurrence first.
    pub fn field_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for node in self.lines.iter().flatten() {
            if node.field_flag && !keys.contains(&node.data.as_str()) {
                keys.push(&node.data);
            }
        }
        keys
    }

    pub fn has_fields(&self) -> bool {
        self.lines.iter().flatten().any(|node| node.field_flag)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for TextDocument {
    type Err = std::convert::Infallible;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Ok(parse_document(text))
    }
}

impl Serialize for TextDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for TextDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Ok(parse_document(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> MergeRecord {
        MergeRecord::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn parses_fields_and_literals() {
        let (line, consumed) = parse_line_from_text("Dear ${name}, hi\nnext");
        assert_eq!(consumed, 16);
        assert_eq!(
            line,
            vec![
                TextNode::literal("Dear "),
                TextNode::field("name"),
                TextNode::literal(", hi"),
            ]
        );
    }

    #[test]
    fn unterminated_field_runs_to_end_of_input() {
        let (node, consumed) = parse_node("${open\nstill");
        assert_eq!(node, TextNode::field("open\nstill"));
        assert_eq!(consumed, 12);
    }

    #[test]
    fn trailing_newline_does_not_add_a_line() {
        assert_eq!(parse_document("a\n").lines.len(), 1);
        assert_eq!(parse_document("a\n\nb").lines.len(), 3);
        assert_eq!(parse_document("\n").lines, vec![TextLine::new()]);
        assert!(parse_document("").is_empty());
    }

    #[test]
    fn placeholders_without_record() {
        let doc = parse_document("${A}\nplain");
        assert_eq!(expand_document(&doc, None), "${A}\nplain");
    }

    #[test]
    fn empty_single_field_lines_are_suppressed() {
        let missing = record(&[("B", "b")]);
        let blank = record(&[("A", "")]);

        assert_eq!(expand_document(&parse_document("${A}"), Some(&missing)), "");
        assert_eq!(expand_document(&parse_document("x\n${A}"), Some(&missing)), "x");
        assert_eq!(expand_document(&parse_document("${A}\nx"), Some(&blank)), "x");
    }

    #[test]
    fn other_line_shapes_are_always_emitted() {
        let empty = record(&[("A", "")]);
        let doc = parse_document("top\n ${A}\n\n${A}${A}\nend");
        assert_eq!(expand_document(&doc, Some(&empty)), "top\n \n\n\nend");
    }

    #[test]
    fn missing_key_expands_to_empty_string() {
        let doc = parse_document("[${zip}]");
        assert_eq!(doc.expand(Some(&record(&[("name", "Ada")]))), "[]");
    }

    #[test]
    fn serialised_form_reparses_to_the_same_structure() {
        let source = "Name: ${first} ${last}\n${street}\n\nCity: ${city}";
        let doc = parse_document(source);
        assert_eq!(doc.to_text(), source);
        assert_eq!(parse_document(&doc.to_text()), doc);
        assert_eq!(doc.field_keys(), vec!["first", "last", "street", "city"]);
    }

    #[test]
    fn serde_uses_the_text_form() {
        let doc = parse_document("${a}\nb");
        let json = serde_json::to_string(&doc).expect("serialize");
        assert_eq!(json, "\"${a}\\nb\"");
        let back: TextDocument = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, doc);
    }
}
