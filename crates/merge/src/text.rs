//! Delimited text backend (CSV, TSV, colon separated).
//!
//! Parsing follows RFC 4180 section 2 with a few additions:
//! - any character may be escaped with a leading backslash;
//! - `\n` and `\t` decode to newline and tab;
//! - text following a closing quote that is not a delimiter is appended to
//!   the quoted part.
//!
//! A blank line is a record with one empty field.

use crate::error::MergeError;
use crate::input::read_locator;
use crate::record::{MergeField, MergeRecord};
use crate::source::MergeBackend;

#[derive(Debug, Clone)]
pub struct TextBackend {
    delimiter: char,
    line1_has_keys: bool,
    keys: Vec<String>,
    n_fields_max: usize,
    reader: Option<LineReader>,
}

impl TextBackend {
    pub fn new(delimiter: char, line1_has_keys: bool) -> Self {
        Self {
            delimiter,
            line1_has_keys,
            keys: Vec::new(),
            n_fields_max: 0,
            reader: None,
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn line1_has_keys(&self) -> bool {
        self.line1_has_keys
    }

    /// Opens the backend on in-memory text instead of a locator.
    pub fn open_text(&mut self, text: &str) {
        self.keys.clear();
        self.n_fields_max = 0;
        let mut reader = LineReader::new(text);
        if self.line1_has_keys {
            if let Some(header) = reader.parse_line(self.delimiter) {
                self.keys = header;
            }
        }
        self.reader = Some(reader);
    }

    fn key_from_index(&self, index: usize) -> String {
        match self.keys.get(index) {
            Some(key) if self.line1_has_keys => key.clone(),
            _ => (index + 1).to_string(),
        }
    }
}

impl MergeBackend for TextBackend {
    fn open(&mut self, locator: Option<&str>) -> Result<(), MergeError> {
        let text = read_locator(locator)?;
        self.open_text(&text);
        Ok(())
    }

    fn next_record(&mut self) -> Option<MergeRecord> {
        let delimiter = self.delimiter;
        let values = self.reader.as_mut()?.parse_line(delimiter)?;
        self.n_fields_max = self.n_fields_max.max(values.len());
        let fields = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| MergeField {
                key: self.key_from_index(index),
                value,
            })
            .collect();
        Some(MergeRecord::new(fields))
    }

    fn close(&mut self) {
        self.reader = None;
    }

    fn key_list(&self) -> Vec<String> {
        let count = if self.line1_has_keys {
            self.keys.len()
        } else {
            self.n_fields_max
        };
        (0..count).map(|index| self.key_from_index(index)).collect()
    }

    fn primary_key(&self) -> Option<String> {
        Some(self.key_from_index(0))
    }

    fn duplicate(&self) -> Box<dyn MergeBackend> {
        Box::new(Self {
            delimiter: self.delimiter,
            line1_has_keys: self.line1_has_keys,
            keys: self.keys.clone(),
            n_fields_max: self.n_fields_max,
            reader: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Delim,
    Quoted,
    QuotedQuote1,
    QuotedEscaped,
    Simple,
    SimpleEscaped,
}

#[derive(Debug, Clone)]
struct LineReader {
    chars: Vec<char>,
    pos: usize,
}

impl LineReader {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    /// Parses one logical line. `None` once the input is exhausted.
    fn parse_line(&mut self, delimiter: char) -> Option<Vec<String>> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut state = ParseState::Delim;

        loop {
            let ch = self.next_char();
            match state {
                ParseState::Delim => match ch {
                    None => break,
                    Some('\n') => {
                        fields.push(String::new());
                        break;
                    }
                    Some('\r') => {}
                    Some('"') => state = ParseState::Quoted,
                    Some('\\') => state = ParseState::SimpleEscaped,
                    Some(c) if c == delimiter => fields.push(String::new()),
                    Some(c) => {
                        field.push(c);
                        state = ParseState::Simple;
                    }
                },
                ParseState::Quoted => match ch {
                    None => {
                        fields.push(std::mem::take(&mut field));
                        break;
                    }
                    Some('"') => state = ParseState::QuotedQuote1,
                    Some('\\') => state = ParseState::QuotedEscaped,
                    Some(c) => field.push(c),
                },
                ParseState::QuotedQuote1 => match ch {
                    None | Some('\n') => {
                        fields.push(std::mem::take(&mut field));
                        break;
                    }
                    Some('"') => {
                        field.push('"');
                        state = ParseState::Quoted;
                    }
                    Some('\r') => state = ParseState::Simple,
                    Some(c) if c == delimiter => {
                        fields.push(std::mem::take(&mut field));
                        state = ParseState::Delim;
                    }
                    Some(c) => {
                        field.push(c);
                        state = ParseState::Simple;
                    }
                },
                ParseState::QuotedEscaped => match ch {
                    None => {
                        fields.push(std::mem::take(&mut field));
                        break;
                    }
                    Some(c) => {
                        field.push(unescape(c));
                        state = ParseState::Quoted;
                    }
                },
                ParseState::Simple => match ch {
                    None | Some('\n') => {
                        fields.push(std::mem::take(&mut field));
                        break;
                    }
                    Some('\r') => {}
                    Some('\\') => state = ParseState::SimpleEscaped,
                    Some(c) if c == delimiter => {
                        fields.push(std::mem::take(&mut field));
                        state = ParseState::Delim;
                    }
                    Some(c) => field.push(c),
                },
                ParseState::SimpleEscaped => match ch {
                    None => {
                        fields.push(std::mem::take(&mut field));
                        break;
                    }
                    Some(c) => {
                        field.push(unescape(c));
                        state = ParseState::Simple;
                    }
                },
            }
        }

        if fields.is_empty() {
            None
        } else {
            Some(fields)
        }
    }
}

fn unescape(ch: char) -> char {
    match ch {
        'n' => '\n',
        't' => '\t',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(text: &str, delimiter: char) -> Vec<Vec<String>> {
        let mut reader = LineReader::new(text);
        let mut lines = Vec::new();
        while let Some(line) = reader.parse_line(delimiter) {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn parses_simple_and_quoted_fields() {
        let lines = parse_all("a,\"b,c\",d\n\"say \"\"hi\"\"\",e\n", ',');
        assert_eq!(lines, vec![vec!["a", "b,c", "d"], vec!["say \"hi\"", "e"]]);
    }

    #[test]
    fn blank_line_is_one_empty_field() {
        let lines = parse_all("a\n\nb\n", ',');
        assert_eq!(lines, vec![vec!["a"], vec![""], vec!["b"]]);
    }

    #[test]
    fn backslash_escapes_are_decoded() {
        let lines = parse_all("line1\\nline2,tab\\tstop,comma\\,kept\n", ',');
        assert_eq!(lines, vec![vec!["line1\nline2", "tab\tstop", "comma,kept"]]);
    }

    #[test]
    fn text_after_closing_quote_is_appended() {
        let lines = parse_all("\"quoted\"tail,x\n", ',');
        assert_eq!(lines, vec![vec!["quotedtail", "x"]]);
    }

    #[test]
    fn carriage_returns_are_ignored() {
        let lines = parse_all("a,b\r\nc,d\r\n", ',');
        assert_eq!(lines, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn unterminated_quote_truncates_at_end_of_input() {
        let lines = parse_all("\"never closed", ',');
        assert_eq!(lines, vec![vec!["never closed"]]);
    }

    #[test]
    fn empty_fields_between_delimiters() {
        let lines = parse_all("a,,c\n,\n", ',');
        assert_eq!(lines, vec![vec!["a", "", "c"], vec!["", ""]]);
    }

    #[test]
    fn numeric_keys_without_header() {
        let mut backend = TextBackend::new(':', false);
        backend.open_text("x:y:z\nq\n");
        let first = backend.next_record().expect("record");
        assert_eq!(first.get("1"), Some("x"));
        assert_eq!(first.get("3"), Some("z"));
        let second = backend.next_record().expect("record");
        assert_eq!(second.get("1"), Some("q"));
        assert!(backend.next_record().is_none());
        assert_eq!(backend.key_list(), vec!["1", "2", "3"]);
        assert_eq!(backend.primary_key().as_deref(), Some("1"));
    }

    #[test]
    fn header_line_supplies_keys() {
        let mut backend = TextBackend::new('\t', true);
        backend.open_text("Name\tCity\nAda\tLondon\textra\n");
        let record = backend.next_record().expect("record");
        assert_eq!(record.get("Name"), Some("Ada"));
        assert_eq!(record.get("City"), Some("London"));
        assert_eq!(record.get("3"), Some("extra"));
        assert!(record.select_flag);
        assert_eq!(backend.key_list(), vec!["Name", "City"]);
        assert_eq!(backend.primary_key().as_deref(), Some("Name"));
    }

    #[test]
    fn duplicate_copies_configuration_only() {
        let mut backend = TextBackend::new(',', true);
        backend.open_text("k\nv\n");
        let mut copy = backend.duplicate();
        assert_eq!(copy.key_list(), vec!["k"]);
        assert!(copy.next_record().is_none());
    }
}
