//! vCard file backend.
//!
//! Each `BEGIN:VCARD` .. `END:VCARD` block becomes one record. Properties are
//! mapped onto a fixed set of human-readable keys; lines outside a block are
//! skipped.

use std::collections::VecDeque;

use crate::error::MergeError;
use crate::input::read_locator;
use crate::record::{MergeField, MergeRecord};
use crate::source::MergeBackend;

pub const KEY_FILE_AS: &str = "File As";
pub const KEY_FULL_NAME: &str = "Full Name";
pub const KEY_GIVEN_NAME: &str = "Given Name";
pub const KEY_FAMILY_NAME: &str = "Family Name";
pub const KEY_ORGANIZATION: &str = "Organization";
pub const KEY_TITLE: &str = "Title";
pub const KEY_EMAIL: &str = "Email";
pub const KEY_HOME_PHONE: &str = "Home Phone";
pub const KEY_BUSINESS_PHONE: &str = "Business Phone";
pub const KEY_MOBILE_PHONE: &str = "Mobile Phone";
pub const KEY_STREET: &str = "Street";
pub const KEY_CITY: &str = "City";
pub const KEY_REGION: &str = "State/Province";
pub const KEY_POSTAL_CODE: &str = "ZIP/Postal Code";
pub const KEY_COUNTRY: &str = "Country";
pub const KEY_NOTE: &str = "Note";

/// Keys in the order they appear in every record.
pub const VCARD_KEYS: [&str; 16] = [
    KEY_FILE_AS,
    KEY_FULL_NAME,
    KEY_GIVEN_NAME,
    KEY_FAMILY_NAME,
    KEY_ORGANIZATION,
    KEY_TITLE,
    KEY_EMAIL,
    KEY_HOME_PHONE,
    KEY_BUSINESS_PHONE,
    KEY_MOBILE_PHONE,
    KEY_STREET,
    KEY_CITY,
    KEY_REGION,
    KEY_POSTAL_CODE,
    KEY_COUNTRY,
    KEY_NOTE,
];

#[derive(Debug, Clone, Default)]
pub struct VCardBackend {
    pending: VecDeque<MergeRecord>,
}

impl VCardBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the backend on in-memory vCard text.
    pub fn open_text(&mut self, text: &str) {
        self.pending = split_cards(text)
            .iter()
            .filter_map(|card| card_to_record(card))
            .collect();
    }
}

impl MergeBackend for VCardBackend {
    fn open(&mut self, locator: Option<&str>) -> Result<(), MergeError> {
        let text = read_locator(locator)?;
        self.open_text(&text);
        Ok(())
    }

    fn next_record(&mut self) -> Option<MergeRecord> {
        self.pending.pop_front()
    }

    fn close(&mut self) {
        self.pending.clear();
    }

    fn key_list(&self) -> Vec<String> {
        VCARD_KEYS.iter().map(|key| key.to_string()).collect()
    }

    fn primary_key(&self) -> Option<String> {
        Some(KEY_FILE_AS.to_string())
    }

    fn duplicate(&self) -> Box<dyn MergeBackend> {
        Box::new(Self::new())
    }
}

/// Splits the input into unfolded content lines, one vector per card.
fn split_cards(text: &str) -> Vec<Vec<String>> {
    let mut cards = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(card) = current.as_mut() {
            if line.to_ascii_uppercase().starts_with("END:VCARD") {
                if let Some(card) = current.take() {
                    cards.push(card);
                }
                continue;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(last) = card.last_mut() {
                    last.push_str(&line[1..]);
                }
                continue;
            }
            card.push(line.to_string());
        } else if line.to_ascii_uppercase().starts_with("BEGIN:VCARD") {
            current = Some(Vec::new());
        }
    }

    // A final card missing its END line is still read.
    if let Some(card) = current {
        cards.push(card);
    }
    cards
}

struct Property<'a> {
    name: String,
    params: Vec<String>,
    value: &'a str,
}

fn parse_property(line: &str) -> Option<Property<'_>> {
    let (head, value) = line.split_once(':')?;
    let mut parts = head.split(';');
    let name = parts.next()?;
    // Drop group prefixes such as "item1.EMAIL".
    let name = name.rsplit('.').next().unwrap_or(name).to_ascii_uppercase();
    let params = parts.map(|param| param.to_ascii_uppercase()).collect();
    Some(Property {
        name,
        params,
        value,
    })
}

fn has_type(params: &[String], wanted: &str) -> bool {
    params.iter().any(|param| {
        let types = param.strip_prefix("TYPE=").unwrap_or(param);
        types.split(',').any(|ty| ty == wanted)
    })
}

fn unescape_value(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => output.push('\n'),
            Some(other) => output.push(other),
            None => output.push('\\'),
        }
    }
    output
}

/// Splits a structured value on unescaped `;`.
fn split_components(value: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            current.push('\\');
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == ';' {
            components.push(unescape_value(&current));
            current.clear();
        } else {
            current.push(ch);
        }
    }
    components.push(unescape_value(&current));
    components
}

fn card_to_record(lines: &[String]) -> Option<MergeRecord> {
    let mut values: Vec<(&'static str, String)> = Vec::new();
    let mut set = |key: &'static str, value: String| {
        if !value.is_empty() && !values.iter().any(|(existing, _)| *existing == key) {
            values.push((key, value));
        }
    };

    for line in lines {
        let Some(property) = parse_property(line) else {
            continue;
        };
        match property.name.as_str() {
            "FN" => set(KEY_FULL_NAME, unescape_value(property.value)),
            "N" => {
                let parts = split_components(property.value);
                if let Some(family) = parts.first() {
                    set(KEY_FAMILY_NAME, family.clone());
                }
                if let Some(given) = parts.get(1) {
                    set(KEY_GIVEN_NAME, given.clone());
                }
            }
            "X-EVOLUTION-FILE-AS" => set(KEY_FILE_AS, unescape_value(property.value)),
            "ORG" => {
                let parts = split_components(property.value);
                let org = parts
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                set(KEY_ORGANIZATION, org);
            }
            "TITLE" => set(KEY_TITLE, unescape_value(property.value)),
            "EMAIL" => set(KEY_EMAIL, unescape_value(property.value)),
            "TEL" => {
                let key = if has_type(&property.params, "CELL") {
                    KEY_MOBILE_PHONE
                } else if has_type(&property.params, "WORK") {
                    KEY_BUSINESS_PHONE
                } else {
                    KEY_HOME_PHONE
                };
                set(key, unescape_value(property.value));
            }
            "ADR" => {
                // post office box; extended; street; locality; region; code; country
                let parts = split_components(property.value);
                let component = |index: usize| parts.get(index).cloned().unwrap_or_default();
                set(KEY_STREET, component(2));
                set(KEY_CITY, component(3));
                set(KEY_REGION, component(4));
                set(KEY_POSTAL_CODE, component(5));
                set(KEY_COUNTRY, component(6));
            }
            "NOTE" => set(KEY_NOTE, unescape_value(property.value)),
            _ => {}
        }
    }

    if values.is_empty() {
        return None;
    }

    let lookup = |values: &[(&'static str, String)], key: &str| {
        values
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value.clone())
    };
    if lookup(&values, KEY_FILE_AS).is_none() {
        let family = lookup(&values, KEY_FAMILY_NAME);
        let given = lookup(&values, KEY_GIVEN_NAME);
        let file_as = match (family, given) {
            (Some(family), Some(given)) => Some(format!("{family}, {given}")),
            (Some(family), None) => Some(family),
            (None, Some(given)) => Some(given),
            (None, None) => lookup(&values, KEY_FULL_NAME),
        };
        if let Some(file_as) = file_as {
            values.push((KEY_FILE_AS, file_as));
        }
    }

    let fields = VCARD_KEYS
        .iter()
        .filter_map(|key| {
            lookup(&values, key).map(|value| MergeField {
                key: key.to_string(),
                value,
            })
        })
        .collect();
    Some(MergeRecord::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
N:Lovelace;Ada;;;\r\n\
FN:Ada Lovelace\r\n\
ORG:Analytical Engines\r\n\
TEL;TYPE=WORK,VOICE:555-0100\r\n\
TEL;TYPE=CELL:555-0199\r\n\
ADR;TYPE=HOME:;;12 St James\\, Square;London;;SW1;UK\r\n\
NOTE:first line\\nsecond\r\n\
\x20continued\r\n\
END:VCARD\r\n\
stray text\r\n\
begin:vcard\r\n\
FN:Charles Babbage\r\n\
end:vcard\r\n";

    #[test]
    fn cards_become_records_in_key_order() {
        let mut backend = VCardBackend::new();
        backend.open_text(SAMPLE);

        let ada = backend.next_record().expect("first card");
        assert_eq!(ada.get(KEY_FILE_AS), Some("Lovelace, Ada"));
        assert_eq!(ada.get(KEY_FULL_NAME), Some("Ada Lovelace"));
        assert_eq!(ada.get(KEY_BUSINESS_PHONE), Some("555-0100"));
        assert_eq!(ada.get(KEY_MOBILE_PHONE), Some("555-0199"));
        assert_eq!(ada.get(KEY_STREET), Some("12 St James, Square"));
        assert_eq!(ada.get(KEY_CITY), Some("London"));
        assert_eq!(ada.get(KEY_REGION), None);
        assert_eq!(ada.get(KEY_NOTE), Some("first line\nsecondcontinued"));
        assert_eq!(ada.fields[0].key, KEY_FILE_AS);

        let charles = backend.next_record().expect("second card");
        assert_eq!(charles.get(KEY_FILE_AS), Some("Charles Babbage"));
        assert!(backend.next_record().is_none());
    }

    #[test]
    fn empty_cards_are_skipped() {
        let mut backend = VCardBackend::new();
        backend.open_text("BEGIN:VCARD\nVERSION:3.0\nEND:VCARD\n");
        assert!(backend.next_record().is_none());
    }

    #[test]
    fn primary_key_is_file_as() {
        assert_eq!(VCardBackend::new().primary_key().as_deref(), Some(KEY_FILE_AS));
    }
}
