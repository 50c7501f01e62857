use std::sync::RwLock;

use once_cell::sync::Lazy;

use crate::error::MergeError;
use crate::fixed::FixedBackend;
use crate::source::{MergeBackend, MergeSource, SourceType};
use crate::text::TextBackend;
use crate::vcard::VCardBackend;

/// Backend-specific settings handed to the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendCapabilities {
    pub delimiter: Option<char>,
    pub line1_has_keys: bool,
}

/// Registry entry describing one merge backend.
#[derive(Debug)]
pub struct BackendInfo {
    pub id: &'static str,
    pub description: &'static str,
    pub src_type: SourceType,
    pub capabilities: BackendCapabilities,
    pub factory: fn(&BackendCapabilities) -> Box<dyn MergeBackend>,
}

impl BackendInfo {
    pub fn instantiate(&self) -> Box<dyn MergeBackend> {
        (self.factory)(&self.capabilities)
    }
}

fn text_factory(capabilities: &BackendCapabilities) -> Box<dyn MergeBackend> {
    Box::new(TextBackend::new(
        capabilities.delimiter.unwrap_or(','),
        capabilities.line1_has_keys,
    ))
}

fn vcard_factory(_: &BackendCapabilities) -> Box<dyn MergeBackend> {
    Box::new(VCardBackend::new())
}

fn fixed_factory(_: &BackendCapabilities) -> Box<dyn MergeBackend> {
    Box::new(FixedBackend::default())
}

const fn text_backend(
    id: &'static str,
    description: &'static str,
    delimiter: char,
    line1_has_keys: bool,
) -> BackendInfo {
    BackendInfo {
        id,
        description,
        src_type: SourceType::File,
        capabilities: BackendCapabilities {
            delimiter: Some(delimiter),
            line1_has_keys,
        },
        factory: text_factory,
    }
}

static TEXT_COMMA: BackendInfo =
    text_backend("Text/Comma", "Text: Comma Separated Values (CSV)", ',', false);
static TEXT_COMMA_KEYS: BackendInfo = text_backend(
    "Text/Comma/Line1Keys",
    "Text: Comma Separated Values (CSV) with keys on line 1",
    ',',
    true,
);
static TEXT_TAB: BackendInfo =
    text_backend("Text/Tab", "Text: Tab Separated Values (TSV)", '\t', false);
static TEXT_TAB_KEYS: BackendInfo = text_backend(
    "Text/Tab/Line1Keys",
    "Text: Tab Separated Values (TSV) with keys on line 1",
    '\t',
    true,
);
static TEXT_COLON: BackendInfo =
    text_backend("Text/Colon", "Text: Colon separated values", ':', false);
static TEXT_COLON_KEYS: BackendInfo = text_backend(
    "Text/Colon/Line1Keys",
    "Text: Colon separated values with keys on line 1",
    ':',
    true,
);

static VCARD: BackendInfo = BackendInfo {
    id: "ebook/vcard",
    description: "VCards",
    src_type: SourceType::File,
    capabilities: BackendCapabilities {
        delimiter: None,
        line1_has_keys: false,
    },
    factory: vcard_factory,
};

pub(crate) static FIXED_RECORDS: BackendInfo = BackendInfo {
    id: "Fixed/Records",
    description: "Fixed records supplied by the application",
    src_type: SourceType::Fixed,
    capabilities: BackendCapabilities {
        delimiter: None,
        line1_has_keys: false,
    },
    factory: fixed_factory,
};

static REGISTRY: Lazy<RwLock<Vec<&'static BackendInfo>>> = Lazy::new(|| {
    RwLock::new(vec![
        &TEXT_COMMA,
        &TEXT_COMMA_KEYS,
        &TEXT_TAB,
        &TEXT_TAB_KEYS,
        &TEXT_COLON,
        &TEXT_COLON_KEYS,
        &VCARD,
        &FIXED_RECORDS,
    ])
});

fn snapshot() -> Vec<&'static BackendInfo> {
    match REGISTRY.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Adds a backend to the registry. Ids must be unique.
pub fn register_backend(info: &'static BackendInfo) -> Result<(), MergeError> {
    let mut guard = match REGISTRY.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if guard.iter().any(|existing| existing.id == info.id) {
        return Err(MergeError::DuplicateBackend(info.id.to_string()));
    }
    guard.push(info);
    Ok(())
}

/// All registered backends in registration order.
pub fn backends() -> Vec<&'static BackendInfo> {
    snapshot()
}

pub fn find_backend(id: &str) -> Option<&'static BackendInfo> {
    snapshot().into_iter().find(|info| info.id == id)
}

pub fn backend_descriptions() -> Vec<&'static str> {
    snapshot().into_iter().map(|info| info.description).collect()
}

pub fn description_to_id(description: &str) -> Option<&'static str> {
    snapshot()
        .into_iter()
        .find(|info| info.description == description)
        .map(|info| info.id)
}

/// Instantiates an unopened merge source for the backend `id`.
pub fn create(id: &str) -> Result<MergeSource, MergeError> {
    let info = find_backend(id).ok_or_else(|| MergeError::UnknownBackend(id.to_string()))?;
    Ok(MergeSource::with_backend(info, info.instantiate()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_backends_are_registered() {
        let ids: Vec<_> = backends().iter().map(|info| info.id).collect();
        assert!(ids.contains(&"Text/Comma"));
        assert!(ids.contains(&"Text/Tab/Line1Keys"));
        assert!(ids.contains(&"ebook/vcard"));
        assert!(ids.contains(&"Fixed/Records"));
    }

    #[test]
    fn description_maps_back_to_id() {
        assert_eq!(
            description_to_id("Text: Tab Separated Values (TSV)"),
            Some("Text/Tab")
        );
        assert_eq!(description_to_id("nope"), None);
    }

    #[test]
    fn create_rejects_unknown_backend() {
        match create("Spreadsheet/Ods") {
            Err(MergeError::UnknownBackend(id)) => assert_eq!(id, "Spreadsheet/Ods"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn capabilities_follow_the_backend_id() {
        let info = find_backend("Text/Colon/Line1Keys").expect("registered");
        assert_eq!(info.capabilities.delimiter, Some(':'));
        assert!(info.capabilities.line1_has_keys);
        assert_eq!(info.src_type, SourceType::File);
    }

    static EXTRA: BackendInfo = BackendInfo {
        id: "Test/Extra",
        description: "Extra test backend",
        src_type: SourceType::Fixed,
        capabilities: BackendCapabilities {
            delimiter: None,
            line1_has_keys: false,
        },
        factory: fixed_factory,
    };

    #[test]
    fn duplicate_registration_is_rejected() {
        register_backend(&EXTRA).expect("first registration");
        assert!(matches!(
            register_backend(&EXTRA),
            Err(MergeError::DuplicateBackend(_))
        ));
        assert!(create("Test/Extra").is_ok());
    }
}
