use std::borrow::Cow;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

use crate::error::MergeError;

/// Locator value that selects standard input.
pub const STDIN_LOCATOR: &str = "-";

/// Reads a file-type locator into text.
pub(crate) fn read_locator(locator: Option<&str>) -> Result<String, MergeError> {
    let locator = locator.ok_or(MergeError::MissingSource)?;
    let path = PathBuf::from(locator);
    let bytes = if locator == STDIN_LOCATOR {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .map_err(MergeError::Stdin)?;
        buffer
    } else {
        fs::read(&path).map_err(|source| MergeError::Read {
            path: path.clone(),
            source,
        })?
    };
    decode_bytes(&bytes).ok_or(MergeError::InvalidEncoding { path })
}

/// UTF-8 (with or without BOM) first, then the detector's best legacy guess.
pub(crate) fn decode_bytes(bytes: &[u8]) -> Option<String> {
    if let Some(stripped) = bytes.strip_prefix(b"\xEF\xBB\xBF") {
        return std::str::from_utf8(stripped).ok().map(str::to_owned);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_owned());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess: &'static Encoding = detector.guess(None, true);
    if guess == UTF_8 {
        return None;
    }
    debug!(encoding = guess.name(), "decoding merge data with legacy encoding");
    let (cow, had_errors) = guess.decode_without_bom_handling(bytes);
    if had_errors {
        return None;
    }
    Some(match cow {
        Cow::Borrowed(slice) => slice.to_owned(),
        Cow::Owned(string) => string,
    })
}
