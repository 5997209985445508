//! Copying saved passwords to the system clipboard.

use arboard::Clipboard;
use thiserror::Error;

use crate::models::PasswordMap;
use crate::search;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard access failed: {0}")]
    AccessFailed(String),

    #[error("No password saved under '{0}'")]
    NotFound(String),
}

/// Anything a password can be copied into.
pub trait TextSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

pub struct ClipboardController {
    clipboard: Clipboard,
}

impl ClipboardController {
    pub fn new() -> Result<Self, ClipboardError> {
        let clipboard =
            Clipboard::new().map_err(|e| ClipboardError::AccessFailed(e.to_string()))?;
        Ok(Self { clipboard })
    }
}

impl TextSink for ClipboardController {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::AccessFailed(e.to_string()))
    }
}

/// Copies the password saved under `name` into `sink` and returns the entry's
/// stored name. Only exact names are copied, never a fuzzy hit.
pub fn copy_password<'a, S: TextSink + ?Sized>(
    sink: &mut S,
    entries: &'a PasswordMap,
    name: &str,
) -> Result<&'a str, ClipboardError> {
    let (found, password) = search::exact_match(entries, name)
        .ok_or_else(|| ClipboardError::NotFound(name.trim().to_string()))?;
    sink.set_text(password)?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        copied: Vec<String>,
        fail: bool,
    }

    impl TextSink for Recorder {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::AccessFailed("no display".to_string()));
            }
            self.copied.push(text.to_string());
            Ok(())
        }
    }

    fn entries() -> PasswordMap {
        PasswordMap::from([
            ("github".to_string(), "Xy9!aB2c".to_string()),
            ("mail".to_string(), "m-pass".to_string()),
        ])
    }

    #[test]
    fn test_copies_named_password() {
        let entries = entries();
        let mut sink = Recorder::default();
        let found = copy_password(&mut sink, &entries, "GitHub").unwrap();
        assert_eq!(found, "github");
        assert_eq!(sink.copied, ["Xy9!aB2c"]);
    }

    #[test]
    fn test_unknown_name_copies_nothing() {
        let entries = entries();
        let mut sink = Recorder::default();
        let err = copy_password(&mut sink, &entries, "git").unwrap_err();
        assert_eq!(err, ClipboardError::NotFound("git".to_string()));
        assert!(sink.copied.is_empty());
    }

    #[test]
    fn test_sink_failure_is_reported() {
        let entries = entries();
        let mut sink = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let err = copy_password(&mut sink, &entries, "mail").unwrap_err();
        assert!(matches!(err, ClipboardError::AccessFailed(_)));
    }
}
