use crate::error::{EnvelopeError, Result};

const DASHES: &str = "-----";
const BEGIN_PREFIX: &str = "-----BEGIN ";
pub(crate) const END_PREFIX: &str = "-----END ";

/// Delimiter between a header key and its value.
pub const HEADER_DELIMITER: &str = ": ";

/// Envelope header fields, kept in insertion order with unique keys.
///
/// Inserting an existing key replaces its value in place, so the key keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, returning the previous value if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        headers.extend(iter);
        headers
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Headers {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// The descriptor of an envelope: everything except the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub label: String,
    pub headers: Headers,
}

impl Block {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            headers: Headers::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Check that the label and every header can be written and read back.
    pub fn validate(&self) -> Result<()> {
        validate_label(&self.label)?;
        for (key, value) in self.headers.iter() {
            validate_header(key, value)?;
        }
        Ok(())
    }
}

fn validate_label(label: &str) -> Result<()> {
    let reason = if label.is_empty() {
        "label is empty"
    } else if label.contains(DASHES) {
        "label contains '-----'"
    } else if label.contains(['\r', '\n']) {
        "label contains a line break"
    } else {
        return Ok(());
    };
    Err(EnvelopeError::InvalidLabel {
        label: label.to_string(),
        reason,
    })
}

fn validate_header(key: &str, value: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.contains(HEADER_DELIMITER) {
        "key contains ': '"
    } else if key.contains(['\r', '\n']) {
        "key contains a line break"
    } else if value.contains(['\r', '\n']) {
        "value contains a line break"
    } else {
        return Ok(());
    };
    Err(EnvelopeError::InvalidHeader {
        key: key.to_string(),
        reason,
    })
}

pub(crate) fn begin_marker(label: &str) -> String {
    format!("{BEGIN_PREFIX}{label}{DASHES}\n")
}

pub(crate) fn end_marker(label: &str) -> String {
    format!("{END_PREFIX}{label}{DASHES}\n")
}

fn marker_label<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let label = line.strip_prefix(prefix)?.strip_suffix(DASHES)?;
    (!label.is_empty() && !label.contains(DASHES)).then_some(label)
}

/// Label of a `-----BEGIN <label>-----` line (without its line ending).
pub(crate) fn parse_begin(line: &str) -> Option<&str> {
    marker_label(line, BEGIN_PREFIX)
}

/// Label of a `-----END <label>-----` line (without its line ending).
pub(crate) fn parse_end(line: &str) -> Option<&str> {
    marker_label(line, END_PREFIX)
}

/// Split a `key: value` line at the first delimiter.
pub(crate) fn parse_header(line: &str) -> Option<(&str, &str)> {
    line.split_once(HEADER_DELIMITER)
        .filter(|(key, _)| !key.is_empty())
}
