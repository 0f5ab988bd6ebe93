use serde_json::Value;
use std::collections::BTreeMap;

/// Message headers keyed by lowercased name.
///
/// Lookups are case-insensitive. A header seen more than once keeps every
/// value, joined with ", " in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let key = name.as_ref().trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        let value = value.into();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                self.entries.insert(key, value);
            }
        }
    }

    /// Case-insensitive header lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_lowercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build headers from an untyped JSON object, as handed over by
    /// integrating transports.
    ///
    /// Strings are taken as-is; numbers and booleans are stringified; arrays
    /// of scalars are joined with ", ". Nulls, nested objects and anything
    /// that is not an object at the top level are ignored.
    pub fn from_json(value: &Value) -> Self {
        let mut headers = Headers::new();
        let Some(object) = value.as_object() else {
            log::debug!("Ignoring non-object header payload");
            return headers;
        };

        for (name, raw) in object {
            match coerce_header_value(raw) {
                Some(text) => headers.insert(name, text),
                None => log::debug!("Ignoring header '{}' with unusable value", name),
            }
        }

        headers
    }
}

fn coerce_header_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|item| !item.is_array())
                .filter_map(coerce_header_value)
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        Value::Null | Value::Object(_) => None,
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// One inbound message as seen by the analyzers. Never mutated.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    pub body: &'a str,
    pub headers: Option<&'a Headers>,
}

impl<'a> Message<'a> {
    pub fn new(body: &'a str, headers: Option<&'a Headers>) -> Self {
        Self { body, headers }
    }

    /// Header lookup that treats "no headers" and "header missing" alike.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.and_then(|h| h.get(name))
    }

    pub fn has_headers(&self) -> bool {
        self.headers.is_some_and(|h| !h.is_empty())
    }
}

/// Split a raw RFC 822-style message into its header block and body.
///
/// Folded header lines are joined onto the previous header. Text that does
/// not open with a blank-line-terminated header block is all body.
pub fn split_raw_message(raw: &str) -> (Headers, String) {
    let mut headers = Headers::new();
    let mut body = String::new();
    let mut in_headers = has_header_block(raw);
    let mut pending: Option<(String, String)> = None;

    for line in raw.lines() {
        if in_headers {
            if line.trim().is_empty() {
                in_headers = false;
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = pending.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                if let Some((k, v)) = pending.take() {
                    headers.insert(k, v);
                }
                pending = Some((key.trim().to_string(), value.trim().to_string()));
            }
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    if let Some((k, v)) = pending.take() {
        headers.insert(k, v);
    }

    (headers, body)
}

/// A header block is present when the text opens with `Name: value` lines
/// (folded lines allowed) terminated by a blank line.
fn has_header_block(raw: &str) -> bool {
    let mut saw_header = false;
    for line in raw.lines() {
        if line.trim().is_empty() {
            return saw_header;
        }
        if saw_header && (line.starts_with(' ') || line.starts_with('\t')) {
            continue;
        }
        if !looks_like_header(line) {
            return false;
        }
        saw_header = true;
    }
    false
}

fn looks_like_header(line: &str) -> bool {
    match line.split_once(':') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        None => false,
    }
}
