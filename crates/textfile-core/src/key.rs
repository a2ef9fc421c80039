//! Series identity: label-name sanitizing and canonical keys.
//!
//! The canonical key decides overwrite semantics: a fresh sample replaces a
//! stored one only when name and full label set match, e.g.
//! `cpu{host="abc"}` replaces an older `cpu{host="abc"}` but lives next to
//! `cpu{host="xyz"}`.

use std::collections::BTreeMap;

/// Separator between the name and every label name/value in a key.
pub const KEY_SEPARATOR: char = '|';

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace every run of characters outside `[A-Za-z0-9_]` with one `_`.
/// A leading digit gets a `_` prefix so the result is a valid label name.
pub fn sanitize_label_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        out.push('_');
    }
    let mut in_run = false;
    for c in name.chars() {
        if is_name_char(c) {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Sanitize label names and sort them.
///
/// Distinct raw names that sanitize to the same name collide; the pair that
/// comes last in input order wins.
pub fn sanitize_labels<I, K, V>(labels: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    labels
        .into_iter()
        .map(|(k, v)| (sanitize_label_name(k.as_ref()), v.into()))
        .collect()
}

fn push_escaped(key: &mut String, part: &str) {
    for c in part.chars() {
        if c == '\\' || c == KEY_SEPARATOR {
            key.push('\\');
        }
        key.push(c);
    }
}

/// `name|label1|value1|label2|value2...` with labels in sorted order.
///
/// `\` and `|` inside any part are backslash-escaped, so distinct label sets
/// never share a key.
pub fn canonical_key(name: &str, labels: &BTreeMap<String, String>) -> String {
    let mut key = String::with_capacity(name.len());
    push_escaped(&mut key, name);
    for (k, v) in labels {
        key.push(KEY_SEPARATOR);
        push_escaped(&mut key, k);
        key.push(KEY_SEPARATOR);
        push_escaped(&mut key, v);
    }
    key
}
