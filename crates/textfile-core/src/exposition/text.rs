//! Line-oriented text exposition parser (panic-free).
//!
//! Parsing rules:
//! - Never index by byte offset taken from outside the cursor; every step
//!   goes through `Cursor`, which only advances on char boundaries.
//! - Every error carries the 1-based line number.

use std::collections::{BTreeMap, HashSet};

use super::{FamilyKind, MetricFamily, RawSample};
use crate::error::{CoreError, Result};

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

// Label names are accepted loosely here and sanitized when samples are built.
fn is_label_name_char(c: char) -> bool {
    !(is_blank(c) || matches!(c, '=' | ',' | '{' | '}' | '"'))
}

struct Cursor<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        self.line.get(self.pos..).unwrap_or("")
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.pos += want.len_utf8();
            true
        } else {
            false
        }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.line.len()
    }

    /// Returns how many blanks were skipped.
    fn skip_blanks(&mut self) -> usize {
        let mut n = 0;
        while self.peek().is_some_and(is_blank) {
            self.pos += 1;
            n += 1;
        }
        n
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !f(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.line.get(start..self.pos).unwrap_or("")
    }

    fn token(&mut self) -> &'a str {
        self.take_while(|c| !is_blank(c))
    }
}

#[derive(Default)]
struct Parser {
    families: BTreeMap<String, MetricFamily>,
    typed: HashSet<String>,
    helped: HashSet<String>,
    sampled: HashSet<String>,
}

/// Parse exposition text into families keyed by family name.
pub fn parse(text: &str) -> Result<BTreeMap<String, MetricFamily>> {
    let mut parser = Parser::default();
    for (idx, line) in text.lines().enumerate() {
        parser.line(idx + 1, line)?;
    }
    Ok(parser.families)
}

impl Parser {
    fn line(&mut self, lineno: usize, line: &str) -> Result<()> {
        let mut cur = Cursor::new(line);
        cur.skip_blanks();
        match cur.peek() {
            None => Ok(()),
            Some('#') => {
                cur.bump();
                self.comment(lineno, cur)
            }
            Some(_) => self.sample(lineno, cur),
        }
    }

    fn family_mut(&mut self, name: &str) -> &mut MetricFamily {
        self.families
            .entry(name.to_string())
            .or_insert_with(|| MetricFamily::new(name))
    }

    fn comment(&mut self, lineno: usize, mut cur: Cursor<'_>) -> Result<()> {
        cur.skip_blanks();
        let keyword = cur.token();
        if keyword != "HELP" && keyword != "TYPE" {
            return Ok(());
        }

        cur.skip_blanks();
        let name = cur.token();
        if !is_metric_name(name) {
            return Err(CoreError::parse(
                lineno,
                format!("invalid metric name in {keyword} line: {name:?}"),
            ));
        }

        if keyword == "HELP" {
            cur.skip_blanks();
            if !self.helped.insert(name.to_string()) {
                return Err(CoreError::parse(lineno, format!("second HELP line for {name}")));
            }
            self.family_mut(name).help = unescape_help(cur.rest());
            return Ok(());
        }

        cur.skip_blanks();
        let kw = cur.token();
        cur.skip_blanks();
        if !cur.is_done() {
            return Err(CoreError::parse(lineno, "trailing characters after TYPE"));
        }
        let kind = FamilyKind::from_keyword(kw)
            .ok_or_else(|| CoreError::parse(lineno, format!("unknown metric type {kw:?}")))?;
        if self.sampled.contains(name) {
            return Err(CoreError::parse(
                lineno,
                format!("TYPE line for {name} must come before its samples"),
            ));
        }
        if !self.typed.insert(name.to_string()) {
            return Err(CoreError::parse(lineno, format!("second TYPE line for {name}")));
        }
        self.family_mut(name).kind = kind;
        Ok(())
    }

    fn sample(&mut self, lineno: usize, mut cur: Cursor<'_>) -> Result<()> {
        let name = cur.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
        if !is_metric_name(name) {
            return Err(CoreError::parse(lineno, "invalid metric name"));
        }

        cur.skip_blanks();
        let labels = if cur.eat('{') {
            parse_labels(lineno, &mut cur)?
        } else {
            Vec::new()
        };

        cur.skip_blanks();
        let value_tok = cur.token();
        if value_tok.is_empty() {
            return Err(CoreError::parse(lineno, format!("missing value for {name}")));
        }
        let value = parse_value(value_tok)
            .ok_or_else(|| CoreError::parse(lineno, format!("invalid value {value_tok:?}")))?;

        cur.skip_blanks();
        let timestamp_ms = if cur.is_done() {
            None
        } else {
            let ts = cur.token();
            let ts = ts
                .parse::<i64>()
                .map_err(|_| CoreError::parse(lineno, format!("invalid timestamp {ts:?}")))?;
            Some(ts)
        };

        cur.skip_blanks();
        if !cur.is_done() {
            return Err(CoreError::parse(lineno, "trailing characters after sample"));
        }

        let family = self.family_name_for(name);
        self.sampled.insert(family.clone());
        self.family_mut(&family).samples.push(RawSample {
            name: name.to_string(),
            labels,
            value,
            timestamp_ms,
        });
        Ok(())
    }

    /// `x_bucket`, `x_sum`, `x_count` belong to family `x` when `x` was
    /// declared as a histogram or summary.
    fn family_name_for(&self, name: &str) -> String {
        const SUFFIXES: [(&str, &[FamilyKind]); 3] = [
            ("_bucket", &[FamilyKind::Histogram]),
            ("_sum", &[FamilyKind::Summary, FamilyKind::Histogram]),
            ("_count", &[FamilyKind::Summary, FamilyKind::Histogram]),
        ];
        for (suffix, kinds) in SUFFIXES {
            if let Some(base) = name.strip_suffix(suffix) {
                if let Some(f) = self.families.get(base) {
                    if kinds.contains(&f.kind) {
                        return base.to_string();
                    }
                }
            }
        }
        name.to_string()
    }
}

fn parse_labels(lineno: usize, cur: &mut Cursor<'_>) -> Result<Vec<(String, String)>> {
    let mut labels: Vec<(String, String)> = Vec::new();
    loop {
        cur.skip_blanks();
        if cur.is_done() {
            return Err(CoreError::parse(lineno, "unterminated label set"));
        }
        if cur.eat('}') {
            return Ok(labels);
        }

        let name = cur.take_while(is_label_name_char);
        if name.is_empty() {
            return Err(CoreError::parse(lineno, "invalid label name"));
        }
        cur.skip_blanks();
        if !cur.eat('=') {
            return Err(CoreError::parse(lineno, format!("expected '=' after label {name}")));
        }
        cur.skip_blanks();
        if !cur.eat('"') {
            return Err(CoreError::parse(lineno, format!("expected '\"' for label {name}")));
        }
        let value = parse_quoted(lineno, cur)?;

        if labels.iter().any(|(n, _)| n == name) {
            return Err(CoreError::parse(lineno, format!("duplicate label name {name}")));
        }
        labels.push((name.to_string(), value));

        cur.skip_blanks();
        if cur.eat(',') {
            continue;
        }
        if cur.eat('}') {
            return Ok(labels);
        }
        return Err(CoreError::parse(lineno, "expected ',' or '}' in label set"));
    }
}

fn parse_quoted(lineno: usize, cur: &mut Cursor<'_>) -> Result<String> {
    let mut out = String::new();
    loop {
        match cur.bump() {
            None => return Err(CoreError::parse(lineno, "unterminated label value")),
            Some('"') => return Ok(out),
            Some('\\') => match cur.bump() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                other => {
                    return Err(CoreError::parse(
                        lineno,
                        format!("invalid escape sequence {other:?} in label value"),
                    ))
                }
            },
            Some(c) => out.push(c),
        }
    }
}

fn unescape_help(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_value(tok: &str) -> Option<f64> {
    match tok {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => tok.parse::<f64>().ok(),
    }
}
