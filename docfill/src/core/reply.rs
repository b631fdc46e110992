//! Turning raw model replies into JSON values.
//!
//! Each [`SchemaShape`] maps to one parser. Parsing never panics: anything the
//! parser cannot read becomes a [`ReplyError`] that the answer loop feeds back
//! to the model.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};
use thiserror::Error;

use crate::core::schema::type_names;
use crate::core::types::SchemaShape;

/// Why a reply was rejected. Recovered inside the answer loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("reply is not valid JSON: {0}")]
    Json(String),

    #[error("reply is not a literal sequence: {0}")]
    Literal(String),

    #[error("reply does not match schema: {0}")]
    Schema(String),
}

/// Parser for a cleaned reply, given the field schema.
pub type ReplyParser = fn(&str, &Value) -> Result<Value, ReplyError>;

impl SchemaShape {
    /// Parsing strategy for replies to schemas of this shape.
    pub fn parser(self) -> ReplyParser {
        match self {
            SchemaShape::Complex => parse_json,
            SchemaShape::SimpleArray => parse_sequence,
            SchemaShape::Simple => parse_simple,
        }
    }
}

/// Strip a fenced code block and surrounding whitespace.
///
/// The fence may carry any info string on its opening line (`json`, `JSON`,
/// `python`); a bare `json` tag may also run straight into the content. Text
/// outside the fence is discarded. A reply without a fence is only trimmed.
pub fn clean_reply(reply: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```(?:[A-Za-z0-9_+-]*\n|(?i:json))?(.*?)\n?```").expect("fence regex")
    });

    match FENCE_RE.captures(reply).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim().to_string(),
        None => reply.trim().to_string(),
    }
}

fn parse_json(text: &str, _schema: &Value) -> Result<Value, ReplyError> {
    serde_json::from_str(text).map_err(|err| ReplyError::Json(err.to_string()))
}

/// JSON arrays, or bracketed literal lists such as `['a', 'b']` or `(1, True, None)`.
fn parse_sequence(text: &str, _schema: &Value) -> Result<Value, ReplyError> {
    if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }
    parse_literal_sequence(text).map_err(ReplyError::Literal)
}

/// Raw text, unless the schema excludes strings and the text is a JSON scalar.
fn parse_simple(text: &str, schema: &Value) -> Result<Value, ReplyError> {
    let types = type_names(schema);
    if types.is_empty() || types.contains(&"string") {
        return Ok(Value::String(text.to_string()));
    }
    Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
}

/// Deepest bracket nesting accepted in a literal sequence.
const MAX_LITERAL_DEPTH: usize = 128;

/// Parse a bracketed sequence of primitive literals.
pub fn parse_literal_sequence(text: &str) -> Result<Value, String> {
    let mut parser = LiteralParser {
        chars: text.char_indices().peekable(),
        text,
        depth: 0,
    };
    parser.skip_whitespace();
    let value = match parser.peek() {
        Some('[') | Some('(') => parser.parse_value()?,
        Some(other) => return Err(format!("expected '[' or '(', found '{other}'")),
        None => return Err("empty reply".to_string()),
    };
    parser.skip_whitespace();
    if let Some((pos, ch)) = parser.chars.next() {
        return Err(format!("unexpected '{ch}' at offset {pos} after sequence"));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    text: &'a str,
    depth: usize,
}

impl LiteralParser<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn parse_value(&mut self) -> Result<Value, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => self.parse_items(']'),
            Some('(') => self.parse_items(')'),
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(ch) if ch == '-' || ch == '+' || ch.is_ascii_digit() || ch == '.' => {
                self.parse_number()
            }
            Some(ch) if ch.is_ascii_alphabetic() => self.parse_word(),
            Some(ch) => Err(format!("unexpected '{ch}'")),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn parse_items(&mut self, close: char) -> Result<Value, String> {
        if self.depth >= MAX_LITERAL_DEPTH {
            return Err(format!("nesting too deep (more than {MAX_LITERAL_DEPTH} levels)"));
        }
        self.depth += 1;
        let items = self.parse_item_list(close);
        self.depth -= 1;
        items
    }

    fn parse_item_list(&mut self, close: char) -> Result<Value, String> {
        self.chars.next();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.chars.next();
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ch)) if ch == close => return Ok(Value::Array(items)),
                Some((pos, ch)) => {
                    return Err(format!("expected ',' or '{close}' at offset {pos}, found '{ch}'"));
                }
                None => return Err(format!("missing closing '{close}'")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<Value, String> {
        self.chars.next();
        let mut out = String::new();
        while let Some((_, ch)) = self.chars.next() {
            match ch {
                '\\' => {
                    let (_, escaped) = self
                        .chars
                        .next()
                        .ok_or_else(|| "unterminated escape".to_string())?;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'u' => out.push(self.parse_unicode_escape()?),
                        other => out.push(other),
                    }
                }
                ch if ch == quote => return Ok(Value::String(out)),
                ch => out.push(ch),
            }
        }
        Err("unterminated string".to_string())
    }

    fn parse_unicode_escape(&mut self) -> Result<char, String> {
        let mut code = 0u32;
        for _ in 0..4 {
            let (_, digit) = self
                .chars
                .next()
                .ok_or_else(|| "truncated \\u escape".to_string())?;
            let value = digit
                .to_digit(16)
                .ok_or_else(|| format!("invalid hex digit '{digit}' in \\u escape"))?;
            code = code * 16 + value;
        }
        char::from_u32(code).ok_or_else(|| format!("invalid code point {code:#x}"))
    }

    fn parse_number(&mut self) -> Result<Value, String> {
        let start = self.chars.peek().map(|(pos, _)| *pos).unwrap_or(self.text.len());
        let mut end = start;
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E' | '_') {
                end = pos + ch.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let raw: String = self.text[start..end].chars().filter(|ch| *ch != '_').collect();
        if let Ok(int) = raw.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid number '{raw}'"))
    }

    fn parse_word(&mut self) -> Result<Value, String> {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            other => Err(format!("unknown literal '{other}'")),
        }
    }
}
