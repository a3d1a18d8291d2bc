//! Strict form parsing.
//!
//! # Responsibilities
//! - Parse the URL query and url-encoded bodies of POST/PUT/PATCH
//! - Reject `;` separators and malformed percent escapes
//! - Keep every value for repeated keys, body values first

use std::collections::HashMap;
use axum::http::{header, HeaderMap, Method};
use thiserror::Error;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("invalid semicolon separator in query")]
    Semicolon,

    /// Carries the offending escape, at most three bytes.
    #[error("invalid URL escape {0:?}")]
    InvalidEscape(String),
}

/// Decoded form values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    values: HashMap<String, Vec<String>>,
}

impl Form {
    /// Parse a raw `k=v&k2=v2` sequence.
    pub fn parse(raw: &[u8]) -> Result<Self, FormError> {
        let mut form = Self::default();
        form.extend(raw)?;
        Ok(form)
    }

    fn extend(&mut self, raw: &[u8]) -> Result<(), FormError> {
        validate(raw)?;
        for (key, value) in url::form_urlencoded::parse(raw) {
            self.values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Ok(())
    }

    /// All values for `key`, in arrival order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parse the form carried by a request.
pub fn parse_form(
    method: &Method,
    headers: &HeaderMap,
    query: Option<&str>,
    body: &[u8],
) -> Result<Form, FormError> {
    let mut form = if has_form_body(method, headers) {
        Form::parse(body)?
    } else {
        Form::default()
    };
    if let Some(query) = query {
        form.extend(query.as_bytes())?;
    }
    Ok(form)
}

fn has_form_body(method: &Method, headers: &HeaderMap) -> bool {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return false;
    }
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

fn validate(raw: &[u8]) -> Result<(), FormError> {
    for pair in raw.split(|b| *b == b'&') {
        if pair.contains(&b';') {
            return Err(FormError::Semicolon);
        }
        let (key, value) = match pair.iter().position(|b| *b == b'=') {
            Some(eq) => (&pair[..eq], &pair[eq + 1..]),
            None => (pair, &[][..]),
        };
        check_escapes(key)?;
        check_escapes(value)?;
    }
    Ok(())
}

fn check_escapes(s: &[u8]) -> Result<(), FormError> {
    let mut i = 0;
    while i < s.len() {
        if s[i] == b'%' {
            let valid = i + 2 < s.len()
                && s[i + 1].is_ascii_hexdigit()
                && s[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(s.len());
                return Err(FormError::InvalidEscape(
                    String::from_utf8_lossy(&s[i..end]).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
