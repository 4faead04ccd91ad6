//! Canonical form for user-supplied target URLs.
//!
//! Two inputs that name the same target must normalise to the same string,
//! since the store uses the canonical href as its identity.

use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("URL is empty")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("{0}")]
    Parse(#[from] url::ParseError),
}

/// Trims `input`, prefixes `https://` when no HTTP scheme is given, and
/// returns the parser's href.
pub fn normalize(input: &str) -> Result<String, NormalizeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let candidate = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else if let Some(scheme) = explicit_scheme(trimmed) {
        return Err(NormalizeError::UnsupportedScheme(scheme.to_string()));
    } else {
        format!("https://{}", trimmed)
    };

    Ok(Url::parse(&candidate)?.into())
}

fn has_http_scheme(input: &str) -> bool {
    let lower = input.get(..8).unwrap_or(input).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// The scheme of `input` if it starts with `<scheme>://`.
fn explicit_scheme(input: &str) -> Option<&str> {
    let (scheme, _) = input.split_once("://")?;
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    (starts_alpha && rest_valid).then_some(scheme)
}
