//! Error types shared by every part of the updater.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Longest response body excerpt carried inside an error
const BODY_EXCERPT: usize = 256;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed argument, raised before any network call
    #[error("configuration error: {0}")]
    Config(String),

    /// No IP-echo service produced an address
    #[error("no IP discovered: {0}")]
    Discovery(String),

    /// The provider listing had no matching A record
    #[error("record not found for zone/domain: {record} in {zone}")]
    RecordNotFound { record: String, zone: String },

    /// Non-success status from a provider API
    #[error("HTTP {status}: {body}")]
    Http { status: i32, body: String },

    /// A signed request refused by the provider
    #[error("{method} request rejected with HTTP {status} (canonical string {canonical_len} bytes): {body}")]
    Rejected {
        status: i32,
        method: String,
        canonical_len: usize,
        body: String,
    },

    /// A successful status whose payload reports a failure
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("request failed: {0}")]
    Request(#[from] minreq::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a JSON field the provider was expected to return
    pub fn missing_field(provider: &str, field: &str) -> Self {
        Self::provider(provider, format!("response has no `{}` field", field))
    }

    pub fn record_not_found(record: &str, zone: &str) -> Self {
        Self::RecordNotFound {
            record: record.to_string(),
            zone: zone.to_string(),
        }
    }
}

/// Mask every credential in `text`, raw or percent-encoded, with `***`.
pub fn scrub(text: &str, secrets: &[String]) -> String {
    let mut out = text.to_string();
    for secret in secrets.iter().filter(|s| !s.is_empty()) {
        out = out.replace(secret.as_str(), "***");
        for encoded in [urlencoding::encode(secret).into_owned(), crate::http::form_encode(secret)] {
            if encoded != *secret {
                out = out.replace(encoded.as_str(), "***");
            }
        }
    }
    out
}

/// Short single-line excerpt of a response body for error messages, with
/// `secrets` masked.
pub fn redact(body: &str, secrets: &[String]) -> String {
    let flat: String = scrub(body, secrets)
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.chars().count() > BODY_EXCERPT {
        let cut: String = flat.chars().take(BODY_EXCERPT).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_short_body() {
        assert_eq!(redact("  {\"ok\":false}\n", &[]), "{\"ok\":false}");
    }

    #[test]
    fn test_redact_truncates_long_body() {
        let body = "x".repeat(1000);
        let out = redact(&body, &[]);
        assert!(out.ends_with("..."));
        assert_eq!(out.len(), BODY_EXCERPT + 3);
    }

    #[test]
    fn test_redact_flattens_newlines() {
        assert_eq!(redact("line one\nline two", &[]), "line one line two");
    }

    #[test]
    fn test_redact_masks_secrets() {
        let secrets = vec!["p@ss word".to_string(), "TOPSECRET".to_string()];
        let body = "Cannot GET /update?password=TOPSECRET&key=p%40ss+word (p@ss word)";
        let out = redact(body, &secrets);
        assert_eq!(out, "Cannot GET /update?password=***&key=*** (***)");
    }

    #[test]
    fn test_scrub_ignores_empty_secret() {
        assert_eq!(scrub("nothing to hide", &[String::new()]), "nothing to hide");
    }

    #[test]
    fn test_record_not_found_message() {
        let err = Error::record_not_found("www", "example.com");
        assert_eq!(
            err.to_string(),
            "record not found for zone/domain: www in example.com"
        );
    }

    #[test]
    fn test_rejected_message_has_context() {
        let err = Error::Rejected {
            status: 400,
            method: "GET".to_string(),
            canonical_len: 312,
            body: "SignatureDoesNotMatch".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("GET"));
        assert!(msg.contains("312 bytes"));
        assert!(msg.contains("HTTP 400"));
    }
}
