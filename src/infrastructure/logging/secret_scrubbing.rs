use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static BASIC_AUTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Basic\s+[a-zA-Z0-9+/=]+").expect("basic auth pattern is valid"));

static KEY_FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(["']?(?:api_key|apikey|token|secret|password)["']?\s*[:=]\s*)["']?[^"'\s,}&]+["']?"#)
        .expect("key field pattern is valid")
});

static URL_CREDENTIALS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?://)[^/\s:@]+:[^/\s@]+@").expect("url credentials pattern is valid")
});

/// Removes credentials from text that may end up in logs or error messages.
///
/// Besides the generic patterns, every configured secret value is replaced
/// verbatim, which catches catalogs that echo a password back in an error
/// body.
#[derive(Clone, Default)]
pub struct SecretScrubber {
    known_secrets: Vec<String>,
}

impl SecretScrubber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also redact these exact values. Short values are ignored; replacing
    /// them would mangle ordinary words.
    pub fn with_secrets<I, S>(mut self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_secrets.extend(
            secrets
                .into_iter()
                .map(Into::into)
                .filter(|s| s.len() >= 4),
        );
        self
    }

    /// Replace every secret in `message` with a placeholder.
    pub fn scrub(&self, message: &str) -> String {
        let mut scrubbed = BASIC_AUTH_PATTERN
            .replace_all(message, "Basic [REDACTED]")
            .into_owned();
        scrubbed = KEY_FIELD_PATTERN
            .replace_all(&scrubbed, |caps: &Captures| format!("{}[REDACTED]", &caps[1]))
            .into_owned();
        scrubbed = URL_CREDENTIALS_PATTERN
            .replace_all(&scrubbed, "${1}[REDACTED]@")
            .into_owned();
        for secret in &self.known_secrets {
            scrubbed = scrubbed.replace(secret.as_str(), "[REDACTED]");
        }
        scrubbed
    }
}

impl fmt::Debug for SecretScrubber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretScrubber")
            .field("known_secrets", &self.known_secrets.len())
            .finish()
    }
}
