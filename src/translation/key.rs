//! Cache keys for (source text, target locale) pairs.

use crate::i18n::Locale;
use std::fmt;

/// Identifies one translation of one source text into one locale.
///
/// The text is reduced to the hex BLAKE3 digest of its exact bytes, so two
/// keys are equal only when the source texts are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text_hash: String,
    locale: Locale,
}

impl CacheKey {
    pub fn new(text: &str, locale: Locale) -> Self {
        Self {
            text_hash: hash_text(text),
            locale,
        }
    }

    /// Rebuild a key from its stored parts.
    pub fn from_parts(text_hash: impl Into<String>, locale: Locale) -> Self {
        Self {
            text_hash: text_hash.into(),
            locale,
        }
    }

    pub fn text_hash(&self) -> &str {
        &self.text_hash
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.text_hash, self.locale.code())
    }
}

/// Outcome of normalizing a translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Target is the source locale: return the text as-is, touch nothing.
    Bypass,
    Key(CacheKey),
}

/// Derive the cache key for translating `text` into `locale`.
pub fn normalize(text: &str, locale: Locale) -> KeyOutcome {
    if locale.is_source() {
        return KeyOutcome::Bypass;
    }
    KeyOutcome::Key(CacheKey::new(text, locale))
}

/// Lowercase hex BLAKE3 digest of the text.
pub fn hash_text(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_locale_bypasses() {
        assert_eq!(normalize("Salut", Locale::SOURCE), KeyOutcome::Bypass);
    }

    #[test]
    fn test_target_locale_produces_key() {
        match normalize("Salut", Locale::English) {
            KeyOutcome::Key(key) => {
                assert_eq!(key.locale(), Locale::English);
                assert_eq!(key.text_hash(), hash_text("Salut"));
            }
            KeyOutcome::Bypass => panic!("English is not the source locale"),
        }
    }

    #[test]
    fn test_key_is_stable() {
        assert_eq!(
            CacheKey::new("Anunț important", Locale::English),
            CacheKey::new("Anunț important", Locale::English)
        );
    }

    #[test]
    fn test_same_text_different_locale_differs() {
        assert_ne!(
            CacheKey::new("Anunț important", Locale::English),
            CacheKey::new("Anunț important", Locale::Hungarian)
        );
    }

    #[test]
    fn test_key_is_byte_exact() {
        assert_ne!(
            CacheKey::new("Salut", Locale::English),
            CacheKey::new("Salut ", Locale::English)
        );
        assert_ne!(
            CacheKey::new("Salut", Locale::English),
            CacheKey::new("salut", Locale::English)
        );
    }

    #[test]
    fn test_hash_is_hex_digest() {
        let hash = hash_text("Primăria");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_display_appends_locale() {
        let key = CacheKey::new("Salut", Locale::Hungarian);
        let display = key.to_string();
        assert!(display.ends_with(":hu"));
        assert!(display.starts_with(key.text_hash()));
    }

    #[test]
    fn test_from_parts_matches_new() {
        let key = CacheKey::new("Consiliul Local", Locale::English);
        let rebuilt = CacheKey::from_parts(key.text_hash(), Locale::English);
        assert_eq!(key, rebuilt);
    }
}
