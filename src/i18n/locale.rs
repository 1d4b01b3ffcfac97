//! Locale type: the closed set of locales content can be served in.
//!
//! Content is authored in the source locale (Romanian). Every other locale is a
//! translation target. Locale strings coming from callers are validated here,
//! once, at the boundary; everything below works with the enum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a locale code is not one of the supported locales.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    #[error("Unknown locale code: '{0}'")]
    Unknown(String),
}

/// A supported locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Locale {
    /// Romanian, the locale content is authored in.
    Romanian,
    English,
    Hungarian,
}

impl Locale {
    /// All supported locales, source locale first.
    pub const ALL: [Locale; 3] = [Locale::Romanian, Locale::English, Locale::Hungarian];

    /// The locale content is authored in. Translation into it is always a no-op.
    pub const SOURCE: Locale = Locale::Romanian;

    /// Parse a locale from its ISO 639-1 code.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace. A region
    /// suffix (`en-GB`, `hu_HU`) is accepted and dropped.
    pub fn from_code(code: &str) -> Result<Locale, LocaleError> {
        let normalized = code.trim().to_ascii_lowercase();
        let primary = normalized
            .split(['-', '_'])
            .next()
            .unwrap_or_default();

        match primary {
            "ro" => Ok(Locale::Romanian),
            "en" => Ok(Locale::English),
            "hu" => Ok(Locale::Hungarian),
            _ => Err(LocaleError::Unknown(code.to_string())),
        }
    }

    /// ISO 639-1 code, also used as the provider's language parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Romanian => "ro",
            Locale::English => "en",
            Locale::Hungarian => "hu",
        }
    }

    pub fn is_source(&self) -> bool {
        *self == Locale::SOURCE
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_code(s)
    }
}

impl TryFrom<String> for Locale {
    type Error = LocaleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Locale::from_code(&value)
    }
}

impl From<Locale> for &'static str {
    fn from(locale: Locale) -> Self {
        locale.code()
    }
}
