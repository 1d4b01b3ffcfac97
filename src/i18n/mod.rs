//! Internationalization (i18n) module.
//!
//! - `locale`: the closed set of supported locales and boundary validation
//! - `metrics`: translation observability counters
//!
//! # Example
//!
//! ```rust,ignore
//! use civic_translation_cache::i18n::Locale;
//!
//! let target = Locale::from_code("en")?;
//! assert!(!target.is_source());
//! ```

mod locale;
mod metrics;

pub use locale::{Locale, LocaleError};
pub use metrics::{MetricsReport, TranslationMetrics};
