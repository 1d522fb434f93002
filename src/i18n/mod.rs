//! Internationalization module
//!
//! Translation loading, language detection, message formatting and
//! pluralization for English and Indonesian.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, TranslationParams};
