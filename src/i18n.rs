//! Internationalization (i18n) support for chessroom.
//!
//! Player-facing messages (move rejections, terminal prompts) come from the
//! catalogues in `locales/`. This module picks the locale to use.
//!
//! Supported languages: en, de.

/// All locales shipped in `locales/`.
pub const SUPPORTED_LOCALES: &[&str] = &["en", "de"];

/// Environment variable that overrides the system locale.
pub const LANG_ENV: &str = "CHESSROOM_LANG";

/// Detects the best locale from the system environment.
///
/// Priority:
/// 1. `CHESSROOM_LANG` environment variable
/// 2. System locale (via `sys-locale` crate)
/// 3. Fallback to `"en"`
pub fn detect_system_locale() -> String {
    if let Ok(lang) = std::env::var(LANG_ENV)
        && let Some(locale) = normalize_locale(&lang)
    {
        return locale;
    }

    if let Some(locale_str) = sys_locale::get_locale()
        && let Some(locale) = normalize_locale(&locale_str)
    {
        return locale;
    }

    "en".to_string()
}

/// Detects the locale and makes it the active one for `t!` lookups.
pub fn init() -> String {
    let locale = detect_system_locale();
    rust_i18n::set_locale(&locale);
    log::debug!("using locale {}", locale);
    locale
}

/// Normalizes a locale string to one of the supported locales.
///
/// Accepts common formats: "en-US", "de_DE.UTF-8", "de". Returns `None` if
/// the language is not supported.
pub fn normalize_locale(input: &str) -> Option<String> {
    let lower = input.trim().to_lowercase();
    let tag = lower.split('.').next().unwrap_or(&lower);
    let language = tag.split(['-', '_']).next().unwrap_or(tag);

    SUPPORTED_LOCALES
        .iter()
        .find(|l| **l == language)
        .map(|l| l.to_string())
}
