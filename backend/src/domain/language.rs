//! Supported languages and client tag resolution.

/// One supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Catalog code, also used in `lang:<code>` callbacks.
    pub code: &'static str,
    /// Name in the language itself, shown in the picker.
    pub native_name: &'static str,
    /// English name, used in the welcome and admin notices.
    pub english_name: &'static str,
}

const fn lang(code: &'static str, native_name: &'static str, english_name: &'static str) -> Language {
    Language {
        code,
        native_name,
        english_name,
    }
}

/// Supported languages in picker order.
pub const LANGUAGES: [Language; 27] = [
    lang("en", "English", "English"),
    lang("ru", "Русский", "Russian"),
    lang("es", "Español", "Spanish"),
    lang("pt", "Português", "Portuguese"),
    lang("fr", "Français", "French"),
    lang("de", "Deutsch", "German"),
    lang("it", "Italiano", "Italian"),
    lang("pl", "Polski", "Polish"),
    lang("uk", "Українська", "Ukrainian"),
    lang("tr", "Türkçe", "Turkish"),
    lang("ar", "العربية", "Arabic"),
    lang("fa", "فارسی", "Persian"),
    lang("he", "עברית", "Hebrew"),
    lang("hi", "हिन्दी", "Hindi"),
    lang("id", "Bahasa Indonesia", "Indonesian"),
    lang("vi", "Tiếng Việt", "Vietnamese"),
    lang("th", "ไทย", "Thai"),
    lang("my", "မြန်မာ", "Burmese"),
    lang("kk", "Қазақша", "Kazakh"),
    lang("az", "Azərbaycan", "Azerbaijani"),
    lang("bg", "Български", "Bulgarian"),
    lang("ro", "Română", "Romanian"),
    lang("fil", "Filipino", "Filipino"),
    lang("zh", "中文", "Chinese"),
    lang("zh-TW", "繁體中文(台灣)", "Chinese (Traditional)"),
    lang("zh-HK", "繁體中文(香港)", "Chinese (Hong Kong)"),
    lang("zh-CN", "简体中文", "Chinese (Simplified)"),
];

/// Look up a supported language by its exact catalog code.
#[must_use]
pub fn find_language(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|language| language.code == code)
}

/// English name of a code, falling back to the code itself.
#[must_use]
pub fn english_name(code: &str) -> &str {
    find_language(code).map_or(code, |language| language.english_name)
}

/// Native name of a code, falling back to the code itself.
#[must_use]
pub fn native_name(code: &str) -> &str {
    find_language(code).map_or(code, |language| language.native_name)
}

/// Map a raw client language tag to a supported catalog code.
///
/// # Examples
/// ```
/// use librecash::domain::resolve_language;
///
/// assert_eq!(resolve_language("zh-Hant"), "zh-TW");
/// assert_eq!(resolve_language("pt-BR"), "pt");
/// assert_eq!(resolve_language("de-AT"), "de");
/// assert_eq!(resolve_language("xx"), "en");
/// ```
#[must_use]
pub fn resolve_language(raw: &str) -> &'static str {
    let tag = raw.trim().replace('_', "-").to_ascii_lowercase();

    match tag.as_str() {
        "zh-cn" | "zh-hans" => return "zh-CN",
        "zh-tw" | "zh-hant" => return "zh-TW",
        "zh-hk" => return "zh-HK",
        _ => {}
    }
    if tag == "pt" || tag.starts_with("pt-") {
        return "pt";
    }
    if let Some(language) = LANGUAGES
        .iter()
        .find(|language| language.code.eq_ignore_ascii_case(&tag))
    {
        return language.code;
    }
    let family = tag.split('-').next().unwrap_or_default();
    if let Some(language) = LANGUAGES.iter().find(|language| language.code == family) {
        return language.code;
    }
    if family == "zh" {
        return "zh";
    }
    "en"
}
