//! Immutable text catalog shared by every component that renders copy.
//!
//! The catalog is built once at start-up and handed around behind an `Arc`.
//! English is compiled in so every key resolves even when no locale files are
//! deployed. Lookups fall back from the requested language to English and
//! finally to the key itself.

use std::collections::HashMap;
use std::fmt;

use super::DEFAULT_LANGUAGE as DEFAULT_CATALOG_LANGUAGE;

const EMBEDDED_ENGLISH: &str = include_str!("../../locales/en.json");

/// Errors raised while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A locale document is not a flat JSON object of strings.
    #[error("locale `{language}` is not a flat JSON string map: {source}")]
    Parse {
        /// Language code of the offending document.
        language: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

type Templates = HashMap<String, String>;

/// Language-to-key-to-template map.
#[derive(Debug, Clone)]
pub struct Catalog {
    languages: HashMap<String, Templates>,
}

impl Catalog {
    /// Catalog holding only the compiled-in English templates.
    ///
    /// # Errors
    /// Fails only if the embedded English document is malformed.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_sources(std::iter::empty::<(String, String)>())
    }

    /// Build a catalog from `(language, json)` documents.
    ///
    /// A document for `en` is layered over the embedded English templates
    /// rather than replacing them.
    ///
    /// # Errors
    /// Returns [`CatalogError::Parse`] for any malformed document.
    ///
    /// # Examples
    /// ```
    /// use librecash::domain::Catalog;
    ///
    /// let catalog = Catalog::from_json_sources([(
    ///     "de".to_owned(),
    ///     r#"{"blocked.message": "Gesperrt"}"#.to_owned(),
    /// )])
    /// .expect("valid catalog");
    /// assert_eq!(catalog.get("de", "blocked.message"), "Gesperrt");
    /// assert_eq!(catalog.get("de", "missing.key"), "missing.key");
    /// ```
    pub fn from_json_sources<I>(sources: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut languages = HashMap::new();
        languages.insert(
            DEFAULT_CATALOG_LANGUAGE.to_owned(),
            parse_templates(DEFAULT_CATALOG_LANGUAGE, EMBEDDED_ENGLISH)?,
        );

        for (language, document) in sources {
            let templates = parse_templates(&language, &document)?;
            languages
                .entry(language)
                .or_default()
                .extend(templates);
        }
        Ok(Self { languages })
    }

    /// Whether templates exist for `language`.
    #[must_use]
    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// English keys that `language` leaves untranslated, sorted.
    ///
    /// An unknown language is missing every key.
    #[must_use]
    pub fn missing_keys(&self, language: &str) -> Vec<&str> {
        let translated = self.languages.get(language);
        let mut missing: Vec<&str> = self
            .languages
            .get(DEFAULT_CATALOG_LANGUAGE)
            .into_iter()
            .flat_map(HashMap::keys)
            .filter(|key| translated.is_none_or(|templates| !templates.contains_key(*key)))
            .map(String::as_str)
            .collect();
        missing.sort_unstable();
        missing
    }

    /// Raw template for `key`, with English and key fallbacks.
    #[must_use]
    pub fn get<'a>(&'a self, language: &str, key: &'a str) -> &'a str {
        self.lookup(language, key)
            .or_else(|| self.lookup(DEFAULT_CATALOG_LANGUAGE, key))
            .unwrap_or(key)
    }

    /// Template for `key` with each `{}` replaced by the next argument.
    ///
    /// Surplus arguments are ignored; surplus placeholders render empty.
    #[must_use]
    pub fn format(&self, language: &str, key: &str, args: &[&dyn fmt::Display]) -> String {
        fill_placeholders(self.get(language, key), args)
    }

    fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        self.languages
            .get(language)
            .and_then(|templates| templates.get(key))
            .map(String::as_str)
    }
}

fn parse_templates(language: &str, document: &str) -> Result<Templates, CatalogError> {
    serde_json::from_str(document).map_err(|source| CatalogError::Parse {
        language: language.to_owned(),
        source,
    })
}

fn fill_placeholders(template: &str, args: &[&dyn fmt::Display]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut remaining = args.iter();
    let mut pieces = template.split("{}");

    if let Some(first) = pieces.next() {
        rendered.push_str(first);
    }
    for piece in pieces {
        if let Some(arg) = remaining.next() {
            rendered.push_str(&arg.to_string());
        }
        rendered.push_str(piece);
    }
    rendered
}
