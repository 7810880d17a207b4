//! Filesystem loader for the localisation catalog.
//!
//! Every `<code>.json` file in the locales directory becomes one catalog
//! language. Other files are skipped. A missing directory is not fatal: the
//! bot then speaks only the embedded English.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Catalog, CatalogError};

const LOCALE_EXTENSION: &str = "json";

/// Errors raised while loading locale files.
#[derive(Debug, Error)]
pub enum LocaleLoadError {
    /// The directory exists but could not be listed.
    #[error("failed to list locales in {path}: {source}")]
    List {
        /// Locales directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A locale file could not be read.
    #[error("failed to read locale file {path}: {source}")]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A locale file is not a flat string map.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Build the catalog from `dir`, layered over the embedded English.
///
/// # Errors
/// [`LocaleLoadError`] when the directory cannot be listed or any locale
/// file is unreadable or malformed.
pub fn load_catalog(dir: &Path) -> Result<Catalog, LocaleLoadError> {
    let root = match Dir::open_ambient_dir(dir, ambient_authority()) {
        Ok(root) => root,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            warn!(path = %dir.display(), "locales directory missing; using embedded English only");
            return Ok(Catalog::embedded()?);
        }
        Err(source) => {
            return Err(LocaleLoadError::List {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let sources = read_sources(&root, dir)?;
    let languages: Vec<&str> = sources.iter().map(|(code, _)| code.as_str()).collect();
    info!(path = %dir.display(), languages = ?languages, "loaded locale files");
    let catalog = Catalog::from_json_sources(sources.iter().cloned())?;
    for (code, _) in &sources {
        let missing = catalog.missing_keys(code);
        if !missing.is_empty() {
            warn!(language = %code, missing = ?missing, "locale falls back to English for some keys");
        }
    }
    Ok(catalog)
}

fn read_sources(root: &Dir, dir: &Path) -> Result<Vec<(String, String)>, LocaleLoadError> {
    let list_error = |source| LocaleLoadError::List {
        path: dir.to_path_buf(),
        source,
    };
    let mut sources = Vec::new();
    for item in root.entries().map_err(list_error)? {
        let entry = item.map_err(list_error)?;
        let name = PathBuf::from(entry.file_name());
        let Some(code) = language_code(&name) else {
            continue;
        };
        let document = root
            .read_to_string(&name)
            .map_err(|source| LocaleLoadError::Read {
                path: dir.join(&name),
                source,
            })?;
        sources.push((code.to_owned(), document));
    }
    sources.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(sources)
}

fn language_code(name: &Path) -> Option<&str> {
    if name.extension()?.to_str()? != LOCALE_EXTENSION {
        return None;
    }
    name.file_stem()?.to_str().filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    fn locales(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).expect("write locale");
        }
        dir
    }

    #[rstest]
    fn loads_every_json_file_as_a_language() {
        let dir = locales(&[
            ("ru.json", r#"{"blocked.message": "Заблокировано"}"#),
            ("README.md", "not a locale"),
        ]);
        let catalog = load_catalog(dir.path()).expect("catalog");
        assert!(catalog.has_language("ru"));
        assert!(!catalog.has_language("README"));
        assert_eq!(catalog.get("ru", "blocked.message"), "Заблокировано");
    }

    #[rstest]
    fn missing_directory_falls_back_to_embedded_english() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = load_catalog(&dir.path().join("absent")).expect("catalog");
        assert!(catalog.has_language("en"));
        assert!(!catalog.has_language("ru"));
    }

    #[rstest]
    fn malformed_file_is_reported() {
        let dir = locales(&[("de.json", r#"{"nested": {"no": "strings"}}"#)]);
        let error = load_catalog(dir.path()).expect_err("malformed");
        assert!(matches!(error, LocaleLoadError::Catalog(_)));
    }

    #[rstest]
    #[case("pt.json", Some("pt"))]
    #[case("zh-CN.json", Some("zh-CN"))]
    #[case(".json", None)]
    #[case("en.yaml", None)]
    fn language_codes_come_from_json_stems(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(language_code(Path::new(name)), expected);
    }

    #[fixture]
    fn shipped() -> Catalog {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("locales");
        load_catalog(&dir).expect("shipped locales are valid")
    }

    #[rstest]
    fn shipped_locales_parse(shipped: Catalog) {
        assert!(shipped.has_language("ru"));
    }

    #[rstest]
    #[case("en")]
    #[case("ru")]
    fn shipped_locales_translate_every_english_key(shipped: Catalog, #[case] language: &str) {
        assert_eq!(shipped.missing_keys(language), Vec::<&str>::new());
    }
}
