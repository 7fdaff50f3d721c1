//! # Strict Document Decoding
//!
//! Loads configuration documents into a [`Config`] tree.
//!
//! Decoding is strict: every structure in the tree denies unknown fields,
//! serde rejects a field that appears twice in the same mapping, and the
//! parsers reject structural errors. The parser's error message, including
//! line and column, is kept as is.
//!
//! Supports format detection based on file extension: `.toml` documents are
//! parsed as TOML, everything else as YAML.

use crate::config::Config;
use crate::envsubst;
use crate::error::FileError;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::Path;

/// Document syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Toml
}

impl DocumentFormat {
    /// Pick the format from a file extension. Anything that is not `.toml`
    /// is treated as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml
        }
    }
}

/// Decode a YAML document. An empty document decodes like `{}`.
pub fn decode_yaml<T: DeserializeOwned>(text: &str) -> Result<T, FileError> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    Ok(serde_yaml::from_str(text)?)
}

/// Decode a TOML document.
pub fn decode_toml<T: DeserializeOwned>(text: &str) -> Result<T, FileError> {
    Ok(toml::from_str(text)?)
}

/// Read a document from disk and pass its contents to [`load_document`].
pub fn load_file(path: &Path, expand_env: bool, config: &mut Config) -> Result<(), FileError> {
    let buf = std::fs::read(path)?;
    load_document(&buf, DocumentFormat::from_path(path), expand_env, config)
}

/// Decode a YAML document from a buffer.
///
/// Subsystem defaults are not applied; call [`Config::apply_defaults`]
/// afterwards when using this directly.
pub fn load_bytes(buf: &[u8], expand_env: bool, config: &mut Config) -> Result<(), FileError> {
    load_document(buf, DocumentFormat::Yaml, expand_env, config)
}

/// Optionally substitute environment variables, then decode `buf` into
/// `config`. `buf` must be valid UTF-8.
///
/// Fields absent from the document take their compiled defaults. `config`
/// is only replaced once the whole document decoded successfully.
pub fn load_document(
    buf: &[u8],
    format: DocumentFormat,
    expand_env: bool,
    config: &mut Config
) -> Result<(), FileError> {
    let text = std::str::from_utf8(buf)?;
    let text = if expand_env {
        Cow::Owned(envsubst::expand_env(text)?)
    } else {
        Cow::Borrowed(text)
    };

    let decoded: Config = match format {
        DocumentFormat::Yaml => decode_yaml(&text)?,
        DocumentFormat::Toml => decode_toml(&text)?
    };
    *config = decoded;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_bytes_empty_document() {
        let mut config = Config::default();
        config.reload_port = 1234;

        load_bytes(b"", false, &mut config).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_bytes_defaults() {
        let mut config = Config::default();
        load_bytes(b"{}", false, &mut config).unwrap();

        assert_eq!(config.metrics, crate::MetricsConfig::default());
        assert_eq!(config.integrations, crate::IntegrationsConfig::default());
    }

    #[test]
    fn test_load_bytes_duplicate_key() {
        let doc = r#"
prometheus:
  wal_directory: /tmp/wal
  global:
    scrape_timeout: 10s
    scrape_timeout: 15s
"#;
        let mut config = Config::default();
        let result = load_bytes(doc.as_bytes(), false, &mut config);
        assert!(matches!(result, Err(FileError::Yaml(_))));
    }

    #[test]
    fn test_load_bytes_unknown_key() {
        let doc = r#"
prometheus:
  wal_directory: /tmp/wal
  global:
  scrape_timeout: 10s
"#;
        let mut config = Config::default();
        let result = load_bytes(doc.as_bytes(), false, &mut config);
        assert!(matches!(result, Err(FileError::Yaml(_))));
    }

    #[test]
    fn test_load_bytes_unknown_top_level_key() {
        let mut config = Config::default();
        let err = load_bytes(b"promethues: {}\n", false, &mut config).unwrap_err();
        assert!(err.to_string().contains("promethues"));
    }

    #[test]
    fn test_load_bytes_failure_leaves_config_untouched() {
        let mut config = Config::default();
        config.metrics.wal_directory = "/var/lib/agent".into();

        let doc = "prometheus:\n  wal_directory: /tmp/wal\n  bogus: true\n";
        assert!(load_bytes(doc.as_bytes(), false, &mut config).is_err());
        assert_eq!(config.metrics.wal_directory, Path::new("/var/lib/agent"));
    }

    #[test]
    fn test_load_bytes_reports_position() {
        let doc = "prometheus:\n  global:\n    scrape_timeout: [unterminated\n";
        let mut config = Config::default();
        let err = load_bytes(doc.as_bytes(), false, &mut config).unwrap_err();
        assert!(err.to_string().contains("line"));
    }

    #[test]
    fn test_load_bytes_rejects_invalid_utf8() {
        let doc = b"prometheus:\n  global:\n    external_labels:\n      foo: ab\xffcd\n";
        let mut config = Config::default();
        let err = load_bytes(doc, false, &mut config).unwrap_err();

        assert!(matches!(err, FileError::Utf8(_)));
        assert!(err.to_string().starts_with("config file is not valid UTF-8: "));
        assert!(config.metrics.global.external_labels.is_empty());
    }

    #[test]
    fn test_load_bytes_substitution_error() {
        let doc = "prometheus:\n  wal_directory: ${WAL\n";
        let mut config = Config::default();
        let result = load_bytes(doc.as_bytes(), true, &mut config);
        assert!(matches!(result, Err(FileError::Substitution(_))));
    }

    #[test]
    fn test_load_bytes_without_expansion_keeps_placeholders() {
        let doc = "prometheus:\n  wal_directory: /tmp/${NOT_EXPANDED}\n";
        let mut config = Config::default();
        load_bytes(doc.as_bytes(), false, &mut config).unwrap();
        assert_eq!(
            config.metrics.wal_directory,
            Path::new("/tmp/${NOT_EXPANDED}")
        );
    }

    #[test]
    fn test_load_file_yaml() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("yaml");
        fs::write(
            &path,
            "prometheus:\n  wal_directory: /tmp/wal\n  global:\n    scrape_timeout: 33s\n"
        )
        .unwrap();

        let mut config = Config::default();
        load_file(&path, false, &mut config).unwrap();
        assert_eq!(config.metrics.wal_directory, Path::new("/tmp/wal"));
        assert_eq!(
            config.metrics.global.scrape_timeout,
            Duration::from_secs(33)
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_file_toml() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        let toml_content = r#"
[prometheus]
wal_directory = "/tmp/wal"

[prometheus.global]
scrape_timeout = "33s"
"#;
        fs::write(&path, toml_content).unwrap();

        let mut config = Config::default();
        load_file(&path, false, &mut config).unwrap();
        assert_eq!(config.metrics.wal_directory, Path::new("/tmp/wal"));
        assert_eq!(
            config.metrics.global.scrape_timeout,
            Duration::from_secs(33)
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_file_toml_unknown_key() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().with_extension("toml");
        fs::write(&path, "[prometheus]\nwal_dir = \"/tmp/wal\"\n").unwrap();

        let mut config = Config::default();
        let result = load_file(&path, false, &mut config);
        assert!(matches!(result, Err(FileError::Toml(_))));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_file_not_found() {
        let path = Path::new("/nonexistent/path/agent.yaml");
        let mut config = Config::default();
        let result = load_file(path, false, &mut config);
        assert!(matches!(result, Err(FileError::Read(_))));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("agent.TOML")),
            DocumentFormat::Toml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("agent.yml")),
            DocumentFormat::Yaml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("agent")),
            DocumentFormat::Yaml
        );
    }
}
