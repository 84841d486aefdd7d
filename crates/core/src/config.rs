//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. The
//! parsing helpers take the raw environment value as an argument instead of reading process-wide
//! environment variables, so request handling and tests never depend on ambient state.

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_PAGE_LIMIT};
use crate::{RecordError, RecordResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    page_limit: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`] if `page_limit` is zero.
    pub fn new(data_dir: PathBuf, page_limit: usize) -> RecordResult<Self> {
        if page_limit == 0 {
            return Err(RecordError::InvalidInput(
                "page_limit must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            page_limit,
        })
    }

    /// Root directory of the JSON document store.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Default page size for listing and search.
    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Resolve a caller-supplied limit, falling back to the configured default.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.filter(|l| *l > 0).unwrap_or(self.page_limit)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Resolve the data directory from an optional environment value.
///
/// Blank values fall back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the default page limit from an optional environment value.
///
/// If `value` is `None` or blank, returns [`DEFAULT_PAGE_LIMIT`].
///
/// # Errors
///
/// Returns [`RecordError::InvalidInput`] if the value is not a positive integer.
pub fn page_limit_from_env_value(value: Option<String>) -> RecordResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_PAGE_LIMIT),
        Some(v) => match v.parse::<usize>() {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => Err(RecordError::InvalidInput(format!(
                "page limit must be a positive integer, got '{v}'"
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_limit_defaults_when_unset_or_blank() {
        assert_eq!(page_limit_from_env_value(None).unwrap(), DEFAULT_PAGE_LIMIT);
        assert_eq!(
            page_limit_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_PAGE_LIMIT
        );
    }

    #[test]
    fn page_limit_parses_positive_integers() {
        assert_eq!(page_limit_from_env_value(Some(" 20 ".into())).unwrap(), 20);
        assert!(page_limit_from_env_value(Some("0".into())).is_err());
        assert!(page_limit_from_env_value(Some("-3".into())).is_err());
        assert!(page_limit_from_env_value(Some("many".into())).is_err());
    }

    #[test]
    fn data_dir_falls_back_to_default() {
        assert_eq!(data_dir_from_env_value(None), PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(
            data_dir_from_env_value(Some("/srv/clinrec".into())),
            PathBuf::from("/srv/clinrec")
        );
    }

    #[test]
    fn config_rejects_zero_limit_and_resolves_requests() {
        assert!(CoreConfig::new(PathBuf::from("x"), 0).is_err());

        let cfg = CoreConfig::new(PathBuf::from("x"), 25).unwrap();
        assert_eq!(cfg.effective_limit(None), 25);
        assert_eq!(cfg.effective_limit(Some(0)), 25);
        assert_eq!(cfg.effective_limit(Some(5)), 5);
    }
}
