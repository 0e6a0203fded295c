use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::util::{Result, Status};

/// Records per remote page when not configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 2;

/// Whether iterated records are kept locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Nothing is kept; every iterator goes to the remote store
    #[default]
    Transient,
    /// Every iterated record is kept in a cache shared by all iterators of
    /// the view
    Persisted,
}

/// Options for a collection view
///
/// # Example
///
/// ```ignore
/// use pagedview::{CacheMode, ViewOptions};
///
/// let options = ViewOptions {
///     cache_mode: CacheMode::Persisted,
///     ..Default::default()
/// };
///
/// let from_file = ViewOptions::from_json(r#"{ "page_size": 50 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Records requested per remote page
    /// Default: 2
    pub page_size: usize,

    /// Default: Transient
    pub cache_mode: CacheMode,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            page_size: DEFAULT_PAGE_SIZE,
            cache_mode: CacheMode::Transient,
        }
    }
}

impl ViewOptions {
    pub fn persisted() -> Self {
        ViewOptions {
            cache_mode: CacheMode::Persisted,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Status::invalid_argument("page_size must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate options from a JSON document; missing fields take
    /// their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: ViewOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            Status::io_error(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }
}
