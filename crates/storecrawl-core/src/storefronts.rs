use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One storefront entry from the index file.
///
/// Stores are data, not code: the engine is instantiated once per entry, with
/// the named adapter supplying all HTML-shape-specific logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    pub name: String,
    /// Registry key of the site adapter to use (e.g. `"jsonld"`).
    pub adapter: String,
    /// File under the seeds directory with one category URL per line.
    pub categories_file: String,
    /// Substring/regex a product-detail URL must match; consumed by adapters
    /// that discover links generically.
    pub product_link_pattern: Option<String>,
    /// Per-store override of the jittered base delay.
    pub base_delay_ms: Option<u64>,
    /// Per-store override of the executor attempt ceiling.
    pub max_attempts: Option<u32>,
    pub notes: Option<String>,
}

impl StorefrontConfig {
    /// Generate a URL-safe slug from the storefront name. The slug names the
    /// snapshot file, so it must be stable and unique across the index.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Deserialize)]
pub struct StorefrontsFile {
    pub storefronts: Vec<StorefrontConfig>,
}

/// Load and validate the storefront index from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_storefronts(path: &Path) -> Result<StorefrontsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StorefrontsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: StorefrontsFile = serde_yaml::from_str(&content)?;

    validate_storefronts(&file)?;

    Ok(file)
}

fn validate_storefronts(file: &StorefrontsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for store in &file.storefronts {
        if store.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "storefront name must be non-empty".to_string(),
            ));
        }

        if store.adapter.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "storefront '{}' has an empty adapter key",
                store.name
            )));
        }

        if store.categories_file.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "storefront '{}' has an empty categories_file",
                store.name
            )));
        }

        if store.max_attempts == Some(0) {
            return Err(ConfigError::Validation(format!(
                "storefront '{}' sets max_attempts to 0; must be at least 1",
                store.name
            )));
        }

        let lower_name = store.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate storefront name: '{}'",
                store.name
            )));
        }

        let slug = store.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate storefront slug: '{}' (from storefront '{}')",
                slug, store.name
            )));
        }
    }

    Ok(())
}
