//! Category seed lists: one URL per line, per storefront.

use std::path::Path;

use crate::ConfigError;

/// Read a storefront's category seed file.
///
/// Lines are trimmed; empty lines and `#` comments are skipped; duplicates
/// are dropped keeping the first occurrence, so crawl priority follows file
/// order.
///
/// # Errors
///
/// Returns `ConfigError::SeedFileIo` if the file cannot be read and
/// `ConfigError::Validation` if no category URLs remain after filtering —
/// a storefront with an empty seed list is a deployment mistake, not a
/// runtime condition.
pub fn load_category_seeds(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut seen = std::collections::HashSet::new();
    let seeds: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert((*line).to_owned()))
        .map(str::to_owned)
        .collect();

    if seeds.is_empty() {
        return Err(ConfigError::Validation(format!(
            "seed file {} contains no category URLs",
            path.display()
        )));
    }

    Ok(seeds)
}
