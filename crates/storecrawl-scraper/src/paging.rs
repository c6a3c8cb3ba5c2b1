//! Listing page URL arithmetic.
//!
//! Storefronts in this corpus paginate with a `page` query parameter. The
//! seed URL is fetched as-is for page 1; later pages get `page=N` set on top
//! of whatever query string the seed already carries.

use crate::error::ScrapeError;

/// Returns `url` with its `page` query parameter set to `page`, preserving
/// every other query pair.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidUrl`] if `url` does not parse.
pub fn with_page(url: &str, page: u32) -> Result<String, ScrapeError> {
    let mut parsed = reqwest::Url::parse(url).map_err(|e| ScrapeError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;

    let existing: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    parsed.set_query(None);
    {
        let mut pairs = parsed.query_pairs_mut();
        for (key, value) in &existing {
            pairs.append_pair(key, value);
        }
        pairs.append_pair("page", &page.to_string());
    }

    Ok(parsed.to_string())
}

/// Resolves an adapter-supplied link against the listing page it came from.
/// Absolute candidates pass through unchanged; unparseable ones yield `None`.
#[must_use]
pub fn resolve_absolute(base: &str, candidate: &str) -> Option<String> {
    let base = reqwest::Url::parse(base).ok()?;
    base.join(candidate).ok().map(|u| u.to_string())
}
