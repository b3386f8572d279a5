//! URL helpers for repository locations

use url::Url;

use crate::config::INDEX_FILE_NAME;
use crate::repo::error::RepoError;

fn parse_base(base_url: &str) -> Result<Url, RepoError> {
    Url::parse(base_url).map_err(|source| RepoError::UrlResolution {
        url: base_url.to_string(),
        source,
    })
}

/// Resolve `reference` relative to `base_url`.
///
/// Absolute references are returned unchanged. The base path is treated as a
/// directory whether or not it ends with a slash; only one trailing slash is
/// dropped before the join.
pub fn resolve_reference_url(base_url: &str, reference: &str) -> Result<String, RepoError> {
    let mut base = parse_base(base_url)?;
    let path = base.path();
    let directory = format!("{}/", path.strip_suffix('/').unwrap_or(path));
    base.set_path(&directory);

    let resolved = base.join(reference).map_err(|source| RepoError::UrlResolution {
        url: reference.to_string(),
        source,
    })?;
    Ok(resolved.to_string())
}

/// Location of the index file under a repository URL
pub fn index_url(base_url: &str) -> Result<String, RepoError> {
    let mut url = parse_base(base_url)?;
    let path = format!("{}/{}", url.path().trim_end_matches('/'), INDEX_FILE_NAME);
    url.set_path(&path);
    Ok(url.to_string())
}
