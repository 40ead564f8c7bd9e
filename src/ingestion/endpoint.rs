
use super::IngestionError;
use url::Url;

/// Joins `path_extension` onto `endpoint_prefix`, collapsing any trailing
/// slashes the prefix carries.
pub fn construct_endpoint_url(
    endpoint_prefix: &str,
    path_extension: &[&str],
) -> Result<String, IngestionError> {
    let begin_url = Url::parse(endpoint_prefix).map_err(|e| {
        IngestionError::UrlParseFailure(format!("Endpoint prefix may not be valid url:\n{:?}", e))
    })?;
    let endpoint_url = Ok(_get_segments_count(&begin_url))
        .and_then(|n| _drop_n_trailing_slashes(begin_url, n))
        .and_then(|url| _append_to_path(url, path_extension))?;
    Ok(endpoint_url.as_str().to_string())
}

fn _get_segments_count(url: &Url) -> usize {
    if let Some(split) = url.path_segments() {
        split.count()
    } else {
        0
    }
}

fn _drop_n_trailing_slashes(url: Url, n: usize) -> Result<Url, IngestionError> {
    let mut url = url;
    let mut segment_mutator = url.path_segments_mut().map_err(|e| {
        IngestionError::UrlParseFailure(format!(
            "Endpoint prefix might be a cannot-be-base URL:\n{:?}",
            e
        ))
    })?;
    for _ in 0..n {
        segment_mutator.pop_if_empty();
    }
    drop(segment_mutator);
    Ok(url)
}

fn _append_to_path(url: Url, path_extension: &[&str]) -> Result<Url, IngestionError> {
    let mut url = url;
    let mut segment_mutator = url.path_segments_mut().map_err(|e| {
        IngestionError::UrlParseFailure(format!(
            "Endpoint prefix might be a cannot-be-base URL:\n{:?}",
            e
        ))
    })?;
    segment_mutator.extend(path_extension);
    drop(segment_mutator);
    Ok(url)
}
