use crate::config::SyncConfig;

/// The percent-encoded blob, as attached to the filing link.
pub fn filing_payload(blob: &str) -> String {
    urlencoding::encode(blob).into_owned()
}

/// `{url}?{param}={payload}`; an existing query string is extended with `&`.
pub fn filing_link(config: &SyncConfig, blob: &str) -> String {
    let sep = if config.filing_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}{}={}",
        config.filing_url,
        sep,
        config.filing_param,
        filing_payload(blob)
    )
}
