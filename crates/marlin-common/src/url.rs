//! URL resolution utilities.
//!
//! [URL Standard](https://url.spec.whatwg.org/)

/// Whether `url` already carries a scheme the engine understands.
fn is_absolute(url: &str) -> bool {
    url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("data:")
        || url.starts_with("file:")
}

/// Origin of `base` (`scheme://host`), or `None` if `base` has no
/// recognizable authority.
fn origin_of(base: &str) -> Option<&str> {
    let scheme_end = base.find("://")?;
    let after_scheme = &base[scheme_end + 3..];
    after_scheme
        .find('/')
        .map_or(Some(base), |path_start| Some(&base[..scheme_end + 3 + path_start]))
}

/// Resolve a potentially relative URL against a base URL.
///
/// [§ 2.5 URLs](https://html.spec.whatwg.org/multipage/urls-and-fetching.html#resolving-urls)
///
/// "If url is an absolute URL, return url. Otherwise, resolve url relative
/// to base."
///
/// NOTE: This is a simplified resolver covering the cases the engine meets
/// in practice: absolute URLs, protocol-relative URLs, absolute paths, and
/// naive relative paths. `.` and `..` segments are not collapsed.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    if is_absolute(href) {
        return href.to_string();
    }

    let Some(base) = base_url else {
        return href.to_string();
    };

    if let Some(rest) = href.strip_prefix("//") {
        // Protocol-relative URL: inherit the base scheme.
        let scheme = if base.starts_with("https:") { "https" } else { "http" };
        return format!("{scheme}://{rest}");
    }

    if href.starts_with('/') {
        // Absolute path: join with the base origin.
        return origin_of(base).map_or_else(|| href.to_string(), |origin| format!("{origin}{href}"));
    }

    // Relative path: join with the base directory.
    let base_dir = base.rsplit_once('/').map_or(base, |(dir, _)| dir);
    format!("{base_dir}/{href}")
}
