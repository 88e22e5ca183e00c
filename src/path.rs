//! Path segmentation.
//!
//! A path is trimmed of leading and trailing `/` and split on the remaining
//! separators. No percent-decoding and no `..` or `//` normalisation happens
//! here: the transport hands over the path exactly as the client sent it.

/// Marker that opens a parameter segment in a route template (`:id`).
pub(crate) const PARAM_MARKER: char = ':';

/// Splits `path` into its `/`-delimited segments.
///
/// `""` and `"/"` both yield an empty vector, which is what an index route
/// matches against. It is never a single empty segment.
pub fn segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').collect()
}

/// Returns the parameter name if `segment` is a `:name` template segment.
pub(crate) fn param_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(PARAM_MARKER)
}
