//! Authorization header normalization

/// Strip an optional `Bearer ` prefix (any casing) and surrounding whitespace.
///
/// # Examples
/// ```
/// use agentic_tools::normalize_bearer;
/// assert_eq!(normalize_bearer("Bearer abc.def"), "abc.def");
/// assert_eq!(normalize_bearer("  bearer   abc "), "abc");
/// assert_eq!(normalize_bearer("abc"), "abc");
/// ```
#[must_use]
pub fn normalize_bearer(header: &str) -> String {
    let trimmed = header.trim();
    let stripped = match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &trimmed[7..],
        _ => trimmed,
    };
    stripped.trim().to_string()
}
