//! Shared helpers for providers: key masking and error sanitizing.

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Substrings that mark an upstream message as unsafe to surface verbatim
const SENSITIVE_PATTERNS: &[&str] = &[
    "api_key",
    "api-key",
    "api key",
    "apikey",
    "authorization",
    "bearer",
    "secret",
    "sk-",
];

/// Mask an API key for logs: first and last four characters only.
///
/// # Examples
/// ```
/// use agentic_llm::util::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY || !key.is_ascii() {
        return "****".to_string();
    }
    format!(
        "{}...{}",
        &key[..KEY_MASK_VISIBLE_CHARS],
        &key[key.len() - KEY_MASK_VISIBLE_CHARS..]
    )
}

/// Turn an upstream error body into something safe to put in an `Error`.
#[must_use]
pub fn sanitize_api_error(provider: &str, error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("unauthorized") || lower.contains("invalid key") {
        return format!("{provider} authentication error. Check the configured API key.");
    }
    if lower.contains("rate limit") || lower.contains("quota") {
        return format!("{provider} rate limit exceeded. Please wait.");
    }
    if SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return "An API error occurred. Please try again.".to_string();
    }
    if error.chars().count() > 200 {
        let head: String = error.chars().take(200).collect();
        return format!("{head}...");
    }
    error.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key() {
        let masked = mask_api_key("sk-1234567890abcdefghij");
        assert_eq!(masked, "sk-1...ghij");
        assert!(!masked.contains("567890"));
        assert_eq!(mask_api_key("12345678"), "****");
        assert_eq!(mask_api_key(""), "****");
    }

    #[test]
    fn test_sanitize_hides_keys() {
        let sanitized = sanitize_api_error("openai", "Incorrect API key provided: sk-abc");
        assert!(!sanitized.contains("sk-abc"));
    }

    #[test]
    fn test_sanitize_rate_limit() {
        let sanitized = sanitize_api_error("openai", "Rate limit reached for requests");
        assert!(sanitized.contains("rate limit"));
    }

    #[test]
    fn test_sanitize_passthrough_and_truncate() {
        assert_eq!(
            sanitize_api_error("openai", "model overloaded"),
            "model overloaded"
        );
        let long = "x".repeat(500);
        assert!(sanitize_api_error("openai", &long).len() < 210);
    }
}
