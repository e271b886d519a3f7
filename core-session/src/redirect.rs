//! Allow-list redirect sanitization
//!
//! Prevents open-redirect when resuming a caller-supplied destination after
//! re-authentication. Pure and deterministic; anything that fails a check
//! falls back to the fixed default path.

use percent_encoding::percent_decode_str;
use tracing::debug;

/// Destination used whenever a candidate fails validation.
pub const DEFAULT_REDIRECT_PATH: &str = "/dashboard";

/// In-app path prefixes a post-login redirect may land on.
const ALLOWED_PATH_PREFIXES: &[&str] = &[
    "/dashboard",
    "/proposals",
    "/escrow",
    "/treasury",
    "/account",
    "/settings",
];

/// Validate a caller-supplied return destination.
///
/// Accepts only same-origin paths: the decoded candidate must start with a
/// single `/`, carry no scheme or host, and match an allowed prefix exactly
/// or as a subpath. Everything else — absolute URLs, protocol-relative URLs,
/// dangerous schemes, undecodable input, `None` — yields
/// [`DEFAULT_REDIRECT_PATH`].
pub fn validate(candidate: Option<&str>) -> String {
    match candidate.and_then(sanitize) {
        Some(path) => path,
        None => {
            debug!("redirect candidate rejected, using default");
            DEFAULT_REDIRECT_PATH.to_string()
        }
    }
}

fn sanitize(candidate: &str) -> Option<String> {
    let decoded = percent_decode_str(candidate).decode_utf8().ok()?;
    let decoded = decoded.trim();

    // Absolute and protocol-relative URLs, and anything scheme-shaped.
    if !decoded.starts_with('/') || decoded.starts_with("//") {
        return None;
    }
    if decoded.contains("://") || decoded.contains('\\') {
        return None;
    }
    if decoded.chars().any(|c| c.is_control()) {
        return None;
    }

    let allowed = ALLOWED_PATH_PREFIXES.iter().any(|prefix| {
        decoded == *prefix
            || decoded
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('#'))
    });
    if allowed {
        Some(decoded.to_string())
    } else {
        None
    }
}
