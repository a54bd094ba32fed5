//! Input resolution for the address bar

use url::Url;

use crate::engine::SearchEngine;

/// Built-in page shown in fresh tabs. Rendered by the shell, never fetched.
pub const NEW_TAB_URL: &str = "gemini://new-tab";

const INTERNAL_PREFIXES: [&str; 3] = ["about:", "data:", "gemini:"];
const NETWORK_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// How a piece of address bar input will be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Internal scheme, passed through untouched
    Internal,
    /// Already an absolute network URL
    Absolute,
    /// Bare domain, gets an `https://` prefix
    Domain,
    /// Free text, sent to the search engine
    Search,
}

pub fn is_internal(url: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

/// `data:` payloads and internal pages cannot be bookmarked.
pub fn is_bookmarkable(url: &str) -> bool {
    !(url.starts_with("data:") || url.starts_with("gemini:"))
}

fn has_network_scheme(input: &str) -> bool {
    NETWORK_SCHEMES.iter().any(|scheme| {
        input
            .as_bytes()
            .get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme.as_bytes()))
    })
}

/// A single word never counts as a domain, even if it would parse as a host.
fn looks_like_domain(input: &str) -> bool {
    input.contains('.') && Url::parse(&format!("https://{input}")).is_ok()
}

pub fn classify(input: &str) -> InputKind {
    if is_internal(input) {
        InputKind::Internal
    } else if has_network_scheme(input) {
        InputKind::Absolute
    } else if looks_like_domain(input) {
        InputKind::Domain
    } else {
        InputKind::Search
    }
}

/// Turn raw address bar input into a navigable URL.
///
/// Empty input is not special-cased: it becomes an empty search. Callers
/// should refuse to submit blank input.
pub fn sanitize(input: &str, engine: SearchEngine) -> String {
    match classify(input) {
        InputKind::Internal | InputKind::Absolute => input.to_string(),
        InputKind::Domain => format!("https://{input}"),
        InputKind::Search => engine.search_url(input),
    }
}
