//! Display helpers for URLs

use url::Url;

use crate::input::is_internal;

/// Short label for a URL, used for tab titles and new bookmarks.
pub fn hostname(url: &str) -> String {
    if is_internal(url) {
        return "New Tab".to_string();
    }

    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|host| host.replacen("www.", "", 1))
            .unwrap_or_default(),
        Err(_) => "Invalid URL".to_string(),
    }
}

pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url).is_ok()
}

pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("https://www.rust-lang.org/learn"), "rust-lang.org");
        assert_eq!(hostname("gemini://new-tab"), "New Tab");
        assert_eq!(hostname("not a url"), "Invalid URL");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.example.com/x"), "www.example.com");
        assert_eq!(extract_domain("nope"), "");
        assert!(is_valid_url("ftp://files.example.com"));
        assert!(!is_valid_url("example.com"));
    }
}
