pub use ::url::{ParseError, Url};

/// Appends `file` to `base` as a final path segment.
///
/// `file` is inserted verbatim; no percent-encoding is applied beyond what
/// URL parsing itself performs.
pub fn join_file(base: &str, file: &str) -> Result<Url, ParseError> {
    Url::parse(&format!("{}/{}", base.trim_end_matches('/'), file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_file_trims_trailing_slash() {
        let url = join_file("https://example.org/data/", "morning.json").unwrap();
        assert_eq!(url.as_str(), "https://example.org/data/morning.json");

        let url = join_file("https://example.org/data", "morning.json").unwrap();
        assert_eq!(url.as_str(), "https://example.org/data/morning.json");
    }

    #[test]
    fn test_join_file_rejects_relative_base() {
        assert!(join_file("not a url", "morning.json").is_err());
    }
}
