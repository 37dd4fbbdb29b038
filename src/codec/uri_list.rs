//! Plain URI listing (`text/uri-list`)
//!
//! One URI per line; `#` lines are comments per RFC 2483.

use crate::types::{GatehouseError, Result};

pub fn decode(body: &str) -> Result<Vec<String>> {
    let uris: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    if uris.is_empty() {
        return Err(GatehouseError::NotAcceptable(
            "no URIs found in body".into(),
        ));
    }
    Ok(uris)
}

pub fn encode(locations: &[String]) -> String {
    locations.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let locations = vec![
            "http://h/u1/compute/1".to_string(),
            "http://h/u1/compute/2".to_string(),
        ];
        let encoded = encode(&locations);
        assert_eq!(decode(&encoded).unwrap(), locations);
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let body = "# heading\n\nhttp://h/u1/compute/1\n";
        assert_eq!(decode(body).unwrap(), vec!["http://h/u1/compute/1"]);
    }

    #[test]
    fn test_comment_only_body_rejected() {
        assert!(decode("# nothing here\n").is_err());
    }
}
