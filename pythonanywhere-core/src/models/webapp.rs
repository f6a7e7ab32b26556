//! Per-webapp static configuration models.
//!
//! Both kinds of record are scoped to one web application (addressed by its
//! full domain) and identified by a server-assigned id after creation.

use serde::{Deserialize, Serialize};

/// A header served for every response matching a URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticHeader {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// URL pattern the header applies to.
    pub url: String,
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// A filesystem path served directly for a URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPath {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// URL pattern to serve from.
    pub url: String,
    /// Filesystem path the pattern maps to.
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_header_roundtrip() {
        let header = StaticHeader {
            id: None,
            url: "/static/".to_string(),
            name: "Cache-Control".to_string(),
            value: "max-age=3600".to_string(),
        };
        let value = serde_json::to_value(&header).unwrap();
        assert!(value.get("id").is_none());

        let parsed: StaticHeader =
            serde_json::from_str(r#"{"id": 3, "url": "/static/", "name": "X", "value": "y"}"#)
                .unwrap();
        assert_eq!(parsed.id, Some(3));
    }

    #[test]
    fn test_static_path_roundtrip() {
        let parsed: StaticPath =
            serde_json::from_str(r#"{"id": 9, "url": "/media/", "path": "/home/sam/media"}"#)
                .unwrap();
        assert_eq!(parsed.id, Some(9));
        assert_eq!(parsed.path, "/home/sam/media");
    }
}
