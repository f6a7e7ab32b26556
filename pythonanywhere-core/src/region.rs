//! API region selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Hosting region for an account.
///
/// PythonAnywhere runs two independent installations; an account lives on
/// exactly one of them and every API call must target that installation's
/// base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// US installation (www.pythonanywhere.com).
    Us,
    /// EU installation (eu.pythonanywhere.com).
    Eu,
}

impl Region {
    /// Base URL of this region's installation.
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Us => "https://www.pythonanywhere.com",
            Self::Eu => "https://eu.pythonanywhere.com",
        }
    }

    /// Short lowercase name, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Eu => "eu",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Self::Us),
            "eu" => Ok(Self::Eu),
            other => Err(ClientError::Configuration(format!(
                "unknown region: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_urls() {
        assert_eq!(Region::Us.base_url(), "https://www.pythonanywhere.com");
        assert_eq!(Region::Eu.base_url(), "https://eu.pythonanywhere.com");
    }

    #[test]
    fn test_parse_known_regions() {
        assert_eq!("us".parse::<Region>().unwrap(), Region::Us);
        assert_eq!("EU".parse::<Region>().unwrap(), Region::Eu);
    }

    #[test]
    fn test_parse_unknown_region_fails() {
        let err = "asia".parse::<Region>().unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }
}
