//! Languages handled by the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Language code used in artifact paths and the video summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Portuguese, the source language of every transcript.
    Pt,
    En,
    Es,
}

impl Lang {
    /// Language the transcription step produces.
    pub const SOURCE: Lang = Lang::Pt;

    /// Languages the pipeline translates into and dubs.
    pub const TARGETS: [Lang; 2] = [Lang::En, Lang::Es];

    pub const ALL: [Lang; 3] = [Lang::Pt, Lang::En, Lang::Es];

    pub fn code(&self) -> &'static str {
        match self {
            Lang::Pt => "pt",
            Lang::En => "en",
            Lang::Es => "es",
        }
    }

    pub fn is_target(&self) -> bool {
        Self::TARGETS.contains(self)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pt" => Ok(Lang::Pt),
            "en" => Ok(Lang::En),
            "es" => Ok(Lang::Es),
            other => Err(ModelError::UnsupportedLang(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("EN".parse::<Lang>().unwrap(), Lang::En);
        assert_eq!(" es ".parse::<Lang>().unwrap(), Lang::Es);
        assert!("fr".parse::<Lang>().is_err());
    }

    #[test]
    fn test_source_is_not_a_target() {
        assert!(!Lang::SOURCE.is_target());
        assert!(Lang::TARGETS.iter().all(Lang::is_target));
    }
}
