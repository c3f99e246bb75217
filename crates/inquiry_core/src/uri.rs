//! `content://` addresses for data exposed through providers.
//!
//! # Invariants
//! - Scheme is always `content`.
//! - Authority matches `[A-Za-z0-9._-]+`; path segments are never empty.
//! - `Display` output parses back to an equal `ContentUri`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const SCHEME: &str = "content";

static AUTHORITY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("authority pattern must compile"));

/// Whether `value` is usable as a provider authority.
pub(crate) fn is_valid_authority(value: &str) -> bool {
    AUTHORITY_PATTERN.is_match(value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    MissingScheme(String),
    UnsupportedScheme(String),
    InvalidAuthority(String),
}

impl Display for UriError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingScheme(value) => write!(f, "uri has no scheme: `{value}`"),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "unsupported uri scheme `{scheme}`; expected `{SCHEME}`")
            }
            Self::InvalidAuthority(value) => write!(f, "invalid uri authority `{value}`"),
        }
    }
}

impl Error for UriError {}

/// Parsed `content://authority/path` address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentUri {
    authority: String,
    segments: Vec<String>,
}

impl ContentUri {
    /// Parses `content://<authority>[/<segment>...]`.
    ///
    /// Empty segments (`//`, trailing `/`) are dropped.
    pub fn parse(value: &str) -> Result<Self, UriError> {
        let trimmed = value.trim();
        let (scheme, rest) = trimmed
            .split_once("://")
            .ok_or_else(|| UriError::MissingScheme(trimmed.to_string()))?;
        if scheme != SCHEME {
            return Err(UriError::UnsupportedScheme(scheme.to_string()));
        }

        let mut parts = rest.split('/');
        let authority = parts.next().unwrap_or_default();
        if !is_valid_authority(authority) {
            return Err(UriError::InvalidAuthority(authority.to_string()));
        }

        Ok(Self {
            authority: authority.to_string(),
            segments: parts
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    /// Builds a URI from an authority and path segments.
    ///
    /// Segments containing `/` are split, so the result prints and parses
    /// back to the same URI.
    pub fn from_parts<S: Into<String>>(
        authority: &str,
        segments: impl IntoIterator<Item = S>,
    ) -> Result<Self, UriError> {
        if !is_valid_authority(authority) {
            return Err(UriError::InvalidAuthority(authority.to_string()));
        }
        Ok(Self {
            authority: authority.to_string(),
            segments: segments
                .into_iter()
                .flat_map(|segment| {
                    let segment: String = segment.into();
                    let parts = segment
                        .split('/')
                        .filter(|part| !part.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>();
                    parts
                })
                .collect(),
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn path_segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns a copy with `id` appended as the last path segment.
    pub fn with_appended_id(&self, id: i64) -> Self {
        let mut uri = self.clone();
        uri.segments.push(id.to_string());
        uri
    }

    /// Parses the last path segment as a row id.
    pub fn parse_id(&self) -> Option<i64> {
        self.segments.last()?.parse().ok()
    }
}

impl Display for ContentUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{SCHEME}://{}", self.authority)?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ContentUri {
    type Err = UriError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
