// ABOUTME: Image reference grammar: `<repository>:<tag>`, split on the last colon.
// ABOUTME: Parse and Display are exact inverses for every accepted input.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("image reference has no tag (expected <repository>:<tag>): {0}")]
    MissingTag(String),

    #[error("image reference has an empty repository: {0}")]
    EmptyRepository(String),

    #[error("image reference has an empty tag: {0}")]
    EmptyTag(String),

    #[error("invalid character in image reference: {0:?}")]
    InvalidChar(char),
}

/// A container image pinned to a tag.
///
/// Grammar: `<repository>:<tag>`. The repository may contain a registry host
/// and path segments (`111.dkr.ecr.us-east-1.amazonaws.com/team/app`) but no
/// `:`; the tag may not contain `/`. Digest references (`@sha256:...`) are
/// rejected rather than misread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    repository: String,
    tag: String,
}

impl ImageReference {
    /// Build a reference from its parts, validating both.
    pub fn new(repository: &str, tag: &str) -> Result<Self, ParseImageRefError> {
        let combined = format!("{repository}:{tag}");
        if repository.is_empty() {
            return Err(ParseImageRefError::EmptyRepository(combined));
        }
        if tag.is_empty() {
            return Err(ParseImageRefError::EmptyTag(combined));
        }
        if let Some(c) = repository.chars().find(|c| !is_repository_char(*c)) {
            return Err(ParseImageRefError::InvalidChar(c));
        }
        if let Some(c) = tag.chars().find(|c| !is_tag_char(*c)) {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        let (repository, tag) = input
            .rsplit_once(':')
            .ok_or_else(|| ParseImageRefError::MissingTag(input.to_string()))?;

        Self::new(repository, tag)
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Same repository, different tag.
    pub fn with_tag(&self, tag: &str) -> Result<Self, ParseImageRefError> {
        Self::new(&self.repository, tag)
    }
}

fn is_repository_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_')
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

impl FromStr for ImageReference {
    type Err = ParseImageRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
