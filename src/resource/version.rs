//! Content fingerprints and entity-tag preconditions for plans.
//!
//! A plan's version is never stored. It is derived from the exact bytes held by
//! the store using SHA-256, so the stored representation and its ETag cannot
//! drift apart.
//!
//! Phantom format markers keep the two textual forms apart at compile time:
//!
//! * [`RawVersion`] - the bare opaque token (`abc123`)
//! * [`HttpVersion`] - the quoted entity-tag form used in headers (`"abc123"`)
//!
//! Both compare equal when their opaque tokens match.
//!
//! # Basic Usage
//!
//! ```rust
//! use plan_server::resource::version::{HttpVersion, Precondition, RawVersion};
//!
//! let stored = br#"{"objectId":"p1"}"#;
//! let version = RawVersion::from_content(stored);
//!
//! // Header form for responses
//! let etag = HttpVersion::from(version.clone()).to_string();
//! assert!(etag.starts_with('"'));
//!
//! // Client-supplied precondition
//! let condition: Precondition = etag.parse().unwrap();
//! assert!(condition.matches(&version));
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, marker::PhantomData, str::FromStr};
use thiserror::Error;

// Phantom type markers for format distinction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Http;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Raw;

/// Opaque plan version with compile-time format safety.
///
/// Versions are produced by [`PlanVersion::from_content`] over stored bytes, or
/// parsed from client headers. The opaque string is only meaningful for
/// equality comparison.
#[derive(Debug, Clone, Eq, Hash)]
pub struct PlanVersion<Format> {
    opaque: String,
    #[allow(dead_code)]
    _format: PhantomData<Format>,
}

/// Entity-tag header form (`"abc123"`)
pub type HttpVersion = PlanVersion<Http>;

/// Internal bare form (`abc123`)
pub type RawVersion = PlanVersion<Raw>;

impl<Format> PlanVersion<Format> {
    /// Fingerprint a serialized plan.
    ///
    /// The full 256-bit SHA-256 digest is encoded as unpadded URL-safe base64,
    /// which never contains quotes, commas or whitespace and can therefore be
    /// carried in an entity-tag unescaped.
    ///
    /// Callers must pass the bytes exactly as persisted. Fingerprinting a
    /// re-serialized copy would break equality against client-held tags.
    ///
    /// ```rust
    /// use plan_server::resource::version::RawVersion;
    ///
    /// let a = RawVersion::from_content(b"{\"objectId\":\"p1\"}");
    /// let b = RawVersion::from_content(b"{\"objectId\":\"p1\"}");
    /// assert_eq!(a, b);
    /// ```
    pub fn from_content(content: &[u8]) -> RawVersion {
        let digest = Sha256::digest(content);

        PlanVersion {
            opaque: URL_SAFE_NO_PAD.encode(digest),
            _format: PhantomData,
        }
    }

    /// Wrap an already computed token.
    pub fn from_token(token: impl AsRef<str>) -> RawVersion {
        PlanVersion {
            opaque: token.as_ref().to_string(),
            _format: PhantomData,
        }
    }

    /// The opaque token without any header decoration.
    pub fn as_str(&self) -> &str {
        &self.opaque
    }
}

impl fmt::Display for PlanVersion<Raw> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opaque)
    }
}

// Versions are exact byte fingerprints, so responses always carry strong tags.
impl fmt::Display for PlanVersion<Http> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.opaque)
    }
}

impl FromStr for PlanVersion<Raw> {
    type Err = VersionError;

    fn from_str(version_str: &str) -> Result<Self, Self::Err> {
        let trimmed = version_str.trim();

        if trimmed.is_empty() {
            return Err(VersionError::ParseError(
                "Version string cannot be empty".to_string(),
            ));
        }

        Ok(PlanVersion {
            opaque: trimmed.to_string(),
            _format: PhantomData,
        })
    }
}

impl FromStr for PlanVersion<Http> {
    type Err = VersionError;

    /// Parses a single entity-tag.
    ///
    /// Accepts strong (`"x"`), weak (`W/"x"`) and bare (`x`) forms. The bare
    /// form exists for clients that echo the token without quotes.
    fn from_str(etag_header: &str) -> Result<Self, Self::Err> {
        let trimmed = etag_header.trim();
        let etag_value = trimmed.strip_prefix("W/").unwrap_or(trimmed);

        let opaque = if etag_value.starts_with('"') {
            if etag_value.len() < 2 || !etag_value.ends_with('"') {
                return Err(VersionError::InvalidEtagFormat(etag_header.to_string()));
            }
            &etag_value[1..etag_value.len() - 1]
        } else {
            etag_value
        };

        if opaque.is_empty()
            || opaque
                .chars()
                .any(|c| c == '"' || c == ',' || c.is_whitespace())
        {
            return Err(VersionError::InvalidEtagFormat(etag_header.to_string()));
        }

        Ok(PlanVersion {
            opaque: opaque.to_string(),
            _format: PhantomData,
        })
    }
}

impl From<PlanVersion<Raw>> for PlanVersion<Http> {
    fn from(raw: PlanVersion<Raw>) -> Self {
        PlanVersion {
            opaque: raw.opaque,
            _format: PhantomData,
        }
    }
}

impl From<PlanVersion<Http>> for PlanVersion<Raw> {
    fn from(http: PlanVersion<Http>) -> Self {
        PlanVersion {
            opaque: http.opaque,
            _format: PhantomData,
        }
    }
}

impl<F1, F2> PartialEq<PlanVersion<F2>> for PlanVersion<F1> {
    fn eq(&self, other: &PlanVersion<F2>) -> bool {
        self.opaque == other.opaque
    }
}

impl<Format> Serialize for PlanVersion<Format> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.opaque.serialize(serializer)
    }
}

impl<'de, Format> Deserialize<'de> for PlanVersion<Format> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opaque = String::deserialize(deserializer)?;
        Ok(PlanVersion {
            opaque,
            _format: PhantomData,
        })
    }
}

/// A client precondition taken from `If-Match` or `If-None-Match`.
///
/// Both headers share the same grammar: either `*` or a comma-separated list
/// of entity-tags. Parsed with [`FromStr`], weak tags are kept and compared by
/// their opaque value, which is the weak comparison `If-None-Match` uses.
/// `If-Match` requires strong comparison, so it is parsed with
/// [`Precondition::parse_if_match`], which leaves weak tags out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// `*` - matches any existing representation
    Any,
    /// Entity-tags, any of which may match. Empty when an `If-Match` header
    /// held only weak tags, in which case nothing matches.
    OneOf(Vec<HttpVersion>),
}

impl Precondition {
    /// Check the precondition against the current fingerprint.
    pub fn matches(&self, current: &RawVersion) -> bool {
        match self {
            Precondition::Any => true,
            Precondition::OneOf(_) => self.names(current),
        }
    }

    /// Whether `current` is one of the listed tags. `*` names nothing.
    pub fn names(&self, current: &RawVersion) -> bool {
        match self {
            Precondition::Any => false,
            Precondition::OneOf(tags) => tags.iter().any(|tag| tag == current),
        }
    }

    /// Single-tag precondition, mostly useful in tests and clients.
    pub fn exact(version: impl Into<HttpVersion>) -> Self {
        Precondition::OneOf(vec![version.into()])
    }

    /// Parse an `If-Match` header.
    ///
    /// Weak tags never match under strong comparison, so they are dropped
    /// after being checked for well-formedness.
    pub fn parse_if_match(header: &str) -> Result<Self, VersionError> {
        parse_list(header, true)
    }
}

impl FromStr for Precondition {
    type Err = VersionError;

    fn from_str(header: &str) -> Result<Self, Self::Err> {
        parse_list(header, false)
    }
}

fn parse_list(header: &str, strong_only: bool) -> Result<Precondition, VersionError> {
    let trimmed = header.trim();
    if trimmed.is_empty() {
        return Err(VersionError::ParseError(
            "Precondition header cannot be empty".to_string(),
        ));
    }
    if trimmed == "*" {
        return Ok(Precondition::Any);
    }

    let mut list = TagList {
        tags: Vec::new(),
        elements: 0,
        strong_only,
    };
    let mut start = 0;
    let mut in_quotes = false;
    for (index, c) in trimmed.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                list.push(&trimmed[start..index])?;
                start = index + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(VersionError::InvalidEtagFormat(header.to_string()));
    }
    list.push(&trimmed[start..])?;

    if list.elements == 0 {
        return Err(VersionError::InvalidEtagFormat(header.to_string()));
    }
    Ok(Precondition::OneOf(list.tags))
}

struct TagList {
    tags: Vec<HttpVersion>,
    elements: usize,
    strong_only: bool,
}

impl TagList {
    // Empty list elements ("a, , b") are permitted by the list grammar and skipped.
    fn push(&mut self, element: &str) -> Result<(), VersionError> {
        let element = element.trim();
        if element.is_empty() {
            return Ok(());
        }
        let tag: HttpVersion = element.parse()?;
        self.elements += 1;
        if !(self.strong_only && element.starts_with("W/")) {
            self.tags.push(tag);
        }
        Ok(())
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Any => write!(f, "*"),
            Precondition::OneOf(tags) => {
                for (index, tag) in tags.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", tag)?;
                }
                Ok(())
            }
        }
    }
}

/// Details about a failed `If-Match` precondition.
///
/// Carries the current fingerprint so the caller can refresh and retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionConflict {
    /// The precondition supplied by the client, as sent
    pub expected: String,

    /// The fingerprint of the currently stored plan
    pub current: RawVersion,

    /// Human-readable description
    pub message: String,
}

impl VersionConflict {
    pub fn new(
        expected: &Precondition,
        current: RawVersion,
        message: impl Into<String>,
    ) -> Self {
        Self {
            expected: expected.to_string(),
            current,
            message: message.into(),
        }
    }

    /// Conflict with the standard refresh-and-retry message.
    pub fn standard_message(expected: &Precondition, current: RawVersion) -> Self {
        Self::new(
            expected,
            current,
            "Plan was modified by another client. Refresh and try again.",
        )
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version conflict: expected {}, found '{}'. {}",
            self.expected, self.current, self.message
        )
    }
}

impl std::error::Error for VersionConflict {}

/// Errors raised while parsing versions or precondition headers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VersionError {
    #[error("Invalid ETag format: {0}")]
    InvalidEtagFormat(String),

    #[error("Failed to parse version: {0}")]
    ParseError(String),
}
