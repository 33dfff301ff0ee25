use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Ko2PathwayError;

static KO_ACCESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^K[0-9]{5}$").expect("KO accession pattern"));
static PATHWAY_MAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^map[0-9]{5}$").expect("pathway map pattern"));

pub const KO_PREFIX: &str = "ko:";

/// A KEGG Orthology identifier, always rendered as `ko:K#####`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KoId(String);

impl KoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare accession without the `ko:` prefix.
    pub fn accession(&self) -> &str {
        &self.0[KO_PREFIX.len()..]
    }
}

impl fmt::Display for KoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for KoId {
    type Err = Ko2PathwayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let bare = match trimmed.get(..KO_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(KO_PREFIX) => &trimmed[KO_PREFIX.len()..],
            _ => trimmed,
        };
        let normalized = bare.to_ascii_uppercase();
        if !KO_ACCESSION.is_match(&normalized) {
            return Err(Ko2PathwayError::InvalidKo(value.to_string()));
        }
        Ok(Self(format!("{KO_PREFIX}{normalized}")))
    }
}

impl TryFrom<String> for KoId {
    type Error = Ko2PathwayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KoId> for String {
    fn from(value: KoId) -> Self {
        value.0
    }
}

/// A reference pathway map identifier such as `map00010`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathwayId(String);

impl PathwayId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PathwayId {
    type Err = Ko2PathwayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let bare = trimmed.strip_prefix("path:").unwrap_or(trimmed);
        if !PATHWAY_MAP.is_match(bare) {
            return Err(Ko2PathwayError::InvalidPathway(value.to_string()));
        }
        Ok(Self(bare.to_string()))
    }
}

impl TryFrom<String> for PathwayId {
    type Error = Ko2PathwayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PathwayId> for String {
    fn from(value: PathwayId) -> Self {
        value.0
    }
}

/// One pathway a KO belongs to. Serialized as a `[pathway_id, description]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "(String, String)",
    into = "(String, String)"
)]
pub struct PathwayRecord {
    pub pathway_id: PathwayId,
    pub description: String,
}

impl PathwayRecord {
    pub fn new(pathway_id: PathwayId, description: impl Into<String>) -> Self {
        Self {
            pathway_id,
            description: description.into(),
        }
    }
}

impl TryFrom<(String, String)> for PathwayRecord {
    type Error = Ko2PathwayError;

    fn try_from((pathway_id, description): (String, String)) -> Result<Self, Self::Error> {
        Ok(Self {
            pathway_id: pathway_id.parse()?,
            description,
        })
    }
}

impl From<PathwayRecord> for (String, String) {
    fn from(value: PathwayRecord) -> Self {
        (value.pathway_id.into(), value.description)
    }
}
