use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::aggregate::PathwayCounts;
use crate::error::Ko2PathwayError;

/// Lowercased terms; a pathway is dropped when its description contains any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionTerms {
    terms: Vec<String>,
}

impl ExclusionTerms {
    pub fn load(path: &Path) -> Result<Self, Ko2PathwayError> {
        let content = fs::read_to_string(path).map_err(|err| Ko2PathwayError::ExclusionRead {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let terms = Self::parse(&content);
        info!(path = %path.display(), terms = terms.len(), "loaded exclusion terms");
        Ok(terms)
    }

    /// One term per line; blank lines are ignored.
    pub fn parse(content: &str) -> Self {
        let terms = content
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect();
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, description: &str) -> bool {
        let lowered = description.to_lowercase();
        self.terms.iter().any(|term| lowered.contains(term.as_str()))
    }

    /// Returns the number of pathways removed.
    pub fn apply(&self, counts: &mut PathwayCounts) -> usize {
        let before = counts.len();
        counts.retain(|pathway_id, count| {
            let excluded = self.matches(&count.description);
            if excluded {
                debug!(%pathway_id, description = %count.description, "excluded pathway");
            }
            !excluded
        });
        before - counts.len()
    }
}
