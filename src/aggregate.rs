use std::collections::{BTreeMap, HashSet};

use crate::domain::{KoId, PathwayId, PathwayRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwayCount {
    pub description: String,
    pub ko_count: usize,
}

pub type PathwayCounts = BTreeMap<PathwayId, PathwayCount>;

/// Counts distinct KOs per pathway. The first description seen for a pathway wins.
pub fn aggregate<'a, I>(resolutions: I) -> PathwayCounts
where
    I: IntoIterator<Item = (&'a KoId, &'a Vec<PathwayRecord>)>,
{
    let mut counts = PathwayCounts::new();
    for (_, records) in resolutions {
        let mut seen = HashSet::new();
        for record in records {
            if !seen.insert(&record.pathway_id) {
                continue;
            }
            counts
                .entry(record.pathway_id.clone())
                .and_modify(|count| count.ko_count += 1)
                .or_insert_with(|| PathwayCount {
                    description: record.description.clone(),
                    ko_count: 1,
                });
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, description: &str) -> PathwayRecord {
        PathwayRecord::new(id.parse().unwrap(), description)
    }

    #[test]
    fn counts_kos_per_pathway() {
        let mut resolutions = BTreeMap::new();
        resolutions.insert(
            "K00001".parse::<KoId>().unwrap(),
            vec![record("map00010", "Glycolysis"), record("map00020", "TCA cycle")],
        );
        resolutions.insert(
            "K00002".parse::<KoId>().unwrap(),
            vec![record("map00010", "Glycolysis")],
        );
        resolutions.insert("K00003".parse::<KoId>().unwrap(), Vec::new());

        let counts = aggregate(&resolutions);
        let glycolysis = &counts[&"map00010".parse::<PathwayId>().unwrap()];
        assert_eq!(glycolysis.ko_count, 2);
        assert_eq!(glycolysis.description, "Glycolysis");
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn duplicate_pathway_within_ko_counts_once() {
        let mut resolutions = BTreeMap::new();
        resolutions.insert(
            "K00001".parse::<KoId>().unwrap(),
            vec![record("map00010", "Glycolysis"), record("map00010", "Glycolysis")],
        );
        let counts = aggregate(&resolutions);
        assert_eq!(counts.values().next().unwrap().ko_count, 1);
    }

    #[test]
    fn first_description_wins() {
        let mut resolutions = BTreeMap::new();
        resolutions.insert(
            "K00001".parse::<KoId>().unwrap(),
            vec![record("map00010", "Glycolysis")],
        );
        resolutions.insert(
            "K00002".parse::<KoId>().unwrap(),
            vec![record("map00010", "Glycolysis / Gluconeogenesis")],
        );
        let counts = aggregate(&resolutions);
        assert_eq!(counts.values().next().unwrap().description, "Glycolysis");
    }
}
