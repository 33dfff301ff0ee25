use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::aggregate::PathwayCounts;
use crate::error::Ko2PathwayError;
use crate::fs_util;

pub const PLOT_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub pathway_id: String,
    pub pathway_description: String,
    #[serde(rename = "KO_count")]
    pub ko_count: usize,
}

/// Rows by descending KO count, ties broken by pathway id.
pub fn summarize(counts: &PathwayCounts) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = counts
        .iter()
        .map(|(pathway_id, count)| SummaryRow {
            pathway_id: pathway_id.to_string(),
            pathway_description: count.description.clone(),
            ko_count: count.ko_count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.ko_count
            .cmp(&a.ko_count)
            .then_with(|| a.pathway_id.cmp(&b.pathway_id))
    });
    rows
}

/// The leading `n` rows of an already sorted summary.
pub fn top(rows: &[SummaryRow], n: usize) -> &[SummaryRow] {
    &rows[..rows.len().min(n)]
}

pub fn write_tsv<W: Write>(writer: W, rows: &[SummaryRow]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(["pathway_id", "pathway_description", "KO_count"])?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the summary table; the header is present even with no rows.
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<(), Ko2PathwayError> {
    let output_error = |message: String| Ko2PathwayError::OutputWrite {
        path: path.to_path_buf(),
        message,
    };
    let mut buffer = Vec::new();
    write_tsv(&mut buffer, rows).map_err(|err| output_error(err.to_string()))?;
    fs_util::write_atomic(path, &buffer).map_err(|err| output_error(err.to_string()))
}
