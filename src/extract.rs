use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::KoId;
use crate::error::Ko2PathwayError;
use crate::fs_util;

const NO_HIT: &str = "-";

/// Reads a gene-to-KO table and returns every distinct KO it mentions.
pub fn extract_kos(path: &Path) -> Result<BTreeSet<KoId>, Ko2PathwayError> {
    if !path.exists() {
        return Err(Ko2PathwayError::InputNotFound(path.to_path_buf()));
    }
    let reader = fs_util::open_text(path).map_err(|err| Ko2PathwayError::InputRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    parse_kos(reader).map_err(|err| Ko2PathwayError::InputRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

/// Tab-separated, no header; `#` lines are comments. Column two holds a
/// comma-separated KO list. Rows without it and unparseable tokens are skipped.
pub fn parse_kos<R: Read>(reader: R) -> Result<BTreeSet<KoId>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut kos = BTreeSet::new();
    for (index, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err),
            Err(err) => {
                warn!(row = index + 1, error = %err, "skipping unreadable row");
                continue;
            }
        };
        let Some(cell) = record.get(1) else {
            debug!(row = index + 1, "row has no KO column");
            continue;
        };
        for token in cell.split(',').map(str::trim) {
            if token.is_empty() || token == NO_HIT {
                continue;
            }
            match token.parse::<KoId>() {
                Ok(ko) => {
                    kos.insert(ko);
                }
                Err(_) => debug!(row = index + 1, token, "ignoring non-KO token"),
            }
        }
    }
    Ok(kos)
}
