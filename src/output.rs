use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress lines on stderr, summary on stdout.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_run(result: &RunResult) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        let stats = &result.resolve;
        writeln!(stdout, "KO2Pathway summary")?;
        writeln!(
            stdout,
            "  KOs: {} (cache hits {}, fetched {}, failed {}, skipped {}, untitled pathways {})",
            result.ko_count,
            stats.cache_hits,
            stats.fetched,
            stats.failed,
            stats.skipped,
            stats.untitled
        )?;
        writeln!(
            stdout,
            "  pathways: {} found, {} excluded, {} reported",
            result.pathways_found,
            result.pathways_excluded,
            result.rows.len()
        )?;
        writeln!(stdout, "  summary: {}", result.output)?;
        writeln!(stdout, "  cache: {}", result.cache)?;
        if let Some(plot) = &result.plot {
            writeln!(stdout, "  chart: {plot}")?;
        }
        for row in result.rows.iter().take(5) {
            writeln!(
                stdout,
                "  {:>5}  {}  {}",
                row.ko_count, row.pathway_id, row.pathway_description
            )?;
        }
        Ok(())
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}
