use std::path::PathBuf;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use ko2pathway::app::{App, RunOptions};
use ko2pathway::config::ConfigLoader;
use ko2pathway::error::Ko2PathwayError;
use ko2pathway::kegg::KeggHttpClient;
use ko2pathway::output::{ConsoleOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "ko2pathway")]
#[command(
    about = "Map KEGG Orthology (KO) terms to pathways, filter, summarize, and plot"
)]
#[command(version, author)]
struct Cli {
    /// Gene-to-KO table (tab-separated: gene, comma-separated KOs; may be .gz)
    #[arg(short, long)]
    input: PathBuf,

    /// File listing pathway description terms to exclude, one per line
    #[arg(short, long)]
    exclude: Option<PathBuf>,

    /// JSON cache of KO-to-pathway lookups
    #[arg(short, long)]
    cache: Option<Utf8PathBuf>,

    /// Output summary TSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render a circular bar chart of the top 20 pathways
    #[arg(short, long)]
    plot: bool,

    /// Chart file name (SVG)
    #[arg(long)]
    plotfile: Option<PathBuf>,

    /// JSON config file (defaults to ./ko2pathway.json when present)
    #[arg(long)]
    config: Option<String>,

    /// Use only cached lookups; never contact KEGG
    #[arg(long)]
    offline: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<Ko2PathwayError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &Ko2PathwayError) -> u8 {
    if error.is_input_error() { 2 } else { 1 }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let options = RunOptions {
        input: cli.input,
        exclude: cli.exclude,
        cache: cli.cache.unwrap_or(config.cache),
        output: cli
            .output
            .unwrap_or_else(|| config.output.into_std_path_buf()),
        plot: cli.plot.then(|| {
            cli.plotfile
                .unwrap_or_else(|| config.plotfile.into_std_path_buf())
        }),
        offline: cli.offline,
    };

    let kegg = KeggHttpClient::new(&config.kegg)?;
    let app = App::new(kegg);

    match output_mode {
        OutputMode::Json => {
            let result = app.run(&options, &JsonOutput)?;
            JsonOutput::print_run(&result).into_diagnostic()?;
        }
        OutputMode::Human => {
            let result = app.run(&options, &ConsoleOutput)?;
            ConsoleOutput::print_run(&result).into_diagnostic()?;
        }
    }
    Ok(())
}
