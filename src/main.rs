use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use tracing::debug;

use buildsift::{
    detect_width, run, FilterConfig, FormatConfig, SiftConfig, SiftError, DEFAULT_INDENT,
};

#[derive(Parser)]
#[command(name = "buildsift")]
#[command(about = "Show the failed job sections of a build log with long command lines wrapped")]
#[command(version)]
struct Args {
    /// Build log to read (default: stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output width (default: $COLUMNS, then the terminal, then 80)
    #[arg(short = 'w', long)]
    width: Option<usize>,

    /// Indent for continuation lines
    #[arg(long, default_value_t = DEFAULT_INDENT)]
    indent: usize,

    /// Substring that starts a job output section
    #[arg(long, value_name = "TEXT")]
    start_marker: Option<String>,

    /// Line prefix that ends a job output section
    #[arg(long, value_name = "TEXT")]
    end_marker: Option<String>,

    /// Reformat every line instead of only failed job sections
    #[arg(long)]
    all: bool,

    /// Write failed job sections without reformatting
    #[arg(long)]
    no_format: bool,

    /// Debug mode - show processing details on stderr
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn filter_config(&self) -> FilterConfig {
        let mut config = FilterConfig::default();
        if let Some(path) = &self.input {
            config.source_name = path.display().to_string();
        }
        if let Some(marker) = &self.start_marker {
            config.start_marker = marker.clone();
        }
        if let Some(marker) = &self.end_marker {
            config.end_marker = marker.clone();
        }
        config
    }

    fn format_config(&self) -> FormatConfig {
        let width = match self.width {
            Some(width) => width,
            None => {
                let columns = std::env::var("COLUMNS").ok();
                let (width, source) = detect_width(columns.as_deref());
                debug!(width, ?source, "detected output width");
                width
            }
        };
        FormatConfig {
            width,
            indent: self.indent,
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run_cli(args) {
        eprintln!("buildsift: {}", e);
        std::process::exit(1);
    }
}

fn run_cli(args: Args) -> anyhow::Result<()> {
    let config = SiftConfig {
        filter: args.filter_config(),
        format: args.format_config(),
        extract: !args.all,
        reformat: !args.no_format,
        ..Default::default()
    };

    let input: Box<dyn BufRead + Send> = match &args.input {
        Some(path) => {
            let file = File::open(path).map_err(|source| SiftError::Open {
                path: path.clone(),
                source,
            })?;
            Box::new(BufReader::new(file))
        }
        // StdinLock is not Send, and the extractor thread owns the reader
        None => Box::new(BufReader::new(io::stdin())),
    };
    let output = BufWriter::new(io::stdout());

    debug!(source = %config.filter.source_name, width = config.format.width, "starting");
    run(config, input, output)?;
    Ok(())
}
