use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use urlpattern_rs::url::UrlMeta;
use urlpattern_rs::{Config, PatternMaker, PatternMatchTree, PatternPath};

#[derive(Parser)]
#[command(name = "urlpatterncli", version, about = "Induces and matches compact URL patterns")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Induce patterns from a file of newline-separated URLs (stdin if `-f` omitted).
    Make {
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,
        #[arg(short = 'F', long = "formatter", value_enum, default_value_t = Formatter::Json)]
        formatter: Formatter,
        #[arg(short = 'c', long = "config")]
        config: Vec<PathBuf>,
        #[arg(short = 'L', long = "log-level", value_enum, default_value_t = LogLevel::Info)]
        log_level: LogLevel,
    },
    /// Match URLs (newline-separated, stdin if `-f` omitted) against a pattern dump produced by `make`.
    Match {
        #[arg(short = 'p', long = "patterns", required = true)]
        patterns: Vec<PathBuf>,
        #[arg(short = 'f', long = "file")]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Formatter {
    Json,
    Csv,
    Null,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Notset,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Notset => "off",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "error",
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Make {
            file,
            formatter,
            config,
            log_level,
        } => run_make(file.as_deref(), formatter, &config, log_level),
        Command::Match { patterns, file } => run_match(&patterns, file.as_deref()),
    }
}

fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(level.as_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tracing::instrument(skip(config_paths))]
fn run_make(file: Option<&std::path::Path>, formatter: Formatter, config_paths: &[PathBuf], log_level: LogLevel) -> Result<()> {
    init_tracing(log_level);

    let paths: Vec<&std::path::Path> = config_paths.iter().map(|p| p.as_path()).collect();
    let config = if paths.is_empty() {
        Config::default()
    } else {
        Config::load(&paths)?
    };

    let body = match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading urls from stdin")?;
            buf
        }
    };

    let mut maker = PatternMaker::new(config);
    let mut skipped = 0usize;
    let mut total = 0usize;
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        total += 1;
        if let Err(e) = maker.load(line) {
            skipped += 1;
            tracing::warn!(url = %line, error = %e, "skipping irregular url");
        }
    }
    maker.cluster_all()?;

    let paths = maker.dump();
    render(&paths, formatter);

    tracing::info!(total, skipped, retained = total - skipped, "ingest complete");
    Ok(())
}

fn render(paths: &[PatternPath], formatter: Formatter) {
    match formatter {
        Formatter::Json => {
            #[derive(serde::Serialize)]
            struct Row<'a> {
                segments: &'a [String],
                count: u64,
            }
            let rows: Vec<Row> = paths
                .iter()
                .map(|p| Row {
                    segments: &p.segments,
                    count: p.count,
                })
                .collect();
            match serde_json::to_string(&rows) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "failed to serialize patterns as json"),
            }
        }
        Formatter::Csv => {
            for path in paths {
                println!("{},{}", path.segments.join("/"), path.count);
            }
        }
        Formatter::Null => {}
    }
}

/// Reparses a dump line of the form `seg/seg/seg (count)` back into a
/// `PatternPath`. Lossy (query/fragment shape is not preserved), matching
/// `PatternMatchTree`'s own sketch status. A line whose pattern fails to
/// compile is a fatal error (spec's "errors from pattern-file loading are
/// fatal"), not a line to skip.
fn run_match(pattern_files: &[PathBuf], url_file: Option<&std::path::Path>) -> Result<()> {
    let mut tree = PatternMatchTree::new();

    for patterns_path in pattern_files {
        let body =
            fs::read_to_string(patterns_path).with_context(|| format!("reading {}", patterns_path.display()))?;

        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((segs, count_str)) = line.rsplit_once(' ') else {
                anyhow::bail!("malformed pattern line: {line}");
            };
            let count = count_str
                .trim_matches(|c| c == '(' || c == ')')
                .parse()
                .unwrap_or(0);
            let segments: Vec<String> = segs.split('/').map(str::to_string).collect();
            tree.add(PatternPath {
                meta: UrlMeta::new(segments.len(), Vec::new(), false),
                segments,
                count,
            })
            .context("loading pattern file")?;
        }
    }

    let body = match url_file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("reading urls from stdin")?;
            buf
        }
    };
    let mut any_match = false;
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match tree.match_url(line)? {
            Some(hit) => {
                any_match = true;
                println!("{line} -> {}", hit.source);
            }
            None => println!("{line} -> no match"),
        }
    }

    if !any_match {
        std::process::exit(1);
    }
    Ok(())
}
