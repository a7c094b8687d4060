use std::path::{Component, Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use vbscope_core::{Analyzer, AnalyzerConfig, ReportFormat, StructuralReport};


static TRACE_INIT: Once = Once::new();
const TRACE_ENV: &str = "VBSCOPE_TRACE";
const DEFAULT_TRACE_FILTER: &str = "vbscope_core=debug,vbscope=info";

#[derive(Debug, Parser)]
#[command(
    name = "vbscope",
    author,
    version,
    about = "Structural analysis for VBA source files",
    long_about = None,
    after_help = "Set VBSCOPE_TRACE=1 (or a filter expression) to log pipeline stages to stderr."
)]
struct CliArgs {
    /// Subcommands like `analyze FILE`
    #[command(subcommand)]
    command: Option<Commands>,

    /// If no subcommand, analyze this file and print the report as JSON
    #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Text,
}

impl From<OutputFormat> for ReportFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Yaml => ReportFormat::Yaml,
            OutputFormat::Text => ReportFormat::Text,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the structural report of a VBA source file.
    Analyze {
        /// VBA source file
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
        /// Analyzer config (TOML)
        #[arg(long, value_name = "CONFIG", value_parser = parse_sanitized_path)]
        config: Option<PathBuf>,
    },
    /// Print diagnostics only; exit with status 1 if any of them is an error.
    Check {
        /// VBA source file
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Analyzer config (TOML)
        #[arg(long, value_name = "CONFIG", value_parser = parse_sanitized_path)]
        config: Option<PathBuf>,
    },
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", path.display(), e))
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var(TRACE_ENV) {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalyzerConfig> {
    let config = match path {
        Some(p) => AnalyzerConfig::load(p)?,
        None => AnalyzerConfig::default(),
    };
    config.with_env_overrides()
}

fn analyze_file(path: &Path, config: Option<&Path>) -> anyhow::Result<StructuralReport> {
    let analyzer = Analyzer::new(load_config(config)?);
    let source = read_file_content(path)?;
    tracing::info!(
        path = %path.display(),
        bytes = source.len(),
        strict = analyzer.config().strict_undeclared,
        "analyzing"
    );
    analyzer
        .analyze(&source)
        .with_context(|| format!("Failed to analyze '{}'", path.display()))
}

fn run_analyze(path: &Path, format: OutputFormat, compact: bool, config: Option<&Path>) -> anyhow::Result<()> {
    let report = analyze_file(path, config)?;
    let out = report.render(format.into(), compact)?;
    print!("{}", out);
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// One line per diagnostic followed by a summary line.
fn format_check(path: &Path, report: &StructuralReport) -> String {
    let mut out = String::new();
    for diag in &report.diagnostics {
        out.push_str(&format!("{}:{}\n", path.display(), diag));
    }
    out.push_str(&format!(
        "{} error(s), {} warning(s)\n",
        report.error_count(),
        report.warning_count()
    ));
    out
}

fn run_check(path: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let report = analyze_file(path, config)?;
    print!("{}", format_check(path, &report));
    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { command, file } = CliArgs::parse();

    match (command, file) {
        (
            Some(Commands::Analyze {
                file,
                format,
                compact,
                config,
            }),
            _,
        ) => run_analyze(&file, format, compact, config.as_deref()),
        (Some(Commands::Check { file, config }), _) => run_check(&file, config.as_deref()),
        (None, Some(file)) => run_analyze(&file, OutputFormat::Json, false, None),
        (None, None) => {
            CliArgs::command().print_help()?;
            Ok(())
        }
    }
}
