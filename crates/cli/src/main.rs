mod artifacts;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use specref_core::lexer;
use specref_core::source::FileSystemProvider;
use specref_core::{IndexError, ProjectConfig};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Cross-document symbol index and reference resolver.
#[derive(Parser)]
#[command(
    name = "specref",
    version,
    about = "Cross-document symbol index and reference resolver"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a project: resolve every document and write the artifacts
    Build {
        /// Project directory containing specref.toml
        project: PathBuf,
        /// Directory receiving resolved trees, objects.json and paragraph-ids.json
        #[arg(long)]
        out: PathBuf,
        /// Number of read-phase workers (default: available parallelism)
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Check that paragraph ids are where they belong
    Lint {
        /// Project directory containing specref.toml
        project: PathBuf,
    },

    /// Tokenize a grammar-notation file
    Lex {
        /// Path to the grammar-notation text
        file: PathBuf,
    },

    /// Print the objects inventory of a project
    Objects {
        /// Project directory containing specref.toml
        project: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match cli.command {
        Commands::Build { project, out, jobs } => {
            cmd_build(&project, &out, jobs, cli.output, cli.quiet);
        }
        Commands::Lint { project } => {
            cmd_lint(&project, cli.output, cli.quiet);
        }
        Commands::Lex { file } => {
            cmd_lex(&file, cli.output, cli.quiet);
        }
        Commands::Objects { project } => {
            cmd_objects(&project, cli.output, cli.quiet);
        }
    }
}

/// Logs go to stderr so JSON on stdout stays machine-readable.
fn init_tracing(quiet: bool) {
    let default = if quiet { "specref=error" } else { "specref=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Load `specref.toml`, or exit.
fn load_config(project: &Path, output: OutputFormat, quiet: bool) -> ProjectConfig {
    match ProjectConfig::load(project) {
        Ok(config) => config,
        Err(e) => fail(&e, output, quiet),
    }
}

fn cmd_build(project: &Path, out: &Path, jobs: Option<usize>, output: OutputFormat, quiet: bool) {
    let config = load_config(project, output, quiet);
    let jobs = jobs.unwrap_or_else(default_jobs);
    let result = match specref_core::build(&config, project, &FileSystemProvider, jobs) {
        Ok(r) => r,
        Err(e) => fail(&e, output, quiet),
    };

    if let Err(e) = artifacts::write_all(out, &result) {
        report_error(&format!("error writing {}: {}", out.display(), e), output, quiet);
        process::exit(1);
    }

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "documents": result.documents.len(),
                "objects": result.objects.len(),
                "missing_references": result.diagnostics,
                "out": out.display().to_string(),
            });
            print_json(&summary);
        }
        OutputFormat::Text => {
            for d in &result.diagnostics {
                println!("warning: {}", d);
            }
            println!(
                "Built {} document(s), {} object(s), {} missing reference(s) -> {}",
                result.documents.len(),
                result.objects.len(),
                result.diagnostics.len(),
                out.display()
            );
        }
    }
}

fn cmd_lint(project: &Path, output: OutputFormat, quiet: bool) {
    let config = load_config(project, output, quiet);
    let documents =
        match specref_core::load_documents(&config, project, &FileSystemProvider) {
            Ok(d) => d,
            Err(e) => fail(&e, output, quiet),
        };
    let findings = specref_core::lint(&config, &documents);

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&serde_json::json!({ "findings": findings })),
            OutputFormat::Text => {
                for f in &findings {
                    println!("{}", f);
                }
                if findings.is_empty() {
                    println!("No paragraph id problems in {} document(s)", documents.len());
                } else {
                    println!("{} problem(s) found", findings.len());
                }
            }
        }
    }

    if !findings.is_empty() {
        process::exit(1);
    }
}

fn cmd_lex(file: &Path, output: OutputFormat, quiet: bool) {
    let src = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let err = IndexError::Source {
                path: file.display().to_string(),
                source: e,
            };
            fail(&err, output, quiet);
        }
    };
    let tokens = lexer::lex(&src);

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let tokens: Vec<serde_json::Value> = tokens
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "kind": t.token.kind_name(),
                        "content": t.token.content(),
                        "line": t.line,
                    })
                })
                .collect();
            print_json(&serde_json::Value::Array(tokens));
        }
        OutputFormat::Text => {
            for t in &tokens {
                println!("{}\t{}\t{:?}", t.line, t.token.kind_name(), t.token.content());
            }
        }
    }
}

fn cmd_objects(project: &Path, output: OutputFormat, quiet: bool) {
    let config = load_config(project, output, quiet);
    let result = match specref_core::build(&config, project, &FileSystemProvider, default_jobs())
    {
        Ok(r) => r,
        Err(e) => fail(&e, output, quiet),
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&result.objects),
        OutputFormat::Text => {
            for o in &result.objects {
                println!(
                    "{:<10} {:<24} {}{}#{} {:>2} {}",
                    o.kind.name(),
                    o.name,
                    o.document,
                    config.project.link_suffix,
                    o.anchor,
                    o.priority,
                    o.display_name
                );
            }
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    let pretty = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
    println!("{}", pretty);
}

/// Report an index error in the selected format and exit 1.
fn fail(e: &IndexError, output: OutputFormat, quiet: bool) -> ! {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", e);
            }
        }
    }
    process::exit(1);
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
