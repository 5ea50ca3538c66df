use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use module_aggregator::{
    AggregateError, AggregateOptions, ContentService, ContentType, ModuleScanner, RewriteMode,
    ServiceConfig,
};

#[derive(Parser)]
#[command(
    name = "module-aggregate",
    version,
    about = "Bundle an ES6 module tree into a single script"
)]
struct Cli {
    /// Directory module keys are relative to
    base_dir: PathBuf,

    /// Entry module, relative to the base directory
    entry: String,

    /// Comma-separated profiles (e.g. "debug,nocache")
    profiles: Option<String>,

    /// Print the scanned module registry as JSON instead of the bundle
    #[arg(long)]
    scan: bool,

    /// How import call sites are rewritten
    #[arg(long, value_enum, default_value = "textual")]
    rewrite: RewriteArg,

    /// Do not append the entry invocation
    #[arg(long)]
    no_invoke: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RewriteArg {
    Textual,
    ShadowAware,
}

impl From<RewriteArg> for RewriteMode {
    fn from(arg: RewriteArg) -> Self {
        match arg {
            RewriteArg::Textual => RewriteMode::Textual,
            RewriteArg::ShadowAware => RewriteMode::ShadowAware,
        }
    }
}

fn report(err: &AggregateError) -> ExitCode {
    eprintln!("error[{}]: {}", err.code(), err);
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = AggregateOptions {
        rewrite: cli.rewrite.into(),
        invoke_entry: !cli.no_invoke,
    };

    let output = if cli.scan {
        let scanner = ModuleScanner::with_rewrite(&cli.base_dir, options.rewrite);
        let registry = match scanner.scan(cli.entry.trim_start_matches('/')) {
            Ok(registry) => registry,
            Err(err) => return report(&err),
        };
        match serde_json::to_string_pretty(&registry) {
            Ok(json) => json + "\n",
            Err(err) => {
                eprintln!("error: {}", err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        let config = ServiceConfig {
            base_dir: cli.base_dir.clone(),
            base_profiles: Vec::new(),
            options,
        };
        let service = ContentService::new(config, ContentType::Javascript);
        match service.get_content(&cli.entry, cli.profiles.as_deref()) {
            Ok(content) => content.body.clone(),
            Err(err) => return report(&err),
        }
    };

    if let Err(err) = io::stdout().lock().write_all(output.as_bytes()) {
        eprintln!("error: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
