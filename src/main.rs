use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use git_scrub::{
    DialoguerPrompter, Git, Orchestrator, ProtectConfig, ProtectionSource, ResetOptions,
    ResetPreview, RunOutcome, TerminalReporter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reset a git working tree to its last commit, keeping uncommitted work and protected files",
    long_about = None
)]
struct Args {
    /// Protect secret/environment files (.env, .env.*, *.env, at any depth)
    #[arg(long)]
    ignore_env_files: bool,

    /// With --ignore-env-files, protect every detected file without prompting
    #[arg(long)]
    skip_confirmation: bool,

    /// Protect every path matching this glob (repeatable)
    #[arg(long, value_name = "PATTERN")]
    ignore_glob_files: Vec<String>,

    /// Show what would be removed, but don't stash, remove or restore anything
    #[arg(long)]
    dry_run: bool,

    /// Show each removed and protected path
    #[arg(long, short)]
    verbose: bool,

    /// Run as if started in this directory
    #[arg(short = 'C', value_name = "DIR")]
    directory: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,git_scrub=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn print_preview(preview: &ResetPreview) {
    println!(
        "{}",
        format!("Dry run in {}", preview.root.display()).bold()
    );
    for path in &preview.protected {
        println!("  {} {}", "keep".green(), path);
    }
    for repo in &preview.nested_repositories {
        println!("  {} {}/ (nested repository)", "keep".green(), repo);
    }
    for entry in &preview.planned {
        let suffix = if entry.is_dir { "/" } else { "" };
        println!("  {} {}{}", "remove".red(), entry.rel, suffix);
    }
    println!(
        "Would remove {} entries and keep {} protected paths.",
        preview.planned.len(),
        preview.protected.len()
    );
    println!("Dry run mode: No files were deleted.");
}

fn run(args: &Args) -> Result<()> {
    let config = ProtectConfig::builtin()?;

    let workdir = match &args.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    let git = Git::new(workdir);

    let options = ResetOptions {
        sources: ProtectionSource::from_flags(
            &args.ignore_glob_files,
            args.ignore_env_files,
            args.skip_confirmation,
        ),
        dry_run: args.dry_run,
    };

    let mut prompter = DialoguerPrompter;
    let mut reporter = TerminalReporter::new(args.verbose);
    let mut orchestrator = Orchestrator::new(&config, &git, &mut prompter, &mut reporter);

    if let RunOutcome::Preview(preview) = orchestrator.run(&options)? {
        print_preview(&preview);
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::from(1)
        }
    }
}
