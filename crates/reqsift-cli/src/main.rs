use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reqsift_config::{
    CliOverrides, EnvConfig, ProgressSetting, ScanDefaults, load_file_config,
    resolve_scan_defaults,
};
use reqsift_core::{
    ACCURACY_NOTICE, ProgressMode, ScanOptions, generate_manifest, scan_imports,
};
use reqsift_resolve::{DistInfoRegistry, FallbackResolver, PipShowProbe};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "reqsift",
    version,
    about = "Best-effort requirements manifest inference for Python source trees"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Root directory to scan (defaults to the current directory).
    root: Option<PathBuf>,
    /// Config file path (defaults to ./reqsift.json when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Exclude NAME as a local project module (repeatable).
    #[arg(long = "local-module", value_name = "NAME")]
    local_modules: Vec<String>,
    /// Exclude NAME as a standard-library module (repeatable).
    #[arg(long = "stdlib-module", value_name = "NAME")]
    stdlib_modules: Vec<String>,
    #[arg(long)]
    verbose: bool,
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan a source tree and write a best-effort requirements manifest.
    Generate {
        #[command(flatten)]
        scan: ScanArgs,
        /// Manifest path to write.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Package-manager executable for the fallback lookup.
        #[arg(long)]
        pip: Option<String>,
        /// Interpreter asked for site-packages locations when none are given.
        #[arg(long)]
        python: Option<String>,
        /// Explicit site-packages directory (repeatable; disables discovery).
        #[arg(long = "site-packages", value_name = "DIR")]
        site_packages: Vec<PathBuf>,
    },
    /// List the third-party import names a generate run would try to resolve.
    Imports {
        #[command(flatten)]
        scan: ScanArgs,
    },
}

fn load_defaults(scan: &ScanArgs, cli: CliOverrides) -> Result<ScanDefaults> {
    let cwd = std::env::current_dir().context("failed resolving current directory")?;
    let file_cfg = load_file_config(scan.config.as_deref(), &cwd)?;
    let env_cfg = EnvConfig::from_current_env();
    Ok(resolve_scan_defaults(&cli, &env_cfg, file_cfg.as_ref()))
}

fn overrides_from(scan: &ScanArgs) -> CliOverrides {
    CliOverrides {
        local_modules: scan.local_modules.clone(),
        stdlib_modules: scan.stdlib_modules.clone(),
        verbose: scan.verbose.then_some(true),
        quiet: scan.quiet.then_some(true),
        ..CliOverrides::default()
    }
}

fn progress_mode(setting: ProgressSetting) -> ProgressMode {
    match setting {
        ProgressSetting::Auto => ProgressMode::Minimal,
        ProgressSetting::Silent => ProgressMode::Silent,
        ProgressSetting::Verbose => ProgressMode::Verbose,
    }
}

fn scan_options(scan: &ScanArgs, defaults: &ScanDefaults) -> ScanOptions {
    let mut options = ScanOptions::new(scan.root.clone().unwrap_or_else(|| PathBuf::from(".")));
    options.stdlib_modules = defaults.stdlib_modules.clone();
    options.local_modules = defaults.local_modules.clone();
    options.progress = progress_mode(defaults.progress);
    options
}

fn generate_command(
    scan: ScanArgs,
    output: Option<PathBuf>,
    pip: Option<String>,
    python: Option<String>,
    site_packages: Vec<PathBuf>,
) -> Result<()> {
    let mut overrides = overrides_from(&scan);
    overrides.output = output;
    overrides.pip_command = pip;
    overrides.python_command = python;
    overrides.site_packages = site_packages;
    let defaults = load_defaults(&scan, overrides)?;

    let registry = match &defaults.site_packages {
        Some(paths) => DistInfoRegistry::scan(paths),
        None => DistInfoRegistry::discover(&defaults.python_command),
    };
    if matches!(defaults.progress, ProgressSetting::Verbose) {
        eprintln!(
            "[reqsift] {} installed distributions indexed",
            registry.len()
        );
    }

    let resolver = FallbackResolver {
        registry,
        probe: PipShowProbe::new(defaults.pip_command.clone()),
    };

    let options = scan_options(&scan, &defaults);
    let outcome = generate_manifest(&resolver, &options, &defaults.output)?;

    println!(
        "Generated {} ({} packages from {} files, {} imports skipped)",
        outcome.output.display(),
        outcome.manifest.len(),
        outcome.scan.files_scanned,
        outcome.skipped.len()
    );
    println!();
    println!("{ACCURACY_NOTICE}");

    Ok(())
}

fn imports_command(scan: ScanArgs) -> Result<()> {
    let overrides = overrides_from(&scan);
    let defaults = load_defaults(&scan, overrides)?;

    let options = scan_options(&scan, &defaults);
    let found = scan_imports(&options);
    for name in &found.names {
        println!("{name}");
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            scan,
            output,
            pip,
            python,
            site_packages,
        } => generate_command(scan, output, pip, python, site_packages),
        Commands::Imports { scan } => imports_command(scan),
    }
}
