mod manifest;

pub use manifest::Manifest;

use anyhow::{Context, Result};
use reqsift_resolve::{PackageResolver, Resolution};
use reqsift_scan::{ExtractError, extract_imports, source_files};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_EXTENSION: &str = "py";

/// Fixed closing notice, printed after every successful generation. The
/// missing mapping table is a documented trade-off, not an oversight.
pub const ACCURACY_NOTICE: &str = "\
note: reqsift infers dependencies without a manual import-to-distribution
mapping table. When a top-level import name does not match the registered
distribution name and neither installed metadata nor the package manager can
bridge the gap, the package is skipped rather than guessed. Review the
generated file and add or correct entries by hand where needed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Silent,
    Minimal,
    Verbose,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub extension: String,
    pub stdlib_modules: BTreeSet<String>,
    pub local_modules: BTreeSet<String>,
    pub progress: ProgressMode,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            stdlib_modules: BTreeSet::new(),
            local_modules: BTreeSet::new(),
            progress: ProgressMode::Minimal,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImportScan {
    pub files_scanned: usize,
    pub parse_failures: Vec<PathBuf>,
    pub read_failures: Vec<PathBuf>,
    /// Third-party candidates: the global import-name union minus the
    /// standard-library and local-module sets.
    pub names: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ManifestBuild {
    pub manifest: Manifest,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub scan: ImportScan,
    pub manifest: Manifest,
    pub skipped: Vec<String>,
    pub output: PathBuf,
}

/// Walk the tree, extract imports from every source file, union them and
/// drop the excluded names. Per-file failures are warned about and cost that
/// file its contribution, nothing more.
pub fn scan_imports(options: &ScanOptions) -> ImportScan {
    if matches!(options.progress, ProgressMode::Verbose) {
        eprintln!("[reqsift] scanning {}", options.root.display());
    }

    let (files, walk_errors) = source_files(&options.root, &options.extension);
    for err in &walk_errors {
        eprintln!("warning: {err}");
    }

    let mut all_names = BTreeSet::new();
    let mut parse_failures = Vec::new();
    let mut read_failures = Vec::new();

    for file in &files {
        match extract_imports(file) {
            Ok(names) => all_names.extend(names),
            Err(err @ ExtractError::Syntax) => {
                eprintln!("warning: could not parse {}: {err}", file.display());
                parse_failures.push(file.clone());
            }
            Err(err) => {
                eprintln!("warning: skipping {}: {err}", file.display());
                read_failures.push(file.clone());
            }
        }
    }

    let names: BTreeSet<String> = all_names
        .into_iter()
        .filter(|name| {
            !options.stdlib_modules.contains(name) && !options.local_modules.contains(name)
        })
        .collect();

    if matches!(options.progress, ProgressMode::Verbose) {
        eprintln!(
            "[reqsift] {} files scanned, {} third-party import names",
            files.len(),
            names.len()
        );
    }

    ImportScan {
        files_scanned: files.len(),
        parse_failures,
        read_failures,
        names,
    }
}

/// Resolve every candidate name, in ascending order so that two import
/// names mapping to the same distribution always collide the same way.
/// Unresolvable names are skipped with a diagnostic, never written bare.
pub fn build_manifest<R>(resolver: &R, names: &BTreeSet<String>, progress: ProgressMode) -> ManifestBuild
where
    R: PackageResolver + ?Sized,
{
    let mut manifest = Manifest::default();
    let mut skipped = Vec::new();

    for name in names {
        if matches!(progress, ProgressMode::Verbose) {
            eprintln!("[reqsift] resolving {name}");
        }
        match resolver.resolve(name) {
            Resolution::Resolved(package) => {
                manifest.insert(package.name, package.version);
            }
            Resolution::Unresolved => {
                eprintln!(
                    "skipping '{name}': no installable distribution could be confidently identified"
                );
                skipped.push(name.clone());
            }
            Resolution::ToolUnavailable { command } => {
                eprintln!(
                    "error: `{command}` not found while resolving '{name}'; install it or point --pip at it"
                );
                skipped.push(name.clone());
            }
            Resolution::Failed { reason } => {
                eprintln!("error resolving '{name}': {reason}");
                skipped.push(name.clone());
            }
        }
    }

    ManifestBuild { manifest, skipped }
}

/// The whole pipeline: scan, resolve, render, write.
pub fn generate_manifest<R>(
    resolver: &R,
    options: &ScanOptions,
    output: &Path,
) -> Result<GenerateOutcome>
where
    R: PackageResolver + ?Sized,
{
    let scan = scan_imports(options);
    let build = build_manifest(resolver, &scan.names, options.progress);

    for name in build.manifest.missing_versions() {
        eprintln!("warning: no version known for '{name}'; listed without one");
    }

    fs::write(output, build.manifest.render())
        .with_context(|| format!("failed writing manifest {}", output.display()))?;

    if matches!(options.progress, ProgressMode::Verbose) {
        eprintln!(
            "[reqsift] wrote {} ({} packages, {} skipped)",
            output.display(),
            build.manifest.len(),
            build.skipped.len()
        );
    }

    Ok(GenerateOutcome {
        scan,
        manifest: build.manifest,
        skipped: build.skipped,
        output: output.to_path_buf(),
    })
}
