use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level standard-library module names that are never installable and
/// must never appear in a generated manifest. Extendable through
/// `extra_stdlib_modules` in `reqsift.json` or `--stdlib-module`.
pub const DEFAULT_STDLIB_MODULES: &[&str] = &[
    "__future__",
    "abc",
    "argparse",
    "array",
    "ast",
    "asyncio",
    "base64",
    "binascii",
    "bz2",
    "cProfile",
    "cmd",
    "collections",
    "configparser",
    "contextlib",
    "copy",
    "crypt",
    "csv",
    "dataclasses",
    "datetime",
    "decimal",
    "distutils",
    "doctest",
    "email",
    "ensurepip",
    "enum",
    "fractions",
    "ftplib",
    "functools",
    "getopt",
    "glob",
    "gzip",
    "hashlib",
    "hmac",
    "html",
    "http",
    "imaplib",
    "importlib",
    "inspect",
    "io",
    "itertools",
    "json",
    "lib2to3",
    "locale",
    "logging",
    "lzma",
    "math",
    "mimetypes",
    "multiprocessing",
    "nntplib",
    "os",
    "pathlib",
    "pdb",
    "pip",
    "poplib",
    "profile",
    "pydoc",
    "random",
    "re",
    "secrets",
    "setuptools",
    "shlex",
    "shutil",
    "site",
    "smtplib",
    "sndhdr",
    "socket",
    "ssl",
    "statistics",
    "string",
    "struct",
    "subprocess",
    "sys",
    "tarfile",
    "tempfile",
    "test",
    "threading",
    "time",
    "tkinter",
    "trace",
    "traceback",
    "typing",
    "unittest",
    "urllib",
    "uuid",
    "venv",
    "warnings",
    "wave",
    "webbrowser",
    "xml",
    "zipfile",
    "zlib",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressSetting {
    Auto,
    Silent,
    Verbose,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub output: Option<PathBuf>,
    pub pip_command: Option<String>,
    pub python_command: Option<String>,
    pub site_packages: Option<Vec<PathBuf>>,
    pub local_modules: Option<Vec<String>>,
    pub extra_stdlib_modules: Option<Vec<String>>,
    pub progress: Option<ProgressSetting>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvConfig {
    pub output: Option<PathBuf>,
    pub pip_command: Option<String>,
    pub python_command: Option<String>,
    pub progress: Option<ProgressSetting>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    pub output: Option<PathBuf>,
    pub pip_command: Option<String>,
    pub python_command: Option<String>,
    pub site_packages: Vec<PathBuf>,
    pub local_modules: Vec<String>,
    pub stdlib_modules: Vec<String>,
    pub verbose: Option<bool>,
    pub quiet: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDefaults {
    pub output: PathBuf,
    pub pip_command: String,
    pub python_command: String,
    /// Explicit site-packages directories. `None` means the resolver should
    /// discover them itself.
    pub site_packages: Option<Vec<PathBuf>>,
    pub local_modules: BTreeSet<String>,
    pub stdlib_modules: BTreeSet<String>,
    pub progress: ProgressSetting,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            output: PathBuf::from("requirements.txt"),
            pip_command: "pip".to_string(),
            python_command: "python3".to_string(),
            site_packages: None,
            local_modules: BTreeSet::new(),
            stdlib_modules: DEFAULT_STDLIB_MODULES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            progress: ProgressSetting::Auto,
        }
    }
}

pub fn load_file_config(explicit_path: Option<&Path>, cwd: &Path) -> Result<Option<FileConfig>> {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = cwd.join("reqsift.json");
            if !candidate.exists() {
                return Ok(None);
            }
            candidate
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed reading config file {}", path.display()))?;
    let parsed: FileConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing config file {}", path.display()))?;
    Ok(Some(parsed))
}

impl EnvConfig {
    pub fn from_current_env() -> Self {
        Self {
            output: env::var("REQSIFT_OUTPUT").ok().map(PathBuf::from),
            pip_command: env::var("REQSIFT_PIP").ok(),
            python_command: env::var("REQSIFT_PYTHON").ok(),
            progress: env::var("REQSIFT_PROGRESS")
                .ok()
                .and_then(|v| parse_progress(&v)),
        }
    }
}

pub fn resolve_scan_defaults(
    cli: &CliOverrides,
    env_cfg: &EnvConfig,
    file_cfg: Option<&FileConfig>,
) -> ScanDefaults {
    let base = ScanDefaults::default();

    let output = cli
        .output
        .clone()
        .or_else(|| env_cfg.output.clone())
        .or_else(|| file_cfg.and_then(|c| c.output.clone()))
        .unwrap_or(base.output);

    let pip_command = cli
        .pip_command
        .clone()
        .or_else(|| env_cfg.pip_command.clone())
        .or_else(|| file_cfg.and_then(|c| c.pip_command.clone()))
        .unwrap_or(base.pip_command);

    let python_command = cli
        .python_command
        .clone()
        .or_else(|| env_cfg.python_command.clone())
        .or_else(|| file_cfg.and_then(|c| c.python_command.clone()))
        .unwrap_or(base.python_command);

    let site_packages = if cli.site_packages.is_empty() {
        file_cfg.and_then(|c| c.site_packages.clone())
    } else {
        Some(cli.site_packages.clone())
    };

    // List-valued settings extend rather than replace each other.
    let mut stdlib_modules = base.stdlib_modules;
    if let Some(extra) = file_cfg.and_then(|c| c.extra_stdlib_modules.as_ref()) {
        stdlib_modules.extend(extra.iter().cloned());
    }
    stdlib_modules.extend(cli.stdlib_modules.iter().cloned());

    let mut local_modules = base.local_modules;
    if let Some(local) = file_cfg.and_then(|c| c.local_modules.as_ref()) {
        local_modules.extend(local.iter().cloned());
    }
    local_modules.extend(cli.local_modules.iter().cloned());

    let mut progress = env_cfg
        .progress
        .or(file_cfg.and_then(|c| c.progress))
        .unwrap_or(base.progress);

    if cli.verbose == Some(true) {
        progress = ProgressSetting::Verbose;
    }
    if cli.quiet == Some(true) {
        progress = ProgressSetting::Silent;
    }

    ScanDefaults {
        output,
        pip_command,
        python_command,
        site_packages,
        local_modules,
        stdlib_modules,
        progress,
    }
}

fn parse_progress(input: &str) -> Option<ProgressSetting> {
    match input.trim().to_ascii_lowercase().as_str() {
        "auto" => Some(ProgressSetting::Auto),
        "silent" => Some(ProgressSetting::Silent),
        "verbose" => Some(ProgressSetting::Verbose),
        _ => None,
    }
}
