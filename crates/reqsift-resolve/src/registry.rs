use crate::{RegistryLookup, ResolvedPackage};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// PEP 503 name normalization: lowercase, runs of `-`, `_` and `.` fold to
/// a single `-`. This is the comparison Python's own metadata lookup
/// applies; it is still a one-name-to-one-name match, not an alias table.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !last_was_sep {
                out.push('-');
                last_was_sep = true;
            }
        } else {
            out.extend(ch.to_lowercase());
            last_was_sep = false;
        }
    }
    out
}

/// Index of installed distributions, built once by scanning site-packages
/// directories for `*.dist-info/METADATA` and `*.egg-info/PKG-INFO` files.
/// Unreadable directories and malformed metadata are skipped silently; a
/// missing interpreter just means an empty registry and every lookup falls
/// through to the probe tier.
#[derive(Debug, Default)]
pub struct DistInfoRegistry {
    packages: Vec<(String, ResolvedPackage)>,
}

impl DistInfoRegistry {
    pub fn scan(site_packages: &[PathBuf]) -> Self {
        let mut packages = Vec::new();

        for dir in site_packages {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let metadata_path = if file_name.ends_with(".dist-info") {
                    path.join("METADATA")
                } else if file_name.ends_with(".egg-info") {
                    path.join("PKG-INFO")
                } else {
                    continue;
                };
                let Ok(raw) = fs::read_to_string(&metadata_path) else {
                    continue;
                };
                if let Some(package) = parse_core_metadata(&raw) {
                    packages.push((normalize_name(&package.name), package));
                }
            }
        }

        packages.sort_by(|a, b| a.0.cmp(&b.0));
        Self { packages }
    }

    /// Build the index from discovered site-packages locations.
    pub fn discover(python_command: &str) -> Self {
        Self::scan(&discover_site_packages(python_command))
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

impl RegistryLookup for DistInfoRegistry {
    fn lookup(&self, import_name: &str) -> Option<ResolvedPackage> {
        let wanted = normalize_name(import_name);
        self.packages
            .iter()
            .find(|(normalized, _)| *normalized == wanted)
            .map(|(_, package)| package.clone())
    }
}

/// Locate site-packages directories: an active virtualenv first, otherwise
/// ask the interpreter once. Any failure degrades to "no directories".
pub fn discover_site_packages(python_command: &str) -> Vec<PathBuf> {
    if let Ok(venv) = std::env::var("VIRTUAL_ENV") {
        let found = virtualenv_site_packages(Path::new(&venv));
        if !found.is_empty() {
            return found;
        }
    }
    interpreter_site_packages(python_command)
}

fn virtualenv_site_packages(venv: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();

    if let Ok(entries) = fs::read_dir(venv.join("lib")) {
        for entry in entries.flatten() {
            let is_python_dir = entry.file_name().to_string_lossy().starts_with("python");
            let candidate = entry.path().join("site-packages");
            if is_python_dir && candidate.is_dir() {
                found.push(candidate);
            }
        }
    }

    let windows_layout = venv.join("Lib").join("site-packages");
    if windows_layout.is_dir() {
        found.push(windows_layout);
    }

    found.sort();
    found
}

fn interpreter_site_packages(python_command: &str) -> Vec<PathBuf> {
    const SNIPPET: &str =
        "import json, site; print(json.dumps(site.getsitepackages() + [site.getusersitepackages()]))";

    let output = match Command::new(python_command).args(["-c", SNIPPET]).output() {
        Ok(output) if output.status.success() => output,
        _ => return Vec::new(),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let reported: Vec<String> = serde_json::from_str(stdout.trim()).unwrap_or_default();
    reported
        .into_iter()
        .map(PathBuf::from)
        .filter(|path| path.is_dir())
        .collect()
}

/// Core metadata is email-header formatted; the fields of interest sit in
/// the header block before the first blank line.
fn parse_core_metadata(raw: &str) -> Option<ResolvedPackage> {
    let mut name: Option<String> = None;
    let mut version: Option<String> = None;

    for line in raw.lines() {
        if line.trim().is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Name:") {
            name.get_or_insert_with(|| value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Version:") {
            version.get_or_insert_with(|| value.trim().to_string());
        }
    }

    name.map(|name| ResolvedPackage { name, version })
}
