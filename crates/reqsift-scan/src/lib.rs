use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::{Node, Parser};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed reading source: {0}")]
    Read(#[from] std::io::Error),
    #[error("source contains syntax errors")]
    Syntax,
    #[error("python grammar is incompatible with the linked tree-sitter runtime: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),
}

/// Recursively collect every file under `root` whose extension matches.
///
/// No content or directory filtering happens here: virtualenv and vendored
/// trees are scanned like everything else. Walk errors (unreadable entries)
/// are returned alongside the hits so the caller can log them without
/// aborting the run.
pub fn source_files(root: &Path, extension: &str) -> (Vec<PathBuf>, Vec<walkdir::Error>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                let is_match = entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some(extension);
                if is_match {
                    files.push(entry.into_path());
                }
            }
            Err(err) => errors.push(err),
        }
    }

    (files, errors)
}

/// Extract the top-level imported module names from one Python file.
pub fn extract_imports(path: &Path) -> Result<BTreeSet<String>, ExtractError> {
    let source = fs::read_to_string(path)?;
    imports_from_source(&source)
}

/// Parse Python source and collect the first dotted segment of every import
/// target, at any nesting depth:
///
/// - `import a.b.c as d` records `a`
/// - `from x.y import z` records `x`
/// - `from .sibling import z` records `sibling`
/// - `from . import z` records nothing (no named module)
///
/// A tree with syntax errors yields `ExtractError::Syntax`; the caller treats
/// the file as contributing no imports.
pub fn imports_from_source(source: &str) -> Result<BTreeSet<String>, ExtractError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into())?;

    let tree = parser.parse(source, None).ok_or(ExtractError::Syntax)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(ExtractError::Syntax);
    }

    let mut names = BTreeSet::new();
    collect_imports(root, source.as_bytes(), &mut names);
    Ok(names)
}

fn collect_imports(node: Node, source: &[u8], names: &mut BTreeSet<String>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                let target = match name.kind() {
                    "aliased_import" => name.child_by_field_name("name"),
                    _ => Some(name),
                };
                if let Some(target) = target {
                    record_top_level(target, source, names);
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                match module.kind() {
                    // `from .pkg import x` still names a module after the
                    // dots; `from . import x` does not.
                    "relative_import" => {
                        let mut cursor = module.walk();
                        for child in module.named_children(&mut cursor) {
                            if child.kind() == "dotted_name" {
                                record_top_level(child, source, names);
                            }
                        }
                    }
                    _ => record_top_level(module, source, names),
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_imports(child, source, names);
    }
}

fn record_top_level(node: Node, source: &[u8], names: &mut BTreeSet<String>) {
    let Ok(text) = node.utf8_text(source) else {
        return;
    };
    if let Some(first) = text.split('.').next() {
        if !first.is_empty() {
            names.insert(first.to_string());
        }
    }
}
