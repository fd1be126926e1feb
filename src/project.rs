//! Parsed program representation
//!
//! The narrow contract between the core and its collaborators: the caller
//! hands over a deterministically sorted, filtered list of candidate source
//! files plus resolved compiler options; [`SourceProgram::parse`] turns that
//! into an immutable, fully-parsed in-memory program. All file reads happen
//! before this point; extraction never touches the filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tree_sitter::{Parser, Tree};

use crate::error::ExtractError;
use crate::language::{get_tree_sitter_language, Dialect};

/// Resolved compiler options handed in by the tsconfig-loading collaborator
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// `baseUrl`, relative to the project root
    pub base_url: Option<String>,
    /// `paths` mappings; keys and substitutions may carry one `*` wildcard
    pub paths: BTreeMap<String, Vec<String>>,
}

/// One parsed source file
pub struct SourceFile {
    /// Project-relative path with `/` separators
    pub relative_path: String,
    pub content: String,
    pub dialect: Dialect,
    pub tree: Tree,
}

impl SourceFile {
    /// Directory part of the relative path ("" for files at the root)
    pub fn directory(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(idx) => &self.relative_path[..idx],
            None => "",
        }
    }
}

/// An immutable, fully-parsed program: the unit one extraction runs over
pub struct SourceProgram {
    pub root: PathBuf,
    pub compiler_options: CompilerOptions,
    files: Vec<SourceFile>,
    /// All in-project paths, including declaration-only files (for resolution)
    file_index: BTreeSet<String>,
    declaration_files: BTreeSet<String>,
}

impl SourceProgram {
    /// Parse a sorted, filtered file list into a program
    ///
    /// `max_files` truncates to the lexicographically first N non-declaration
    /// files; truncation happens before parsing so the cut is deterministic.
    /// `.d.ts` files are never parsed - they stay in the file index so the
    /// import resolver can recognize (and discard) resolutions into them.
    pub fn parse(
        root: impl Into<PathBuf>,
        files: Vec<(String, String)>,
        compiler_options: CompilerOptions,
        max_files: Option<usize>,
    ) -> Result<SourceProgram, ExtractError> {
        let root = root.into();
        if files.is_empty() {
            return Err(ExtractError::Config(format!(
                "no candidate source files under {}",
                root.display()
            )));
        }

        let mut sorted = files;
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut file_index = BTreeSet::new();
        let mut declaration_files = BTreeSet::new();
        let mut parsed = Vec::new();
        let mut parsers: BTreeMap<String, Parser> = BTreeMap::new();

        for (relative_path, content) in sorted {
            file_index.insert(relative_path.clone());

            if is_declaration_path(&relative_path) {
                declaration_files.insert(relative_path);
                continue;
            }

            if let Some(limit) = max_files {
                if parsed.len() >= limit {
                    tracing::debug!("max_files={} reached, skipping {}", limit, relative_path);
                    continue;
                }
            }

            let Some(dialect) = Dialect::from_path(&relative_path) else {
                tracing::warn!("Skipping file with unsupported extension: {}", relative_path);
                continue;
            };

            let parser = match parsers.entry(dialect.to_string()) {
                std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::btree_map::Entry::Vacant(entry) => {
                    let mut parser = Parser::new();
                    let language =
                        get_tree_sitter_language(dialect).map_err(ExtractError::Internal)?;
                    parser
                        .set_language(&language)
                        .map_err(|e| ExtractError::Config(format!(
                            "failed to configure {} parser: {}",
                            dialect, e
                        )))?;
                    entry.insert(parser)
                }
            };

            let tree = parser.parse(&content, None).ok_or(ExtractError::Parse {
                file: relative_path.clone(),
            })?;

            parsed.push(SourceFile {
                relative_path,
                content,
                dialect,
                tree,
            });
        }

        tracing::debug!(
            "Parsed program: {} files ({} declaration-only)",
            parsed.len(),
            declaration_files.len()
        );

        Ok(SourceProgram {
            root,
            compiler_options,
            files: parsed,
            file_index,
            declaration_files,
        })
    }

    /// Parsed, non-declaration files in lexicographic path order
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Whether any file in the program carries a JSX-capable extension
    pub fn has_jsx_files(&self) -> bool {
        self.files.iter().any(|f| f.dialect.supports_jsx())
    }

    /// Whether a project-relative path exists in the program (including `.d.ts`)
    pub fn contains(&self, relative_path: &str) -> bool {
        self.file_index.contains(relative_path)
    }

    /// Whether a path is a declaration-only file
    pub fn is_declaration(&self, relative_path: &str) -> bool {
        self.declaration_files.contains(relative_path)
    }
}

fn is_declaration_path(path: &str) -> bool {
    path.ends_with(".d.ts") || path.ends_with(".d.mts") || path.ends_with(".d.cts")
}
