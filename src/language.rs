//! Language support - shared tree-sitter grammar configuration
//!
//! Centralized grammar selection for the supported frontend dialects.
//! ALL dialect-specific tree-sitter configuration goes here to avoid
//! duplication between the program loader and the tests.

use anyhow::Result;

/// Source dialect, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Ts,
    Tsx,
    Js,
    Jsx,
}

impl Dialect {
    /// Detect the dialect from a file extension
    pub fn from_extension(extension: &str) -> Option<Dialect> {
        match extension {
            "ts" | "mts" | "cts" => Some(Dialect::Ts),
            "tsx" => Some(Dialect::Tsx),
            "js" | "mjs" | "cjs" => Some(Dialect::Js),
            "jsx" => Some(Dialect::Jsx),
            _ => None,
        }
    }

    /// Detect the dialect from a relative file path
    pub fn from_path(path: &str) -> Option<Dialect> {
        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");
        Self::from_extension(extension)
    }

    /// Whether this dialect can carry JSX constructs
    pub fn supports_jsx(&self) -> bool {
        matches!(self, Dialect::Tsx | Dialect::Jsx)
    }

    /// Whether this is a plain JavaScript dialect (gated by `force_allow_js`)
    pub fn is_javascript(&self) -> bool {
        matches!(self, Dialect::Js | Dialect::Jsx)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Ts => write!(f, "typescript"),
            Dialect::Tsx => write!(f, "tsx"),
            Dialect::Js => write!(f, "javascript"),
            Dialect::Jsx => write!(f, "jsx"),
        }
    }
}

/// Get the tree-sitter language for a dialect
///
/// Single source of truth for grammar selection; used by the program loader
/// and by tests that parse snippets directly.
pub fn get_tree_sitter_language(dialect: Dialect) -> Result<tree_sitter::Language> {
    match dialect {
        Dialect::Ts => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Dialect::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        Dialect::Js | Dialect::Jsx => Ok(tree_sitter_javascript::LANGUAGE.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection_covers_all_dialects() {
        assert_eq!(Dialect::from_path("src/app.ts"), Some(Dialect::Ts));
        assert_eq!(Dialect::from_path("src/App.tsx"), Some(Dialect::Tsx));
        assert_eq!(Dialect::from_path("src/util.mjs"), Some(Dialect::Js));
        assert_eq!(Dialect::from_path("src/App.jsx"), Some(Dialect::Jsx));
        assert_eq!(Dialect::from_path("src/styles.css"), None);
    }

    #[test]
    fn every_dialect_has_a_grammar() {
        for dialect in [Dialect::Ts, Dialect::Tsx, Dialect::Js, Dialect::Jsx] {
            assert!(get_tree_sitter_language(dialect).is_ok());
        }
    }
}
