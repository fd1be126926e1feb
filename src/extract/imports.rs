//! Import graph resolver
//!
//! Walks ES `import`/`export ... from` statements and CommonJS `require(...)`
//! calls with string-literal specifiers, resolves each specifier against the
//! project's module-resolution rules, and emits DEPENDENCY relations between
//! synthetic module classifiers. Relative specifiers that fail to resolve
//! become `unresolvedImport` findings; bare specifiers are assumed external
//! and fail silently.

use std::collections::{BTreeMap, HashSet};

use tree_sitter::Node;

use crate::extract::context::ExtractionContext;
use crate::extract::helpers::{find_nodes_by_type, node_text, start_line, strip_quotes};
use crate::ir::model::{RelationKind, SourceRef, TaggedValue};
use crate::project::{SourceFile, SourceProgram};
use crate::report::FindingKind;

/// Extensions probed when a specifier does not name a file directly
const PROBE_EXTENSIONS: [&str; 5] = [".ts", ".tsx", ".js", ".jsx", ".d.ts"];

/// Run the import graph pass over every non-declaration file
pub fn run(program: &SourceProgram, ctx: &mut ExtractionContext) {
    // (origin, from, to, specifier) dedup across the whole program
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();

    for file in program.files() {
        for (origin, specifier, node) in collect_specifiers(file) {
            record_edge(program, ctx, file, origin, &specifier, &node, &mut seen);
        }
    }
}

/// Specifier origins, carried into relation tagged values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOrigin {
    Import,
    Require,
}

impl std::fmt::Display for ImportOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportOrigin::Import => write!(f, "import"),
            ImportOrigin::Require => write!(f, "require"),
        }
    }
}

/// Collect every string-literal module specifier in a file
fn collect_specifiers<'a>(file: &'a SourceFile) -> Vec<(ImportOrigin, String, Node<'a>)> {
    let root = file.tree.root_node();
    let mut found = Vec::new();

    for node in find_nodes_by_type(&root, "import_statement") {
        if let Some(source) = node.child_by_field_name("source") {
            let specifier = strip_quotes(&node_text(&file.content, &source));
            found.push((ImportOrigin::Import, specifier, node));
        }
    }

    // export ... from '...' re-exports participate in the import graph
    for node in find_nodes_by_type(&root, "export_statement") {
        if let Some(source) = node.child_by_field_name("source") {
            let specifier = strip_quotes(&node_text(&file.content, &source));
            found.push((ImportOrigin::Import, specifier, node));
        }
    }

    for node in find_nodes_by_type(&root, "call_expression") {
        let Some(function) = node.child_by_field_name("function") else {
            continue;
        };
        if function.kind() != "identifier" || node_text(&file.content, &function) != "require" {
            continue;
        }
        let Some(arguments) = node.child_by_field_name("arguments") else {
            continue;
        };
        // Only single string-literal arguments qualify
        let literals = find_nodes_by_type(&arguments, "string");
        if arguments.named_child_count() == 1 && literals.len() == 1 {
            let specifier = strip_quotes(&node_text(&file.content, &literals[0]));
            found.push((ImportOrigin::Require, specifier, node));
        }
    }

    found
}

fn record_edge(
    program: &SourceProgram,
    ctx: &mut ExtractionContext,
    file: &SourceFile,
    origin: ImportOrigin,
    specifier: &str,
    node: &Node,
    seen: &mut HashSet<(String, String, String, String)>,
) {
    match resolve_specifier(program, &file.relative_path, specifier) {
        Some(target) => {
            // Declaration-only targets carry no extractable structure
            if program.is_declaration(&target) {
                tracing::debug!("Discarding declaration-only resolution: {}", target);
                return;
            }

            let key = (
                origin.to_string(),
                file.relative_path.clone(),
                target.clone(),
                specifier.to_string(),
            );
            if !seen.insert(key) {
                return;
            }

            let from = ctx.module_classifier(&file.relative_path);
            let to = ctx.module_classifier(&target);
            let discriminator = format!("{}:{}", origin, specifier);
            ctx.add_relation(
                RelationKind::Dependency,
                &from,
                &to,
                Some(&discriminator),
                vec![
                    TaggedValue::new("origin", origin.to_string()),
                    TaggedValue::new("specifier", specifier),
                ],
                Some(SourceRef {
                    file: file.relative_path.clone(),
                    line: start_line(node),
                }),
            );
        }
        None => {
            // A failing relative specifier is a defect in the scanned project;
            // a failing bare specifier is assumed to be an external package.
            if specifier.starts_with('.') {
                if let Some(report) = ctx.report.as_mut() {
                    let mut tags = BTreeMap::new();
                    tags.insert("specifier".to_string(), specifier.to_string());
                    tags.insert("origin".to_string(), origin.to_string());
                    report.warn(
                        FindingKind::UnresolvedImport,
                        format!("cannot resolve '{}'", specifier),
                        SourceRef {
                            file: file.relative_path.clone(),
                            line: start_line(node),
                        },
                        tags,
                    );
                }
            }
        }
    }
}

/// Resolve a module specifier to a project-relative file path
///
/// Relative specifiers resolve against the importing file's directory;
/// bare specifiers go through tsconfig `paths` wildcard mappings and then
/// `baseUrl`. Resolutions outside the program's file set yield `None`.
pub fn resolve_specifier(
    program: &SourceProgram,
    from_file: &str,
    specifier: &str,
) -> Option<String> {
    if specifier.starts_with('.') {
        let from_dir = match from_file.rfind('/') {
            Some(idx) => &from_file[..idx],
            None => "",
        };
        let joined = join_normalized(from_dir, specifier)?;
        return probe(program, &joined);
    }

    let options = &program.compiler_options;
    let base = options.base_url.as_deref().unwrap_or("");

    for (pattern, substitutions) in &options.paths {
        let Some(matched) = match_wildcard(pattern, specifier) else {
            continue;
        };
        for substitution in substitutions {
            let candidate = substitution.replace('*', &matched);
            // tsconfig treats substitutions as baseUrl-relative, but
            // root-relative mappings appear in the wild; probe both.
            if let Some(joined) = join_normalized(base, &candidate) {
                if let Some(resolved) = probe(program, &joined) {
                    return Some(resolved);
                }
            }
            if !base.is_empty() {
                if let Some(joined) = join_normalized("", &candidate) {
                    if let Some(resolved) = probe(program, &joined) {
                        return Some(resolved);
                    }
                }
            }
        }
    }

    if options.base_url.is_some() {
        let joined = join_normalized(base, specifier)?;
        return probe(program, &joined);
    }

    None
}

/// Match a tsconfig `paths` pattern with at most one `*` wildcard
fn match_wildcard(pattern: &str, specifier: &str) -> Option<String> {
    match pattern.find('*') {
        Some(idx) => {
            let (prefix, suffix) = (&pattern[..idx], &pattern[idx + 1..]);
            if specifier.starts_with(prefix)
                && specifier.ends_with(suffix)
                && specifier.len() >= prefix.len() + suffix.len()
            {
                Some(specifier[prefix.len()..specifier.len() - suffix.len()].to_string())
            } else {
                None
            }
        }
        None => {
            if pattern == specifier {
                Some(String::new())
            } else {
                None
            }
        }
    }
}

/// Join and normalize a path, resolving `.` and `..` segments
///
/// Returns `None` when `..` escapes the project root - such resolutions point
/// outside the project and are discarded.
fn join_normalized(base: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(relative.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Probe a normalized path for a real in-project file, trying extensions and
/// directory index files
fn probe(program: &SourceProgram, path: &str) -> Option<String> {
    if program.contains(path) {
        return Some(path.to_string());
    }
    for ext in PROBE_EXTENSIONS {
        let candidate = format!("{}{}", path, ext);
        if program.contains(&candidate) {
            return Some(candidate);
        }
    }
    for ext in PROBE_EXTENSIONS {
        let candidate = format!("{}/index{}", path, ext);
        if program.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::CompilerOptions;
    use std::collections::HashMap;

    fn program_with(files: Vec<(&str, &str)>, options: CompilerOptions) -> SourceProgram {
        SourceProgram::parse(
            "/tmp/project",
            files
                .into_iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            options,
            None,
        )
        .unwrap()
    }

    fn context_for(program: &SourceProgram, with_report: bool) -> ExtractionContext {
        let (packages, by_dir) = crate::extract::packages::map_packages(
            "project",
            program.files().iter().map(|f| f.relative_path.clone()),
        );
        let report = with_report.then(|| crate::report::ExtractionReport::new("/tmp/project"));
        ExtractionContext::new(packages, by_dir, report)
    }

    #[test]
    fn relative_specifiers_probe_extensions_and_indexes() {
        let program = program_with(
            vec![
                ("src/a.ts", "import { b } from './b';"),
                ("src/b.ts", "export const b = 1;"),
                ("src/lib/index.ts", "export const lib = 1;"),
            ],
            CompilerOptions::default(),
        );

        assert_eq!(
            resolve_specifier(&program, "src/a.ts", "./b"),
            Some("src/b.ts".to_string())
        );
        assert_eq!(
            resolve_specifier(&program, "src/a.ts", "./lib"),
            Some("src/lib/index.ts".to_string())
        );
        assert_eq!(resolve_specifier(&program, "src/a.ts", "./missing"), None);
        // `..` escaping the project root points outside the project
        assert_eq!(resolve_specifier(&program, "src/a.ts", "../../etc"), None);
    }

    #[test]
    fn path_mappings_and_base_url_resolve_bare_specifiers() {
        let mut paths = std::collections::BTreeMap::new();
        // Root-relative and baseUrl-relative substitutions both occur in
        // real tsconfigs; both conventions must resolve
        paths.insert("@app/*".to_string(), vec!["src/app/*".to_string()]);
        paths.insert("@lib/*".to_string(), vec!["lib/*".to_string()]);
        let options = CompilerOptions {
            base_url: Some("src".to_string()),
            paths,
        };
        let program = program_with(
            vec![
                ("src/app/user.ts", "export class User {}"),
                ("src/lib/format.ts", "export const f = 1;"),
                ("src/shared/util.ts", "export const u = 1;"),
            ],
            options,
        );

        assert_eq!(
            resolve_specifier(&program, "src/app/user.ts", "@app/user"),
            Some("src/app/user.ts".to_string())
        );
        assert_eq!(
            resolve_specifier(&program, "src/app/user.ts", "@lib/format"),
            Some("src/lib/format.ts".to_string())
        );
        assert_eq!(
            resolve_specifier(&program, "src/app/user.ts", "shared/util"),
            Some("src/shared/util.ts".to_string())
        );
        assert_eq!(resolve_specifier(&program, "src/app/user.ts", "react"), None);
    }

    #[test]
    fn import_graph_emits_tagged_dependency_edges() {
        let program = program_with(
            vec![
                ("src/a.ts", "import { b } from './b';\nconst x = require('./b');"),
                ("src/b.ts", "export const b = 1;"),
            ],
            CompilerOptions::default(),
        );
        let mut ctx = context_for(&program, false);

        run(&program, &mut ctx);

        let (_, classifiers, relations, _) = ctx.into_parts();
        assert_eq!(classifiers.len(), 2, "module classifiers for both endpoints");
        // Same module pair, two origins, two distinct edges
        assert_eq!(relations.len(), 2);
        let origins: HashMap<String, usize> = relations
            .iter()
            .flat_map(|r| r.tagged_values.iter())
            .filter(|t| t.key == "origin")
            .fold(HashMap::new(), |mut acc, t| {
                *acc.entry(t.value.clone()).or_default() += 1;
                acc
            });
        assert_eq!(origins["import"], 1);
        assert_eq!(origins["require"], 1);
    }

    #[test]
    fn repeated_specifiers_are_deduplicated() {
        let program = program_with(
            vec![
                (
                    "src/a.ts",
                    "import { b } from './b';\nimport { c } from './b';",
                ),
                ("src/b.ts", "export const b = 1;\nexport const c = 2;"),
            ],
            CompilerOptions::default(),
        );
        let mut ctx = context_for(&program, false);

        run(&program, &mut ctx);

        assert_eq!(ctx.relations.len(), 1);
    }

    #[test]
    fn unresolved_relative_specifier_is_a_warning_finding() {
        let program = program_with(
            vec![("src/a.ts", "import { gone } from './gone';\nimport missing from 'not-a-real-pkg';")],
            CompilerOptions::default(),
        );
        let mut ctx = context_for(&program, true);

        run(&program, &mut ctx);

        let (_, _, relations, report) = ctx.into_parts();
        assert!(relations.is_empty());

        let snapshot = report.unwrap().finalize();
        // Bare specifiers stay silent; only the relative one is reported
        assert_eq!(snapshot.unresolved_count(), 1);
        let finding = &snapshot.findings[0];
        assert_eq!(finding.kind, FindingKind::UnresolvedImport);
        assert_eq!(finding.tags["specifier"], "./gone");
        assert_eq!(finding.tags["origin"], "import");
    }

    #[test]
    fn declaration_only_resolutions_are_discarded() {
        let program = program_with(
            vec![
                ("src/a.ts", "import { T } from './types';"),
                ("src/types.d.ts", "export declare type T = string;"),
            ],
            CompilerOptions::default(),
        );
        let mut ctx = context_for(&program, true);

        run(&program, &mut ctx);

        let (_, _, relations, report) = ctx.into_parts();
        assert!(relations.is_empty());
        // Resolved (then discarded) - not an unresolved finding
        assert_eq!(report.unwrap().finalize().unresolved_count(), 0);
    }
}
