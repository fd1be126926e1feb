//! Extraction pipeline
//!
//! Orchestrates the passes in their fixed order: package mapper ->
//! declaration pass -> member/relation pass -> framework extractors ->
//! import graph resolver -> report finalization -> canonicalization.
//! Extraction is single-threaded and synchronous over the immutable parsed
//! program; it either completes with a full model or fails with no partial
//! result.

pub mod angular;
pub mod context;
pub mod declare;
pub mod helpers;
pub mod imports;
pub mod members;
pub mod packages;
pub mod react;

use crate::error::ExtractError;
use crate::ir::canonical::canonicalize;
use crate::ir::model::IrModel;
use crate::project::SourceProgram;
use crate::report::{ExtractionReport, ReportSnapshot};

/// Exit code for the fail-on-unresolved CLI contract
pub const EXIT_UNRESOLVED: i32 = 3;

/// Mode flags consumed by the core
///
/// The CLI collaborator maps its `--mode ts|react|angular|js` surface onto
/// these flags via [`ExtractOptions::for_mode`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub react: bool,
    pub angular: bool,
    /// Include plain JavaScript files in the declaration/member passes
    pub force_allow_js: bool,
    /// Run the import graph resolver
    pub import_graph: bool,
    /// Emit DEPENDENCY relations for usage-only references
    pub include_deps: bool,
    /// Emit framework edges (RENDER); classification is not gated
    pub include_framework_edges: bool,
    /// Truncate to the lexicographically first N files (applied at parse time)
    pub max_files: Option<usize>,
    /// Track an extraction report (the CLI always requests this)
    pub track_report: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            react: false,
            angular: false,
            force_allow_js: false,
            import_graph: false,
            include_deps: false,
            include_framework_edges: true,
            max_files: None,
            track_report: true,
        }
    }
}

/// Extraction modes exposed by the unified CLI surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ts,
    React,
    Angular,
    Js,
}

impl ExtractOptions {
    pub fn for_mode(mode: Mode) -> Self {
        let mut options = Self::default();
        match mode {
            Mode::Ts => {}
            Mode::React => options.react = true,
            Mode::Angular => options.angular = true,
            Mode::Js => {
                options.force_allow_js = true;
                options.import_graph = true;
            }
        }
        options
    }

    /// Flip react mode on when the file set carries JSX-capable extensions
    pub fn auto_detect(&mut self, program: &SourceProgram) {
        if !self.react && !self.angular && program.has_jsx_files() {
            tracing::debug!("JSX files present, auto-detecting react mode");
            self.react = true;
        }
    }
}

/// Result of one extraction run
pub struct Extraction {
    pub model: IrModel,
    pub report: Option<ReportSnapshot>,
}

impl Extraction {
    /// Process exit code under the fail-on-unresolved contract
    ///
    /// Returns [`EXIT_UNRESOLVED`] when the flag is set and the report holds
    /// at least one unresolved finding; the IR output is still written in
    /// that case - the caller decides after writing.
    pub fn exit_code(&self, fail_on_unresolved: bool) -> i32 {
        if fail_on_unresolved {
            if let Some(report) = &self.report {
                if report.unresolved_count() > 0 {
                    return EXIT_UNRESOLVED;
                }
            }
        }
        0
    }
}

/// Run the full pipeline over a parsed program
pub fn extract_model(
    program: &SourceProgram,
    options: &ExtractOptions,
) -> Result<Extraction, ExtractError> {
    let mut options = options.clone();
    options.auto_detect(program);
    let options = &options;

    let root_name = program
        .root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project")
        .to_string();

    let (packages, package_by_dir) = packages::map_packages(
        &root_name,
        program.files().iter().map(|f| f.relative_path.clone()),
    );

    let report = options
        .track_report
        .then(|| ExtractionReport::new(program.root.display().to_string()));
    let mut ctx = context::ExtractionContext::new(packages, package_by_dir, report);

    declare::run(program, &mut ctx, options);
    members::run(program, &mut ctx, options);

    if options.react {
        react::run(program, &mut ctx, options);
    }
    if options.angular {
        angular::run(program, &mut ctx, options);
    }
    if options.import_graph || options.include_deps {
        imports::run(program, &mut ctx);
    }

    let (packages, classifiers, relations, report) = ctx.into_parts();

    let mut model = IrModel::new();
    model.packages = packages;
    model.classifiers = classifiers;
    model.relations = relations;
    canonicalize(&mut model);

    tracing::debug!(
        "Extraction complete: {} packages, {} classifiers, {} relations",
        model.packages.len(),
        model.classifiers.len(),
        model.relations.len()
    );

    Ok(Extraction {
        model,
        report: report.map(|r| r.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::model::{ClassifierKind, RelationKind};
    use crate::ir::serialize::{to_canonical_json, write_model};
    use crate::project::{CompilerOptions, SourceProgram};

    fn program(files: Vec<(&str, &str)>) -> SourceProgram {
        program_with_limit(files, None)
    }

    fn program_with_limit(files: Vec<(&str, &str)>, max_files: Option<usize>) -> SourceProgram {
        SourceProgram::parse(
            "/tmp/project",
            files
                .into_iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            CompilerOptions::default(),
            max_files,
        )
        .unwrap()
    }

    #[test]
    fn extraction_is_deterministic_across_input_order() {
        let sources = vec![
            ("src/a.ts", "import { B } from './b';\nexport class A extends B { value: B; }"),
            ("src/b.ts", "export class B {}"),
            ("src/c.ts", "export interface C { a: string; }"),
        ];
        let mut reversed = sources.clone();
        reversed.reverse();

        let options = ExtractOptions::default();
        let first = extract_model(&program(sources), &options).unwrap();
        let second = extract_model(&program(reversed), &options).unwrap();

        assert_eq!(
            to_canonical_json(&first.model).unwrap(),
            to_canonical_json(&second.model).unwrap(),
            "canonical JSON must be byte-identical regardless of input order"
        );
    }

    #[test]
    fn model_invariants_hold() {
        let extraction = extract_model(
            &program(vec![
                ("src/a.ts", "export class A { run(): void {} }"),
                ("src/deep/b.ts", "export class B extends Object {}"),
            ]),
            &ExtractOptions::default(),
        )
        .unwrap();

        let model = &extraction.model;
        let classifier_ids: std::collections::HashSet<_> =
            model.classifiers.iter().map(|c| c.id.as_str()).collect();
        let package_ids: std::collections::HashSet<_> =
            model.packages.iter().map(|p| p.id.as_str()).collect();

        for relation in &model.relations {
            assert!(classifier_ids.contains(relation.source_id.as_str()));
            assert!(classifier_ids.contains(relation.target_id.as_str()));
        }
        for classifier in &model.classifiers {
            assert!(package_ids.contains(classifier.package_id.as_str()));
        }
    }

    #[test]
    fn include_deps_toggles_only_dependency_relations() {
        let sources = vec![(
            "src/app.ts",
            "export class B {}\nexport class C {}\nexport class A { b: B; run(): void { new C(); } }",
        )];

        let without = extract_model(
            &program(sources.clone()),
            &ExtractOptions {
                include_deps: false,
                ..ExtractOptions::default()
            },
        )
        .unwrap();
        let with = extract_model(
            &program(sources),
            &ExtractOptions {
                include_deps: true,
                ..ExtractOptions::default()
            },
        )
        .unwrap();

        let count = |model: &IrModel, kind: RelationKind| {
            model.relations.iter().filter(|r| r.kind == kind).count()
        };

        assert_eq!(count(&without.model, RelationKind::Dependency), 0);
        assert!(count(&with.model, RelationKind::Dependency) >= 1);
        // Structural relations are unaffected by the flag
        assert_eq!(
            count(&without.model, RelationKind::Association),
            count(&with.model, RelationKind::Association)
        );
    }

    #[test]
    fn react_component_classification_and_render_gating() {
        let sources = vec![
            (
                "src/Parent.tsx",
                "import { Child } from './Child';\nexport const Parent = () => <div><Child /></div>;",
            ),
            ("src/Child.tsx", "export const Child = () => <span>hi</span>;"),
        ];

        let mut gated = ExtractOptions::for_mode(Mode::React);
        gated.include_framework_edges = false;
        let without_edges = extract_model(&program(sources.clone()), &gated).unwrap();

        let components = without_edges
            .model
            .classifiers
            .iter()
            .filter(|c| c.kind == ClassifierKind::Component)
            .count();
        assert_eq!(components, 2, "classification is not gated by the edge flag");
        assert!(without_edges
            .model
            .relations
            .iter()
            .all(|r| r.kind != RelationKind::Render));

        let with_edges = extract_model(
            &program(sources),
            &ExtractOptions::for_mode(Mode::React),
        )
        .unwrap();
        let renders: Vec<_> = with_edges
            .model
            .relations
            .iter()
            .filter(|r| r.kind == RelationKind::Render)
            .collect();
        assert_eq!(renders.len(), 1);
    }

    #[test]
    fn block_body_components_are_detected() {
        let sources = vec![(
            "src/App.tsx",
            "export function App() {\n  const n = 1;\n  return (<main>{n}</main>);\n}\nfunction helper() { return 42; }",
        )];
        let extraction =
            extract_model(&program(sources), &ExtractOptions::for_mode(Mode::React)).unwrap();

        let kinds: Vec<_> = extraction
            .model
            .classifiers
            .iter()
            .map(|c| (c.name.clone(), c.kind))
            .collect();
        assert!(kinds.contains(&("App".to_string(), ClassifierKind::Component)));
        // Lowercase helper returning a non-JSX value is not a component
        assert!(!kinds.iter().any(|(name, _)| name == "helper"));
    }

    #[test]
    fn max_files_keeps_only_the_first_classifier() {
        let sources = vec![
            ("a.ts", "export class A {}"),
            ("b.ts", "export class B {}"),
            ("c.ts", "export class C {}"),
        ];
        let extraction = extract_model(
            &program_with_limit(sources, Some(1)),
            &ExtractOptions::default(),
        )
        .unwrap();

        assert_eq!(extraction.model.classifiers.len(), 1);
        assert_eq!(extraction.model.classifiers[0].name, "A");
    }

    #[test]
    fn angular_decorators_drive_kinds_and_module_wiring() {
        let sources = vec![(
            "src/app.module.ts",
            r#"import { Component, Injectable, NgModule } from '@angular/core';

@Injectable()
export class UserService {}

@Component({ selector: 'app-user', providers: [UserService] })
export class UserComponent {}

@NgModule({ declarations: [UserComponent], providers: [UserService] })
export class AppModule {}
"#,
        )];
        let extraction =
            extract_model(&program(sources), &ExtractOptions::for_mode(Mode::Angular)).unwrap();

        let by_name = |name: &str| {
            extraction
                .model
                .classifiers
                .iter()
                .find(|c| c.name == name)
                .unwrap()
        };
        assert_eq!(by_name("UserService").kind, ClassifierKind::Injectable);
        assert_eq!(by_name("UserComponent").kind, ClassifierKind::Component);
        assert!(by_name("UserComponent")
            .tagged_values
            .iter()
            .any(|t| t.key == "selector" && t.value == "app-user"));
        assert_eq!(by_name("AppModule").kind, ClassifierKind::NgModule);

        let kind_count = |kind: RelationKind| {
            extraction
                .model
                .relations
                .iter()
                .filter(|r| r.kind == kind)
                .count()
        };
        assert_eq!(kind_count(RelationKind::Declares), 1);
        assert_eq!(kind_count(RelationKind::Provides), 2);
    }

    #[test]
    fn unresolved_context_drives_exit_code_and_model_is_still_written() {
        let sources = vec![(
            "src/app.module.ts",
            "import { NgModule } from '@angular/core';\n@NgModule({ declarations: [MissingComponent] })\nexport class AppModule {}",
        )];
        let extraction =
            extract_model(&program(sources), &ExtractOptions::for_mode(Mode::Angular)).unwrap();

        assert_eq!(extraction.exit_code(true), EXIT_UNRESOLVED);
        assert_eq!(extraction.exit_code(false), 0);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("model.json");
        write_model(&out, &extraction.model).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn generic_supertypes_emit_heritage_edges() {
        let sources = vec![(
            "src/repo.ts",
            "export interface Repository<T> { find(id: string): T; }\nexport interface UserRepository extends Repository<string> {}\nexport class InMemoryRepository implements Repository<string> { find(id: string): string { return id; } }",
        )];
        let extraction = extract_model(&program(sources), &ExtractOptions::default()).unwrap();

        let kinds: Vec<_> = extraction.model.relations.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&RelationKind::Inheritance));
        assert!(kinds.contains(&RelationKind::Implementation));
    }

    #[test]
    fn render_gating_still_reports_unresolved_context() {
        let sources = vec![
            (
                "src/Parent.tsx",
                "import { Child } from './Child';\nexport const Parent = () => <div><Child /></div>;",
            ),
            ("src/Child.tsx", "export const Other = () => <span />;"),
        ];
        let mut options = ExtractOptions::for_mode(Mode::React);
        options.include_framework_edges = false;
        let extraction = extract_model(&program(sources), &options).unwrap();

        assert!(extraction
            .model
            .relations
            .iter()
            .all(|r| r.kind != RelationKind::Render));
        assert_eq!(extraction.report.unwrap().unresolved_count(), 1);
    }

    #[test]
    fn component_bodies_yield_usage_dependencies() {
        let sources = vec![
            (
                "src/App.tsx",
                "import { Logger } from './logger';\nexport const App = () => { const log = new Logger(); return <div />; };",
            ),
            ("src/logger.ts", "export class Logger {}"),
        ];
        let mut options = ExtractOptions::for_mode(Mode::React);
        options.include_deps = true;
        let extraction = extract_model(&program(sources), &options).unwrap();

        let id_of = |name: &str| {
            extraction
                .model
                .classifiers
                .iter()
                .find(|c| c.name == name)
                .unwrap()
                .id
                .clone()
        };
        let (app, logger) = (id_of("App"), id_of("Logger"));
        assert!(extraction.model.relations.iter().any(|r| {
            r.kind == RelationKind::Dependency && r.source_id == app && r.target_id == logger
        }));
    }

    #[test]
    fn decorated_abstract_classes_are_wired() {
        let sources = vec![(
            "src/base.component.ts",
            r#"import { Component, Injectable } from '@angular/core';

@Injectable()
export class AuditService {}

@Component({ selector: 'app-base', providers: [AuditService] })
export abstract class BaseComponent {}
"#,
        )];
        let extraction =
            extract_model(&program(sources), &ExtractOptions::for_mode(Mode::Angular)).unwrap();

        let base = extraction
            .model
            .classifiers
            .iter()
            .find(|c| c.name == "BaseComponent")
            .unwrap();
        assert_eq!(base.kind, ClassifierKind::Component);
        assert_eq!(
            extraction
                .model
                .relations
                .iter()
                .filter(|r| r.kind == RelationKind::Provides)
                .count(),
            1
        );
    }

    #[test]
    fn inheritance_and_implementation_edges() {
        let sources = vec![(
            "src/shapes.ts",
            "export interface Drawable { draw(): void; }\nexport class Shape {}\nexport class Circle extends Shape implements Drawable { radius: number; draw(): void {} }",
        )];
        let extraction = extract_model(&program(sources), &ExtractOptions::default()).unwrap();

        let kinds: Vec<_> = extraction.model.relations.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&RelationKind::Inheritance));
        assert!(kinds.contains(&RelationKind::Implementation));
    }

    #[test]
    fn unresolved_supertypes_are_silently_skipped() {
        let sources = vec![("src/a.ts", "export class A extends SomethingExternal {}")];
        let extraction = extract_model(&program(sources), &ExtractOptions::default()).unwrap();

        assert!(extraction.model.relations.is_empty());
        assert_eq!(extraction.report.unwrap().unresolved_count(), 0);
    }

    #[test]
    fn auto_detect_flips_react_on_for_jsx_file_sets() {
        let program = program(vec![("src/App.tsx", "export const App = () => <div />;")]);
        let mut options = ExtractOptions::default();
        options.auto_detect(&program);
        assert!(options.react);
    }

    #[test]
    fn auto_detection_applies_inside_the_pipeline() {
        let extraction = extract_model(
            &program(vec![("src/App.tsx", "export const App = () => <div />;")]),
            &ExtractOptions::default(),
        )
        .unwrap();

        assert!(extraction
            .model
            .classifiers
            .iter()
            .any(|c| c.name == "App" && c.kind == ClassifierKind::Component));
    }
}
