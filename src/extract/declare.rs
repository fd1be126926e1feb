//! Symbol declaration pass (pass 1)
//!
//! First walk over every non-declaration source file. Creates exactly one
//! classifier per qualifying declaration, assigns stable hashed ids, and
//! registers declarations and import bindings in the symbol table that the
//! member pass consumes. Ids and qualified names derive purely from static
//! structure, so file visitation order cannot affect them.

use tree_sitter::Node;

use crate::extract::context::{ExtractionContext, ImportBinding, SymbolEntry};
use crate::extract::helpers::{find_child_by_type, node_text, strip_quotes};
use crate::extract::{angular, react, ExtractOptions};
use crate::ir::ids;
use crate::ir::model::{ClassifierKind, IrClassifier, TaggedValue};
use crate::project::{SourceFile, SourceProgram};

/// Run the declaration pass over the whole program
pub fn run(program: &SourceProgram, ctx: &mut ExtractionContext, options: &ExtractOptions) {
    for file in program.files() {
        if file.dialect.is_javascript() && !options.force_allow_js {
            continue;
        }
        let mut scope = Vec::new();
        visit_node(file, file.tree.root_node(), ctx, options, &mut scope);
        tracing::debug!("Declared symbols for {}", file.relative_path);
    }
}

/// Recursively visit nodes, declaring classifiers for supported shapes
fn visit_node(
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
    options: &ExtractOptions,
    scope: &mut Vec<String>,
) {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" => {
            declare_class(file, node, ctx, options, scope);
        }
        "interface_declaration" => {
            if let Some(name) = declared_name(file, &node) {
                declare(file, node, ctx, scope, &name, ClassifierKind::Interface, Vec::new());
            }
        }
        "function_declaration" => {
            if options.react {
                if let Some(name) = declared_name(file, &node) {
                    if react::is_component_function(file, &node, &name) {
                        declare(file, node, ctx, scope, &name, ClassifierKind::Component, Vec::new());
                    }
                }
            }
        }
        "variable_declarator" => {
            if options.react {
                declare_component_variable(file, node, ctx, scope);
            }
        }
        "import_statement" => {
            bind_imports(file, node, ctx);
        }
        _ => {}
    }

    // Namespace and class names contribute to the nested scope of their
    // member declarations
    let pushes_scope = matches!(
        node.kind(),
        "internal_module" | "module_declaration" | "class_declaration" | "abstract_class_declaration"
    );
    if pushes_scope {
        if let Some(name) = declared_name(file, &node) {
            scope.push(name);
            visit_children(file, node, ctx, options, scope);
            scope.pop();
            return;
        }
    }

    visit_children(file, node, ctx, options, scope);
}

fn visit_children(
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
    options: &ExtractOptions,
    scope: &mut Vec<String>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_node(file, child, ctx, options, scope);
    }
}

fn declare_class(
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
    options: &ExtractOptions,
    scope: &mut Vec<String>,
) {
    let Some(name) = declared_name(file, &node) else {
        return;
    };

    // Angular decorators refine the kind before the id is hashed, so the
    // classifier id stays consistent with its kind discriminator
    let (kind, stereotypes, tagged_values) = if options.angular {
        match angular::classify_decorated_class(file, &node) {
            Some(classification) => classification,
            None => (ClassifierKind::Class, Vec::new(), Vec::new()),
        }
    } else {
        (ClassifierKind::Class, Vec::new(), Vec::new())
    };

    let id = declare(file, node, ctx, scope, &name, kind, tagged_values);
    if let Some(classifier) = ctx.classifier_mut(&id) {
        classifier.stereotypes = stereotypes;
    }
}

/// `const Foo = () => <div/>` style component declarations
fn declare_component_variable(
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
    scope: &mut Vec<String>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    if name_node.kind() != "identifier" {
        return;
    }
    let name = node_text(&file.content, &name_node);

    let Some(value) = node.child_by_field_name("value") else {
        return;
    };
    if !matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
        return;
    }
    if react::is_component_function(file, &value, &name) {
        declare(file, node, ctx, scope, &name, ClassifierKind::Component, Vec::new());
    }
}

/// Create the classifier, register its symbol, and return its id
fn declare(
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
    scope: &[String],
    name: &str,
    kind: ClassifierKind,
    tagged_values: Vec<TaggedValue>,
) -> String {
    let qualified_name = qualified_name(&file.relative_path, scope, name);
    let id = ids::classifier_id(&qualified_name, kind);

    // Exactly one classifier per distinct declaration
    if ctx.classifier(&id).is_none() {
        let package_id = ctx.package_for_file(&file.relative_path);
        ctx.insert_classifier(IrClassifier {
            id: id.clone(),
            name: name.to_string(),
            qualified_name,
            kind,
            package_id,
            stereotypes: Vec::new(),
            tagged_values,
            attributes: Vec::new(),
            operations: Vec::new(),
        });
    }

    let entry = SymbolEntry {
        classifier_id: id.clone(),
        kind,
    };
    ctx.symbols.declare(&file.relative_path, name, entry.clone());
    if is_default_export(node) {
        ctx.symbols.declare(&file.relative_path, "default", entry);
    }

    id
}

/// Qualified name: file path + nested scope + declared name
fn qualified_name(relative_path: &str, scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        format!("{}#{}", relative_path, name)
    } else {
        format!("{}#{}.{}", relative_path, scope.join("."), name)
    }
}

fn declared_name(file: &SourceFile, node: &Node) -> Option<String> {
    node.child_by_field_name("name")
        .map(|name_node| node_text(&file.content, &name_node))
        .filter(|name| !name.is_empty())
}

/// Whether a declaration (or its declarator's statement) is `export default`
fn is_default_export(node: Node) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.kind() == "export_statement" {
            return find_child_by_type(&n, "default").is_some();
        }
        current = n.parent();
    }
    false
}

/// Record the import bindings of one `import` statement
fn bind_imports(file: &SourceFile, node: Node, ctx: &mut ExtractionContext) {
    let Some(source) = node.child_by_field_name("source") else {
        return;
    };
    let specifier = strip_quotes(&node_text(&file.content, &source));

    let Some(clause) = find_child_by_type(&node, "import_clause") else {
        return;
    };

    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            // import Foo from '...'
            "identifier" => {
                let local = node_text(&file.content, &child);
                ctx.symbols.bind_import(
                    &file.relative_path,
                    &local,
                    ImportBinding {
                        specifier: specifier.clone(),
                        imported: "default".to_string(),
                    },
                );
            }
            // import { Foo, Bar as Baz } from '...'
            "named_imports" => {
                let mut inner = child.walk();
                for import_specifier in child.children(&mut inner) {
                    if import_specifier.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name_node) = import_specifier.child_by_field_name("name") else {
                        continue;
                    };
                    let imported = node_text(&file.content, &name_node);
                    let local = import_specifier
                        .child_by_field_name("alias")
                        .map(|alias| node_text(&file.content, &alias))
                        .unwrap_or_else(|| imported.clone());
                    ctx.symbols.bind_import(
                        &file.relative_path,
                        &local,
                        ImportBinding {
                            specifier: specifier.clone(),
                            imported,
                        },
                    );
                }
            }
            // import * as ns from '...'
            "namespace_import" => {
                if let Some(name_node) = find_child_by_type(&child, "identifier") {
                    let local = node_text(&file.content, &name_node);
                    ctx.symbols.bind_import(
                        &file.relative_path,
                        &local,
                        ImportBinding {
                            specifier: specifier.clone(),
                            imported: "*".to_string(),
                        },
                    );
                }
            }
            _ => {}
        }
    }
}
