//! React extractor
//!
//! Component classification plus RENDER edge emission. A function-like
//! declaration is a component when it directly returns a JSX construct:
//! either as the expression body of an arrow function (parentheses
//! unwrapped), or as the operand of a `return` statement in a block body
//! (the first JSX-returning statement wins). The `include_framework_edges`
//! flag gates only RENDER edges; classification is unconditional in react
//! mode.

use std::collections::BTreeMap;

use tree_sitter::Node;

use crate::extract::context::{ExtractionContext, SymbolResolution};
use crate::extract::helpers::{node_text, start_line, unwrap_parens};
use crate::extract::ExtractOptions;
use crate::ir::model::{ClassifierKind, RelationKind, SourceRef};
use crate::project::{SourceFile, SourceProgram};
use crate::report::FindingKind;

const JSX_KINDS: [&str; 3] = ["jsx_element", "jsx_self_closing_element", "jsx_fragment"];

/// Component heuristic used by the declaration pass
///
/// `node` is the function-like node: a `function_declaration` or the
/// arrow/function expression bound to a capitalized variable.
pub fn is_component_function(file: &SourceFile, node: &Node, name: &str) -> bool {
    if !name.chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }

    let Some(body) = node.child_by_field_name("body") else {
        return false;
    };

    if body.kind() == "statement_block" {
        returns_jsx_in_block(&body)
    } else {
        // Arrow expression body
        is_jsx_node(&unwrap_parens(body))
    }
}

fn is_jsx_node(node: &Node) -> bool {
    JSX_KINDS.contains(&node.kind())
}

/// Scan a block body's return statements, skipping nested function scopes
fn returns_jsx_in_block(block: &Node) -> bool {
    let mut returns = Vec::new();
    collect_returns(block, &mut returns);
    returns.iter().any(|ret| {
        ret.named_child(0)
            .map(|operand| is_jsx_node(&unwrap_parens(operand)))
            .unwrap_or(false)
    })
}

fn collect_returns<'a>(node: &Node<'a>, out: &mut Vec<Node<'a>>) {
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        match child.kind() {
            "return_statement" => out.push(child),
            // Returns inside nested functions belong to those functions
            "arrow_function" | "function_expression" | "function" | "function_declaration"
            | "method_definition" => {}
            _ => collect_returns(&child, out),
        }
    }
}

/// RENDER edge pass: container component -> each rendered in-project component
///
/// `include_framework_edges` gates edge emission only; unresolved JSX
/// references are still reported when edges are disabled.
pub fn run(program: &SourceProgram, ctx: &mut ExtractionContext, options: &ExtractOptions) {
    for file in program.files() {
        if file.dialect.is_javascript() && !options.force_allow_js {
            continue;
        }
        emit_render_edges(program, file, ctx, options);
    }
}

fn emit_render_edges(
    program: &SourceProgram,
    file: &SourceFile,
    ctx: &mut ExtractionContext,
    options: &ExtractOptions,
) {
    let root = file.tree.root_node();
    let mut pending: Vec<(String, String, Node)> = Vec::new();

    walk_components(file, root, ctx, &mut pending);

    for (source_id, tag_name, tag_node) in pending {
        match ctx.resolve_symbol(program, &file.relative_path, &tag_name) {
            SymbolResolution::Resolved(entry) if entry.kind == ClassifierKind::Component => {
                if options.include_framework_edges {
                    ctx.add_relation(
                        RelationKind::Render,
                        &source_id,
                        &entry.classifier_id,
                        None,
                        Vec::new(),
                        Some(SourceRef {
                            file: file.relative_path.clone(),
                            line: start_line(&tag_node),
                        }),
                    );
                }
            }
            SymbolResolution::Resolved(_) => {}
            SymbolResolution::UnresolvedContext { specifier } => {
                if let Some(report) = ctx.report.as_mut() {
                    let mut tags = BTreeMap::new();
                    tags.insert("reference".to_string(), tag_name.clone());
                    tags.insert("specifier".to_string(), specifier);
                    report.warn(
                        FindingKind::UnresolvedContext,
                        format!("JSX reference '{}' does not resolve to a declaration", tag_name),
                        SourceRef {
                            file: file.relative_path.clone(),
                            line: start_line(&tag_node),
                        },
                        tags,
                    );
                }
            }
            SymbolResolution::Unknown => {}
        }
    }
}

/// Find declared components in a file and collect the capitalized JSX tags
/// inside their render bodies
fn walk_components<'a>(
    file: &'a SourceFile,
    node: Node<'a>,
    ctx: &ExtractionContext,
    pending: &mut Vec<(String, String, Node<'a>)>,
) {
    let component = match node.kind() {
        "function_declaration" => node
            .child_by_field_name("name")
            .map(|n| node_text(&file.content, &n)),
        "variable_declarator" => node
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
            .map(|n| node_text(&file.content, &n)),
        _ => None,
    };

    if let Some(name) = component {
        if let Some(entry) = ctx.symbols.local(&file.relative_path, &name) {
            if entry.kind == ClassifierKind::Component {
                let source_id = entry.classifier_id.clone();
                if let Some(body) = render_body(&node) {
                    collect_jsx_tags(file, body, &source_id, pending);
                }
                return;
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_components(file, child, ctx, pending);
    }
}

fn render_body<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    match node.kind() {
        "function_declaration" => node.child_by_field_name("body"),
        "variable_declarator" => node
            .child_by_field_name("value")
            .and_then(|value| value.child_by_field_name("body").or(Some(value))),
        _ => None,
    }
}

/// Collect capitalized JSX element names within a render body
fn collect_jsx_tags<'a>(
    file: &'a SourceFile,
    node: Node<'a>,
    source_id: &str,
    pending: &mut Vec<(String, String, Node<'a>)>,
) {
    let tag = match node.kind() {
        "jsx_opening_element" | "jsx_self_closing_element" => node.child_by_field_name("name"),
        _ => None,
    };
    if let Some(name_node) = tag {
        if name_node.kind() == "identifier" {
            let name = node_text(&file.content, &name_node);
            if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                pending.push((source_id.to_string(), name, name_node));
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_jsx_tags(file, child, source_id, pending);
    }
}
