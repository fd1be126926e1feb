//! Angular extractor
//!
//! Decorator-driven classification and module wiring. Recognized decorators
//! map classes to framework kinds and stereotypes before id assignment;
//! decorator metadata arrays (`declarations`, `providers`, `imports`) become
//! relations between the decorated classifier and its referenced classifiers.
//! Unrecognized decorators are ignored without error.

use std::collections::BTreeMap;

use tree_sitter::Node;

use crate::extract::context::{ExtractionContext, SymbolResolution};
use crate::extract::helpers::{
    find_child_by_type, find_children_by_type, find_nodes_by_type, node_text, start_line,
    strip_quotes,
};
use crate::extract::ExtractOptions;
use crate::ir::model::{ClassifierKind, RelationKind, SourceRef, TaggedValue};
use crate::project::{SourceFile, SourceProgram};
use crate::report::FindingKind;

/// Classify a decorated class for the declaration pass
///
/// Returns the classifier kind, stereotypes and tagged values contributed by
/// the first recognized decorator; `None` when no decorator is recognized.
pub fn classify_decorated_class(
    file: &SourceFile,
    node: &Node,
) -> Option<(ClassifierKind, Vec<String>, Vec<TaggedValue>)> {
    for decorator in decorators_of(node) {
        let Some((name, metadata)) = decorator_call(file, &decorator) else {
            continue;
        };
        let classification = match name.as_str() {
            "Component" => {
                let mut tags = Vec::new();
                if let Some(selector) = metadata_string(file, metadata.as_ref(), "selector") {
                    tags.push(TaggedValue::new("selector", selector));
                }
                (ClassifierKind::Component, vec!["component".to_string()], tags)
            }
            "Injectable" => (
                ClassifierKind::Injectable,
                vec!["injectable".to_string()],
                Vec::new(),
            ),
            "NgModule" => (
                ClassifierKind::NgModule,
                vec!["ngModule".to_string()],
                Vec::new(),
            ),
            "Directive" => {
                let mut tags = Vec::new();
                if let Some(selector) = metadata_string(file, metadata.as_ref(), "selector") {
                    tags.push(TaggedValue::new("selector", selector));
                }
                (ClassifierKind::Class, vec!["directive".to_string()], tags)
            }
            "Pipe" => {
                let mut tags = Vec::new();
                if let Some(pipe_name) = metadata_string(file, metadata.as_ref(), "name") {
                    tags.push(TaggedValue::new("pipeName", pipe_name));
                }
                (ClassifierKind::Class, vec!["pipe".to_string()], tags)
            }
            _ => continue,
        };
        return Some(classification);
    }
    None
}

/// DI/module wiring pass, run after the member pass
pub fn run(program: &SourceProgram, ctx: &mut ExtractionContext, options: &ExtractOptions) {
    for file in program.files() {
        if file.dialect.is_javascript() && !options.force_allow_js {
            continue;
        }
        let root = file.tree.root_node();
        for node_kind in ["class_declaration", "abstract_class_declaration"] {
            for class_node in find_nodes_by_type(&root, node_kind) {
                wire_decorated_class(program, file, &class_node, ctx);
            }
        }
    }
}

fn wire_decorated_class(
    program: &SourceProgram,
    file: &SourceFile,
    class_node: &Node,
    ctx: &mut ExtractionContext,
) {
    let Some(name_node) = class_node.child_by_field_name("name") else {
        return;
    };
    let class_name = node_text(&file.content, &name_node);
    let Some(entry) = ctx.symbols.local(&file.relative_path, &class_name) else {
        return;
    };
    let source_id = entry.classifier_id.clone();
    let source_kind = entry.kind;

    for decorator in decorators_of(class_node) {
        let Some((decorator_name, Some(metadata))) = decorator_call(file, &decorator) else {
            continue;
        };

        match (decorator_name.as_str(), source_kind) {
            ("NgModule", ClassifierKind::NgModule) => {
                wire_metadata_array(program, file, &metadata, "declarations", ctx, &source_id, RelationKind::Declares, None);
                wire_metadata_array(program, file, &metadata, "providers", ctx, &source_id, RelationKind::Provides, None);
                wire_metadata_array(
                    program,
                    file,
                    &metadata,
                    "imports",
                    ctx,
                    &source_id,
                    RelationKind::Dependency,
                    Some(TaggedValue::new("origin", "ngModule")),
                );
            }
            ("Component", ClassifierKind::Component) => {
                wire_metadata_array(program, file, &metadata, "providers", ctx, &source_id, RelationKind::Provides, None);
            }
            _ => {}
        }
    }
}

/// Resolve each identifier in a metadata array and emit one relation per hit
#[allow(clippy::too_many_arguments)]
fn wire_metadata_array(
    program: &SourceProgram,
    file: &SourceFile,
    metadata: &Node,
    property: &str,
    ctx: &mut ExtractionContext,
    source_id: &str,
    kind: RelationKind,
    tag: Option<TaggedValue>,
) {
    let Some(array) = metadata_array(file, metadata, property) else {
        return;
    };

    let mut cursor = array.walk();
    for item in array.named_children(&mut cursor) {
        if item.kind() != "identifier" {
            continue;
        }
        let name = node_text(&file.content, &item);
        let location = SourceRef {
            file: file.relative_path.clone(),
            line: start_line(&item),
        };

        match ctx.resolve_symbol(program, &file.relative_path, &name) {
            SymbolResolution::Resolved(entry) => {
                let tags = tag.clone().map(|t| vec![t]).unwrap_or_default();
                ctx.add_relation(
                    kind,
                    source_id,
                    &entry.classifier_id,
                    Some(property),
                    tags,
                    Some(location),
                );
            }
            SymbolResolution::UnresolvedContext { specifier } => {
                report_unresolved(ctx, &name, property, location, Some(specifier));
            }
            SymbolResolution::Unknown => {
                // No import binding at all means the reference cannot be
                // external; report it. Bare-imported names stay silent.
                if ctx.symbols.import_binding(&file.relative_path, &name).is_none() {
                    report_unresolved(ctx, &name, property, location, None);
                }
            }
        }
    }
}

fn report_unresolved(
    ctx: &mut ExtractionContext,
    name: &str,
    property: &str,
    location: SourceRef,
    specifier: Option<String>,
) {
    if let Some(report) = ctx.report.as_mut() {
        let mut tags = BTreeMap::new();
        tags.insert("reference".to_string(), name.to_string());
        tags.insert("property".to_string(), property.to_string());
        if let Some(specifier) = specifier {
            tags.insert("specifier".to_string(), specifier);
        }
        report.warn(
            FindingKind::UnresolvedContext,
            format!("decorator metadata reference '{}' does not resolve", name),
            location,
            tags,
        );
    }
}

/// Decorator nodes attached to a class declaration
///
/// Decorators written before `export` attach to the surrounding
/// export_statement rather than the class node itself.
pub(crate) fn decorators_of<'a>(class_node: &Node<'a>) -> Vec<Node<'a>> {
    let mut decorators = find_children_by_type(class_node, "decorator");
    if let Some(parent) = class_node.parent() {
        if parent.kind() == "export_statement" {
            decorators.extend(find_children_by_type(&parent, "decorator"));
        }
    }
    decorators
}

/// Unpack `@Name({...})` into the decorator name and its metadata object
fn decorator_call<'a>(file: &SourceFile, decorator: &Node<'a>) -> Option<(String, Option<Node<'a>>)> {
    let call = find_child_by_type(decorator, "call_expression")?;
    let function = call.child_by_field_name("function")?;
    if function.kind() != "identifier" {
        return None;
    }
    let name = node_text(&file.content, &function);

    let metadata = call
        .child_by_field_name("arguments")
        .and_then(|args| find_child_by_type(&args, "object"));
    Some((name, metadata))
}

/// Look up a string-literal property of a metadata object
fn metadata_string(file: &SourceFile, metadata: Option<&Node>, property: &str) -> Option<String> {
    let metadata = metadata?;
    let value = metadata_value(file, metadata, property)?;
    if value.kind() == "string" {
        Some(strip_quotes(&node_text(&file.content, &value)))
    } else {
        None
    }
}

/// Look up an array-valued property of a metadata object
fn metadata_array<'a>(file: &SourceFile, metadata: &Node<'a>, property: &str) -> Option<Node<'a>> {
    let value = metadata_value(file, metadata, property)?;
    (value.kind() == "array").then_some(value)
}

fn metadata_value<'a>(file: &SourceFile, metadata: &Node<'a>, property: &str) -> Option<Node<'a>> {
    let mut cursor = metadata.walk();
    for pair in metadata.named_children(&mut cursor) {
        if pair.kind() != "pair" {
            continue;
        }
        let Some(key) = pair.child_by_field_name("key") else {
            continue;
        };
        if node_text(&file.content, &key) == property {
            return pair.child_by_field_name("value");
        }
    }
    None
}
