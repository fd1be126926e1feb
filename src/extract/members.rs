//! Member & relation extraction pass (pass 2)
//!
//! Second walk over the declared classes and interfaces. Fills attributes
//! and operations on the classifiers created by pass 1 and emits structural
//! relations: ASSOCIATION for field/parameter/return typing that resolves in
//! the symbol table, INHERITANCE/IMPLEMENTATION for heritage clauses, and -
//! only when `include_deps` is set - DEPENDENCY for usage-only references
//! (instantiations and calls). Unresolved supertypes are silently skipped;
//! only import and context resolution failures are reportable.

use std::collections::BTreeMap;

use tree_sitter::Node;

use crate::extract::context::{ExtractionContext, SymbolResolution};
use crate::extract::helpers::{
    find_child_by_type, find_nodes_by_type, leading_identifier, node_text, start_line,
};
use crate::extract::ExtractOptions;
use crate::ir::ids;
use crate::ir::model::{
    ClassifierKind, IrAttribute, IrOperation, IrParameter, RelationKind, SourceRef, TypeRef,
};
use crate::project::{SourceFile, SourceProgram};
use crate::report::FindingKind;

/// Run the member pass over the whole program
pub fn run(program: &SourceProgram, ctx: &mut ExtractionContext, options: &ExtractOptions) {
    for file in program.files() {
        if file.dialect.is_javascript() && !options.force_allow_js {
            continue;
        }
        let root = file.tree.root_node();
        visit_node(program, file, root, ctx, options);
    }
}

fn visit_node(
    program: &SourceProgram,
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
    options: &ExtractOptions,
) {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" => {
            extract_class_members(program, file, node, ctx, options);
        }
        "interface_declaration" => {
            extract_interface_members(program, file, node, ctx);
        }
        "function_declaration" | "variable_declarator" => {
            if options.include_deps {
                extract_component_usages(program, file, &node, ctx);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_node(program, file, child, ctx, options);
    }
}

/// Owning classifier id for a declaration, via the pass-1 symbol table
fn owner_of(file: &SourceFile, node: &Node, ctx: &ExtractionContext) -> Option<(String, String)> {
    let name_node = node.child_by_field_name("name")?;
    let name = node_text(&file.content, &name_node);
    let entry = ctx.symbols.local(&file.relative_path, &name)?;
    let qualified_name = ctx
        .classifier(&entry.classifier_id)
        .map(|c| c.qualified_name.clone())?;
    Some((entry.classifier_id.clone(), qualified_name))
}

fn extract_class_members(
    program: &SourceProgram,
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
    options: &ExtractOptions,
) {
    let Some((owner_id, owner_qn)) = owner_of(file, &node, ctx) else {
        return;
    };

    extract_heritage(program, file, &node, ctx, &owner_id);

    let Some(body) = node.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "public_field_definition" | "field_definition" | "property_definition" => {
                if let Some(attribute) =
                    extract_attribute(program, file, &member, ctx, &owner_id, &owner_qn)
                {
                    if let Some(classifier) = ctx.classifier_mut(&owner_id) {
                        classifier.attributes.push(attribute);
                    }
                }
            }
            "method_definition" => {
                let operation = extract_operation(program, file, &member, ctx, &owner_id);
                if let Some(classifier) = ctx.classifier_mut(&owner_id) {
                    classifier.operations.push(operation);
                }
            }
            _ => {}
        }
    }

    if options.include_deps {
        extract_usage_dependencies(program, file, &body, ctx, &owner_id);
    }
}

fn extract_interface_members(
    program: &SourceProgram,
    file: &SourceFile,
    node: Node,
    ctx: &mut ExtractionContext,
) {
    let Some((owner_id, owner_qn)) = owner_of(file, &node, ctx) else {
        return;
    };

    extract_heritage(program, file, &node, ctx, &owner_id);

    let Some(body) = node.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "property_signature" => {
                if let Some(attribute) =
                    extract_attribute(program, file, &member, ctx, &owner_id, &owner_qn)
                {
                    if let Some(classifier) = ctx.classifier_mut(&owner_id) {
                        classifier.attributes.push(attribute);
                    }
                }
            }
            "method_signature" => {
                let operation = extract_operation(program, file, &member, ctx, &owner_id);
                if let Some(classifier) = ctx.classifier_mut(&owner_id) {
                    classifier.operations.push(operation);
                }
            }
            _ => {}
        }
    }
}

/// `extends`/`implements` clauses, subtype -> supertype
///
/// Supertypes that do not resolve in the symbol table are skipped without a
/// finding.
fn extract_heritage(
    program: &SourceProgram,
    file: &SourceFile,
    node: &Node,
    ctx: &mut ExtractionContext,
    owner_id: &str,
) {
    // class_heritage wraps extends_clause/implements_clause for classes;
    // interfaces carry an extends_type_clause directly. Only direct clauses
    // count, never ones inside the body.
    if let Some(heritage) = find_child_by_type(node, "class_heritage") {
        for clause in find_nodes_by_type(&heritage, "extends_clause") {
            emit_heritage_edges(program, file, &clause, ctx, owner_id, RelationKind::Inheritance);
        }
        for clause in find_nodes_by_type(&heritage, "implements_clause") {
            emit_heritage_edges(program, file, &clause, ctx, owner_id, RelationKind::Implementation);
        }
    }
    if let Some(clause) = find_child_by_type(node, "extends_type_clause") {
        emit_heritage_edges(program, file, &clause, ctx, owner_id, RelationKind::Inheritance);
    }
}

fn emit_heritage_edges(
    program: &SourceProgram,
    file: &SourceFile,
    clause: &Node,
    ctx: &mut ExtractionContext,
    owner_id: &str,
    kind: RelationKind,
) {
    let mut cursor = clause.walk();
    for child in clause.named_children(&mut cursor) {
        // Class extends clauses carry expression identifiers; type clauses
        // carry type nodes, where `Base<string>` resolves through its head
        let head = match child.kind() {
            "identifier" => Some((node_text(&file.content, &child), child)),
            _ => head_type_name(file, child),
        };
        let Some((name, name_node)) = head else {
            continue;
        };
        if let SymbolResolution::Resolved(entry) =
            ctx.resolve_symbol(program, &file.relative_path, &name)
        {
            ctx.add_relation(
                kind,
                owner_id,
                &entry.classifier_id,
                None,
                Vec::new(),
                Some(SourceRef {
                    file: file.relative_path.clone(),
                    line: start_line(&name_node),
                }),
            );
        }
    }
}

fn extract_attribute(
    program: &SourceProgram,
    file: &SourceFile,
    member: &Node,
    ctx: &mut ExtractionContext,
    owner_id: &str,
    owner_qn: &str,
) -> Option<IrAttribute> {
    let name_node = member
        .child_by_field_name("name")
        .or_else(|| member.child_by_field_name("key"))?;
    let name = node_text(&file.content, &name_node);

    let ty = classify_type(program, file, member.child_by_field_name("type"), ctx, owner_id);

    let mut stereotypes = Vec::new();
    if find_child_by_type(member, "static").is_some() {
        stereotypes.push("static".to_string());
    }
    if find_child_by_type(member, "readonly").is_some() {
        stereotypes.push("readonly".to_string());
    }

    Some(IrAttribute {
        id: ids::attribute_id(owner_qn, &name),
        name,
        ty,
        stereotypes,
        tagged_values: Vec::new(),
    })
}

fn extract_operation(
    program: &SourceProgram,
    file: &SourceFile,
    member: &Node,
    ctx: &mut ExtractionContext,
    owner_id: &str,
) -> IrOperation {
    let name = member
        .child_by_field_name("name")
        .map(|n| node_text(&file.content, &n))
        .unwrap_or_else(|| "anonymous".to_string());

    let mut parameters = Vec::new();
    if let Some(params) = member.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if !matches!(param.kind(), "required_parameter" | "optional_parameter") {
                continue;
            }
            // Destructuring patterns have no single name; fall back to the
            // leading identifier where one exists
            let param_name = param
                .child_by_field_name("pattern")
                .map(|p| node_text(&file.content, &p))
                .and_then(|text| leading_identifier(&text))
                .unwrap_or_else(|| "arg".to_string());
            let ty = classify_type(program, file, param.child_by_field_name("type"), ctx, owner_id);
            parameters.push(IrParameter {
                name: param_name,
                ty,
            });
        }
    }

    let return_type = classify_type(
        program,
        file,
        member.child_by_field_name("return_type"),
        ctx,
        owner_id,
    );

    let mut stereotypes = Vec::new();
    if find_child_by_type(member, "static").is_some() {
        stereotypes.push("static".to_string());
    }

    IrOperation {
        name,
        return_type,
        parameters,
        stereotypes,
        tagged_values: Vec::new(),
    }
}

/// Classify a type annotation into a `TypeRef`, emitting an ASSOCIATION edge
/// when the head type identifier resolves to a declared classifier
///
/// Only the head identifier of an annotation participates; generic type
/// arguments and compound types degrade to `UNKNOWN`.
fn classify_type(
    program: &SourceProgram,
    file: &SourceFile,
    annotation: Option<Node>,
    ctx: &mut ExtractionContext,
    owner_id: &str,
) -> TypeRef {
    let Some(annotation) = annotation else {
        return TypeRef::unknown();
    };
    // type_annotation wraps the actual type node
    let type_node = match annotation.kind() {
        "type_annotation" => match annotation.named_child(0) {
            Some(inner) => inner,
            None => return TypeRef::unknown(),
        },
        _ => annotation,
    };

    let Some((name, name_node)) = head_type_name(file, type_node) else {
        return TypeRef::unknown();
    };

    match ctx.resolve_symbol(program, &file.relative_path, &name) {
        SymbolResolution::Resolved(entry) => {
            ctx.add_relation(
                RelationKind::Association,
                owner_id,
                &entry.classifier_id,
                None,
                Vec::new(),
                Some(SourceRef {
                    file: file.relative_path.clone(),
                    line: start_line(&name_node),
                }),
            );
            TypeRef::resolved(name, entry.classifier_id)
        }
        SymbolResolution::UnresolvedContext { specifier } => {
            if let Some(report) = ctx.report.as_mut() {
                let mut tags = BTreeMap::new();
                tags.insert("reference".to_string(), name.clone());
                tags.insert("specifier".to_string(), specifier);
                report.warn(
                    FindingKind::UnresolvedContext,
                    format!("type reference '{}' does not resolve to a declaration", name),
                    SourceRef {
                        file: file.relative_path.clone(),
                        line: start_line(&name_node),
                    },
                    tags,
                );
            }
            TypeRef::unknown()
        }
        SymbolResolution::Unknown => TypeRef::unknown(),
    }
}

/// Head type identifier of a type node
fn head_type_name<'a>(file: &SourceFile, type_node: Node<'a>) -> Option<(String, Node<'a>)> {
    match type_node.kind() {
        "type_identifier" => Some((node_text(&file.content, &type_node), type_node)),
        // Foo[] resolves through its element type
        "array_type" => type_node
            .named_child(0)
            .and_then(|inner| head_type_name(file, inner)),
        // Foo<Bar> resolves through its head; type arguments do not participate
        "generic_type" => type_node
            .child_by_field_name("name")
            .filter(|n| n.kind() == "type_identifier")
            .map(|n| (node_text(&file.content, &n), n)),
        "parenthesized_type" => type_node
            .named_child(0)
            .and_then(|inner| head_type_name(file, inner)),
        _ => None,
    }
}

/// Usage mining for function components; class bodies are handled by
/// `extract_class_members`
fn extract_component_usages(
    program: &SourceProgram,
    file: &SourceFile,
    node: &Node,
    ctx: &mut ExtractionContext,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    if node.kind() == "variable_declarator" && name_node.kind() != "identifier" {
        return;
    }
    let name = node_text(&file.content, &name_node);
    let Some(entry) = ctx.symbols.local(&file.relative_path, &name) else {
        return;
    };
    if entry.kind != ClassifierKind::Component {
        return;
    }
    let owner_id = entry.classifier_id.clone();

    let body = match node.kind() {
        "function_declaration" => node.child_by_field_name("body"),
        "variable_declarator" => node
            .child_by_field_name("value")
            .and_then(|value| value.child_by_field_name("body").or(Some(value))),
        _ => None,
    };
    if let Some(body) = body {
        extract_usage_dependencies(program, file, &body, ctx, &owner_id);
    }
}

/// Usage-only references inside a declaration body: instantiations and direct
/// calls of declared entities become DEPENDENCY edges
fn extract_usage_dependencies(
    program: &SourceProgram,
    file: &SourceFile,
    body: &Node,
    ctx: &mut ExtractionContext,
    owner_id: &str,
) {
    let mut usages: Vec<(String, u32)> = Vec::new();

    for node in find_nodes_by_type(body, "new_expression") {
        if let Some(constructor) = node.child_by_field_name("constructor") {
            if constructor.kind() == "identifier" {
                usages.push((
                    node_text(&file.content, &constructor),
                    start_line(&constructor),
                ));
            }
        }
    }
    for node in find_nodes_by_type(body, "call_expression") {
        if let Some(function) = node.child_by_field_name("function") {
            if function.kind() == "identifier" {
                usages.push((node_text(&file.content, &function), start_line(&function)));
            }
        }
    }

    for (name, line) in usages {
        if let SymbolResolution::Resolved(entry) =
            ctx.resolve_symbol(program, &file.relative_path, &name)
        {
            if entry.classifier_id == owner_id {
                continue;
            }
            ctx.add_relation(
                RelationKind::Dependency,
                owner_id,
                &entry.classifier_id,
                None,
                Vec::new(),
                Some(SourceRef {
                    file: file.relative_path.clone(),
                    line,
                }),
            );
        }
    }
}
