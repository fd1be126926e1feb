//! Tree navigation helpers shared by the extraction passes

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::Node;

static IDENTIFIER_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$][a-zA-Z0-9_$]*").expect("valid identifier pattern"));

/// Get the source text covered by a node
pub fn node_text(content: &str, node: &Node) -> String {
    let start_byte = node.start_byte();
    let end_byte = node.end_byte();

    let content_bytes = content.as_bytes();
    if start_byte < content_bytes.len() && end_byte <= content_bytes.len() {
        String::from_utf8_lossy(&content_bytes[start_byte..end_byte]).to_string()
    } else {
        String::new()
    }
}

/// 1-based line number of a node's start position
pub fn start_line(node: &Node) -> u32 {
    (node.start_position().row + 1) as u32
}

/// Find the first direct child of the given kind
pub fn find_child_by_type<'a>(node: &Node<'a>, child_type: &str) -> Option<Node<'a>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == child_type {
                return Some(child);
            }
        }
    }
    None
}

/// Collect all direct children of the given kind
pub fn find_children_by_type<'a>(node: &Node<'a>, child_type: &str) -> Vec<Node<'a>> {
    let mut results = Vec::new();
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == child_type {
                results.push(child);
            }
        }
    }
    results
}

/// Collect all descendants of the given kind (depth-first)
pub fn find_nodes_by_type<'a>(node: &Node<'a>, node_type: &str) -> Vec<Node<'a>> {
    let mut nodes = Vec::new();
    find_nodes_by_type_recursive(node, node_type, &mut nodes);
    nodes
}

fn find_nodes_by_type_recursive<'a>(node: &Node<'a>, node_type: &str, nodes: &mut Vec<Node<'a>>) {
    if node.kind() == node_type {
        nodes.push(*node);
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            find_nodes_by_type_recursive(&child, node_type, nodes);
        }
    }
}

/// Extract a leading identifier from arbitrary node text
///
/// Fallback for nodes without a `name` field; mirrors the grammar's
/// identifier shape including `$`.
pub fn leading_identifier(text: &str) -> Option<String> {
    IDENTIFIER_HEAD
        .find(text.trim())
        .map(|m| m.as_str().to_string())
}

/// Unwrap nested parenthesized expressions
pub fn unwrap_parens<'a>(mut node: Node<'a>) -> Node<'a> {
    while node.kind() == "parenthesized_expression" {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Strip surrounding string quotes from a literal's text
pub fn strip_quotes(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}
