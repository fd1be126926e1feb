//! Canonicalization - deterministic reordering of IR collections
//!
//! A pure, order-independent transform applied once after model assembly.
//! Combined with content-addressed ids this is what makes two extraction runs
//! over the same sources byte-identical regardless of traversal order.

use std::collections::HashSet;

use crate::ir::model::{IrClassifier, IrModel, TaggedValue};

/// Reorder every identifiable collection into its canonical order and drop
/// duplicate relations (first occurrence wins; ids are content-addressed so
/// duplicates are exact repeats of the same edge).
pub fn canonicalize(model: &mut IrModel) {
    let mut seen: HashSet<String> = HashSet::new();
    model.relations.retain(|r| seen.insert(r.id.clone()));

    model.packages.sort_by(|a, b| a.id.cmp(&b.id));
    model.classifiers.sort_by(|a, b| a.id.cmp(&b.id));
    model.relations.sort_by(|a, b| a.id.cmp(&b.id));

    for classifier in &mut model.classifiers {
        canonicalize_classifier(classifier);
    }

    sort_tagged_values(&mut model.tagged_values);
}

fn canonicalize_classifier(classifier: &mut IrClassifier) {
    classifier.attributes.sort_by(|a, b| a.id.cmp(&b.id));
    // Operations carry no id; order on name plus parameter names
    classifier
        .operations
        .sort_by_key(|op| (op.name.clone(), op.parameters.iter().map(|p| p.name.clone()).collect::<Vec<_>>()));

    for op in &mut classifier.operations {
        op.parameters.sort_by(|a, b| a.name.cmp(&b.name));
        op.stereotypes.sort();
        sort_tagged_values(&mut op.tagged_values);
    }
    for attr in &mut classifier.attributes {
        attr.stereotypes.sort();
        sort_tagged_values(&mut attr.tagged_values);
    }

    classifier.stereotypes.sort();
    sort_tagged_values(&mut classifier.tagged_values);
}

fn sort_tagged_values(values: &mut [TaggedValue]) {
    values.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.value.cmp(&b.value)));
}

/// Drop the legacy per-element `stereotypes` arrays, superseded by tagged
/// values in schema generation 2. Must run strictly after [`canonicalize`];
/// stereotype removal must not feed back into ordering decisions.
pub fn strip_legacy_stereotypes(model: &mut IrModel) {
    for classifier in &mut model.classifiers {
        classifier.stereotypes.clear();
        for attr in &mut classifier.attributes {
            attr.stereotypes.clear();
        }
        for op in &mut classifier.operations {
            op.stereotypes.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ids;
    use crate::ir::model::{
        ClassifierKind, IrClassifier, IrPackage, IrRelation, RelationKind,
    };

    fn classifier(qn: &str, kind: ClassifierKind) -> IrClassifier {
        IrClassifier {
            id: ids::classifier_id(qn, kind),
            name: qn.rsplit('#').next().unwrap_or(qn).to_string(),
            qualified_name: qn.to_string(),
            kind,
            package_id: ids::package_id(""),
            stereotypes: Vec::new(),
            tagged_values: Vec::new(),
            attributes: Vec::new(),
            operations: Vec::new(),
        }
    }

    fn relation(kind: RelationKind, from: &str, to: &str) -> IrRelation {
        IrRelation {
            id: ids::relation_id(kind, from, to, None),
            kind,
            source_id: from.to_string(),
            target_id: to.to_string(),
            tagged_values: Vec::new(),
            source: None,
        }
    }

    #[test]
    fn canonicalize_is_order_independent() {
        let root = IrPackage {
            id: ids::package_id(""),
            name: "project".to_string(),
            qualified_name: String::new(),
            parent_id: None,
        };
        let a = classifier("a.ts#A", ClassifierKind::Class);
        let b = classifier("b.ts#B", ClassifierKind::Class);
        let edge = relation(RelationKind::Association, &a.id, &b.id);

        let mut forward = IrModel::new();
        forward.packages.push(root.clone());
        forward.classifiers = vec![a.clone(), b.clone()];
        forward.relations = vec![edge.clone()];

        let mut reversed = IrModel::new();
        reversed.packages.push(root);
        reversed.classifiers = vec![b, a];
        reversed.relations = vec![edge.clone(), edge];

        canonicalize(&mut forward);
        canonicalize(&mut reversed);

        assert_eq!(forward, reversed);
        assert_eq!(reversed.relations.len(), 1, "duplicate edges collapse");
    }

    #[test]
    fn strip_legacy_stereotypes_clears_all_levels() {
        let mut model = IrModel::new();
        let mut c = classifier("a.ts#A", ClassifierKind::Component);
        c.stereotypes.push("component".to_string());
        model.classifiers.push(c);

        canonicalize(&mut model);
        strip_legacy_stereotypes(&mut model);

        assert!(model.classifiers[0].stereotypes.is_empty());
    }
}
