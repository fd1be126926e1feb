//! Content-addressed ID derivation
//!
//! Every identifiable IR element gets a one-way hashed id (MD5, truncated,
//! prefixed by an entity-type tag). Ids derive purely from static structure -
//! qualified name + kind for classifiers, kind + endpoints + discriminator for
//! relations - so id assignment is independent of traversal order. Sequence
//! counters would break that property; do not reintroduce them.

use crate::ir::model::{ClassifierKind, RelationKind};

/// Length of the truncated hex digest carried in ids
const ID_HEX_LEN: usize = 16;

fn digest(input: &str) -> String {
    let digest = md5::compute(input.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..ID_HEX_LEN].to_string()
}

/// Id for a declared or synthetic classifier
pub fn classifier_id(qualified_name: &str, kind: ClassifierKind) -> String {
    format!("cl_{}", digest(&format!("{}:{}", kind, qualified_name)))
}

/// Id for a package, hashed over its root-relative directory path
pub fn package_id(relative_dir: &str) -> String {
    format!("pk_{}", digest(&format!("PACKAGE:{}", relative_dir)))
}

/// Id for a relation; the optional discriminator separates edges of the same
/// kind between the same pair (e.g. distinct import specifiers)
pub fn relation_id(
    kind: RelationKind,
    source_id: &str,
    target_id: &str,
    discriminator: Option<&str>,
) -> String {
    let input = match discriminator {
        Some(disc) => format!("{}:{}->{}:{}", kind, source_id, target_id, disc),
        None => format!("{}:{}->{}", kind, source_id, target_id),
    };
    format!("re_{}", digest(&input))
}

/// Id for an attribute, hashed over its owner's qualified name plus its own name
pub fn attribute_id(owner_qualified_name: &str, name: &str) -> String {
    format!("at_{}", digest(&format!("{}.{}", owner_qualified_name, name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_ids_are_stable_and_kind_discriminated() {
        let a = classifier_id("src/app/user.ts#User", ClassifierKind::Class);
        let b = classifier_id("src/app/user.ts#User", ClassifierKind::Class);
        let c = classifier_id("src/app/user.ts#User", ClassifierKind::Interface);

        assert_eq!(a, b, "same input must hash to the same id");
        assert_ne!(a, c, "kind participates in the hash input");
        assert!(a.starts_with("cl_"));
        assert_eq!(a.len(), "cl_".len() + 16);
    }

    #[test]
    fn relation_discriminator_separates_edges() {
        let plain = relation_id(RelationKind::Dependency, "cl_a", "cl_b", None);
        let disc = relation_id(RelationKind::Dependency, "cl_a", "cl_b", Some("./util"));
        assert_ne!(plain, disc);

        // Repeating the same edge collapses onto one id
        let again = relation_id(RelationKind::Dependency, "cl_a", "cl_b", Some("./util"));
        assert_eq!(disc, again);
    }

    #[test]
    fn package_root_has_distinct_id() {
        assert_ne!(package_id(""), package_id("src"));
    }
}
