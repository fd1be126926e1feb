//! Package mapper
//!
//! Builds the package hierarchy mirroring the source directory structure.
//! One package per distinct containing directory, including intermediate
//! ancestors; the project root maps to a package with an empty relative path
//! and no parent. Re-running on the same file list is idempotent because ids
//! hash the directory path.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::ir::ids;
use crate::ir::model::IrPackage;

/// Map a sorted list of project-relative file paths to the package tree
///
/// Returns the packages keyed by id plus a directory -> package-id index for
/// classifier ownership lookups.
pub fn map_packages(
    root_name: &str,
    relative_paths: impl IntoIterator<Item = impl AsRef<str>>,
) -> (BTreeMap<String, IrPackage>, HashMap<String, String>) {
    let mut directories: BTreeSet<String> = BTreeSet::new();
    directories.insert(String::new());

    for path in relative_paths {
        let path = path.as_ref();
        let mut dir = match path.rfind('/') {
            Some(idx) => &path[..idx],
            None => "",
        };
        // Record the directory and every intermediate ancestor
        while !dir.is_empty() {
            directories.insert(dir.to_string());
            dir = match dir.rfind('/') {
                Some(idx) => &dir[..idx],
                None => "",
            };
        }
    }

    let mut packages = BTreeMap::new();
    let mut by_dir = HashMap::new();

    for dir in &directories {
        let id = ids::package_id(dir);
        let (name, parent_id) = if dir.is_empty() {
            (root_name.to_string(), None)
        } else {
            let (parent, name) = match dir.rfind('/') {
                Some(idx) => (&dir[..idx], &dir[idx + 1..]),
                None => ("", dir.as_str()),
            };
            (name.to_string(), Some(ids::package_id(parent)))
        };

        by_dir.insert(dir.clone(), id.clone());
        packages.insert(
            id.clone(),
            IrPackage {
                id,
                name,
                qualified_name: dir.clone(),
                parent_id,
            },
        );
    }

    tracing::debug!("Mapped {} packages from source directories", packages.len());
    (packages, by_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intermediate_ancestors_get_packages() {
        let (packages, by_dir) =
            map_packages("project", ["src/app/views/home.ts", "src/index.ts"]);

        // root, src, src/app, src/app/views
        assert_eq!(packages.len(), 4);
        assert!(by_dir.contains_key("src/app"));

        let views = &packages[&by_dir["src/app/views"]];
        assert_eq!(views.name, "views");
        assert_eq!(views.qualified_name, "src/app/views");
        assert_eq!(views.parent_id.as_deref(), Some(by_dir["src/app"].as_str()));
    }

    #[test]
    fn root_package_has_empty_path_and_no_parent() {
        let (packages, by_dir) = map_packages("project", ["index.ts"]);
        let root = &packages[&by_dir[""]];
        assert_eq!(root.qualified_name, "");
        assert!(root.parent_id.is_none());
        assert_eq!(root.name, "project");
    }

    #[test]
    fn mapping_is_idempotent() {
        let first = map_packages("project", ["src/a.ts", "src/b/c.ts"]);
        let second = map_packages("project", ["src/a.ts", "src/b/c.ts"]);
        assert_eq!(first.0, second.0);
    }
}
