//! Per-run extraction state
//!
//! Each extraction run owns one [`ExtractionContext`]: the classifier map,
//! the relation list, the pass-1 symbol table and the lazy module-classifier
//! registry. The context is explicit, passed-by-reference state - never
//! ambient or global - so concurrent or repeated runs cannot share or leak
//! mutable resolution tables.

use std::collections::{BTreeMap, HashMap};

use crate::extract::imports::resolve_specifier;
use crate::ir::ids;
use crate::ir::model::{
    ClassifierKind, IrClassifier, IrPackage, IrRelation, RelationKind, SourceRef, TaggedValue,
};
use crate::project::SourceProgram;
use crate::report::ExtractionReport;

/// What a declared symbol maps to
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub classifier_id: String,
    pub kind: ClassifierKind,
}

/// An import binding recorded during the declaration pass
#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// The module specifier as written
    pub specifier: String,
    /// Name in the source module ("default" for default imports)
    pub imported: String,
}

/// Outcome of resolving a name against the symbol table
pub enum SymbolResolution {
    /// The name maps to a declared classifier
    Resolved(SymbolEntry),
    /// The name was imported through a relative specifier that resolves to an
    /// in-project file, but no matching declaration exists there
    UnresolvedContext { specifier: String },
    /// Plain unknown name (external or undeclared); not reportable
    Unknown,
}

/// Symbol table built by the declaration pass, consumed by the member pass
/// and the framework extractors
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// (file, declared name) -> classifier
    declarations: HashMap<(String, String), SymbolEntry>,
    /// (file, local name) -> import binding
    imports: HashMap<(String, String), ImportBinding>,
}

impl SymbolTable {
    pub fn declare(&mut self, file: &str, name: &str, entry: SymbolEntry) {
        self.declarations
            .insert((file.to_string(), name.to_string()), entry);
    }

    pub fn bind_import(&mut self, file: &str, local_name: &str, binding: ImportBinding) {
        self.imports
            .insert((file.to_string(), local_name.to_string()), binding);
    }

    pub fn local(&self, file: &str, name: &str) -> Option<&SymbolEntry> {
        self.declarations
            .get(&(file.to_string(), name.to_string()))
    }

    pub fn import_binding(&self, file: &str, name: &str) -> Option<&ImportBinding> {
        self.imports.get(&(file.to_string(), name.to_string()))
    }
}

/// All mutable state for one extraction run
pub struct ExtractionContext {
    pub packages: BTreeMap<String, IrPackage>,
    package_by_dir: HashMap<String, String>,
    classifiers: HashMap<String, IrClassifier>,
    pub relations: Vec<IrRelation>,
    pub symbols: SymbolTable,
    pub report: Option<ExtractionReport>,
}

impl ExtractionContext {
    pub fn new(
        packages: BTreeMap<String, IrPackage>,
        package_by_dir: HashMap<String, String>,
        report: Option<ExtractionReport>,
    ) -> Self {
        Self {
            packages,
            package_by_dir,
            classifiers: HashMap::new(),
            relations: Vec::new(),
            symbols: SymbolTable::default(),
            report,
        }
    }

    /// Owning package for a project-relative file path
    pub fn package_for_file(&self, relative_path: &str) -> String {
        let dir = match relative_path.rfind('/') {
            Some(idx) => &relative_path[..idx],
            None => "",
        };
        self.package_by_dir
            .get(dir)
            .cloned()
            .unwrap_or_else(|| ids::package_id(""))
    }

    pub fn insert_classifier(&mut self, classifier: IrClassifier) {
        self.classifiers.insert(classifier.id.clone(), classifier);
    }

    pub fn classifier(&self, id: &str) -> Option<&IrClassifier> {
        self.classifiers.get(id)
    }

    pub fn classifier_mut(&mut self, id: &str) -> Option<&mut IrClassifier> {
        self.classifiers.get_mut(id)
    }

    pub fn into_parts(self) -> (Vec<IrPackage>, Vec<IrClassifier>, Vec<IrRelation>, Option<ExtractionReport>) {
        (
            self.packages.into_values().collect(),
            self.classifiers.into_values().collect(),
            self.relations,
            self.report,
        )
    }

    /// Lazily materialize the synthetic per-file MODULE classifier
    ///
    /// Idempotent per relative file path; repeated calls return the same id.
    pub fn module_classifier(&mut self, relative_path: &str) -> String {
        let id = ids::classifier_id(relative_path, ClassifierKind::Module);
        if !self.classifiers.contains_key(&id) {
            let name = relative_path
                .rsplit('/')
                .next()
                .unwrap_or(relative_path)
                .to_string();
            let package_id = self.package_for_file(relative_path);
            self.classifiers.insert(
                id.clone(),
                IrClassifier {
                    id: id.clone(),
                    name,
                    qualified_name: relative_path.to_string(),
                    kind: ClassifierKind::Module,
                    package_id,
                    stereotypes: Vec::new(),
                    tagged_values: Vec::new(),
                    attributes: Vec::new(),
                    operations: Vec::new(),
                },
            );
        }
        id
    }

    /// Append a relation; repeated edges collapse later via their hashed id
    pub fn add_relation(
        &mut self,
        kind: RelationKind,
        source_id: &str,
        target_id: &str,
        discriminator: Option<&str>,
        tagged_values: Vec<TaggedValue>,
        source: Option<SourceRef>,
    ) {
        self.relations.push(IrRelation {
            id: ids::relation_id(kind, source_id, target_id, discriminator),
            kind,
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            tagged_values,
            source,
        });
    }

    /// Resolve a name used in `file` through local declarations, then import
    /// bindings. Bare-specifier imports that cannot be resolved are treated as
    /// external dependencies, not defects.
    pub fn resolve_symbol(
        &self,
        program: &SourceProgram,
        file: &str,
        name: &str,
    ) -> SymbolResolution {
        if let Some(entry) = self.symbols.local(file, name) {
            return SymbolResolution::Resolved(entry.clone());
        }

        let Some(binding) = self.symbols.import_binding(file, name) else {
            return SymbolResolution::Unknown;
        };

        match resolve_specifier(program, file, &binding.specifier) {
            Some(target_file) => {
                if let Some(entry) = self.symbols.local(&target_file, &binding.imported) {
                    return SymbolResolution::Resolved(entry.clone());
                }
                // Declaration files carry external typing surface only
                if program.is_declaration(&target_file) {
                    return SymbolResolution::Unknown;
                }
                // The module resolved but the named declaration is missing
                if binding.specifier.starts_with('.') {
                    SymbolResolution::UnresolvedContext {
                        specifier: binding.specifier.clone(),
                    }
                } else {
                    SymbolResolution::Unknown
                }
            }
            None => SymbolResolution::Unknown,
        }
    }
}
