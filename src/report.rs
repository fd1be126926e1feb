//! Extraction report - append-only findings collector
//!
//! Created once per extraction run when the caller requests tracking.
//! Any pass appends findings as side effects of resolution failures;
//! `finalize` consumes the report and returns an immutable snapshot, so the
//! type system rules out late appends. The unresolved-finding count drives
//! the CLI fail-fast exit code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::model::SourceRef;

/// Finding kinds - the closed set of reportable anomalies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    UnresolvedImport,
    UnresolvedContext,
}

impl FindingKind {
    /// Whether this kind counts toward the fail-on-unresolved exit contract
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            FindingKind::UnresolvedImport | FindingKind::UnresolvedContext
        )
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingKind::UnresolvedImport => write!(f, "unresolvedImport"),
            FindingKind::UnresolvedContext => write!(f, "unresolvedContext"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A recorded, non-fatal extraction anomaly
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    pub location: SourceRef,
    /// Free-form key/value context (e.g. specifier, origin)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Mutable collector, alive for the duration of one extraction run
#[derive(Debug)]
pub struct ExtractionReport {
    tool_name: String,
    tool_version: String,
    project_root: String,
    findings: Vec<Finding>,
}

impl ExtractionReport {
    pub fn new(project_root: impl Into<String>) -> Self {
        Self {
            tool_name: env!("CARGO_PKG_NAME").to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            project_root: project_root.into(),
            findings: Vec::new(),
        }
    }

    pub fn add(&mut self, finding: Finding) {
        tracing::debug!(
            "finding: {} [{}] {} ({}:{})",
            finding.kind,
            finding.severity,
            finding.message,
            finding.location.file,
            finding.location.line
        );
        self.findings.push(finding);
    }

    pub fn warn(
        &mut self,
        kind: FindingKind,
        message: impl Into<String>,
        location: SourceRef,
        tags: BTreeMap<String, String>,
    ) {
        self.add(Finding {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            location,
            tags,
        });
    }

    /// Compute the summary and freeze the report
    ///
    /// Consumes the collector; called exactly once, after all passes complete.
    pub fn finalize(self) -> ReportSnapshot {
        let mut by_kind: BTreeMap<FindingKind, usize> = BTreeMap::new();
        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        for finding in &self.findings {
            *by_kind.entry(finding.kind).or_default() += 1;
            *by_severity.entry(finding.severity).or_default() += 1;
        }

        let mut findings = self.findings;
        // Canonical finding order: location, then kind
        findings.sort_by(|a, b| {
            (&a.location.file, a.location.line, a.kind)
                .cmp(&(&b.location.file, b.location.line, b.kind))
        });

        ReportSnapshot {
            tool_name: self.tool_name,
            tool_version: self.tool_version,
            project_root: self.project_root,
            findings,
            by_kind,
            by_severity,
        }
    }
}

/// Immutable, summarized report produced by [`ExtractionReport::finalize`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    pub tool_name: String,
    pub tool_version: String,
    pub project_root: String,
    pub findings: Vec<Finding>,
    pub by_kind: BTreeMap<FindingKind, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl ReportSnapshot {
    /// Count of findings whose kind participates in the fail-fast contract
    pub fn unresolved_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.kind.is_unresolved())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(file: &str, line: u32) -> SourceRef {
        SourceRef {
            file: file.to_string(),
            line,
        }
    }

    #[test]
    fn finalize_computes_per_kind_and_per_severity_counts() {
        let mut report = ExtractionReport::new("/tmp/project");
        report.warn(
            FindingKind::UnresolvedImport,
            "cannot resolve './missing'",
            location("src/a.ts", 3),
            BTreeMap::new(),
        );
        report.warn(
            FindingKind::UnresolvedContext,
            "unknown reference 'Widget'",
            location("src/b.ts", 7),
            BTreeMap::new(),
        );

        let snapshot = report.finalize();
        assert_eq!(snapshot.by_kind[&FindingKind::UnresolvedImport], 1);
        assert_eq!(snapshot.by_kind[&FindingKind::UnresolvedContext], 1);
        assert_eq!(snapshot.by_severity[&Severity::Warning], 2);
        assert_eq!(snapshot.unresolved_count(), 2);
    }

    #[test]
    fn snapshot_orders_findings_by_location() {
        let mut report = ExtractionReport::new("/tmp/project");
        report.warn(
            FindingKind::UnresolvedImport,
            "second",
            location("src/b.ts", 1),
            BTreeMap::new(),
        );
        report.warn(
            FindingKind::UnresolvedImport,
            "first",
            location("src/a.ts", 9),
            BTreeMap::new(),
        );

        let snapshot = report.finalize();
        assert_eq!(snapshot.findings[0].message, "first");
    }

    #[test]
    fn finding_kind_serializes_with_unresolved_prefix() {
        let json = serde_json::to_string(&FindingKind::UnresolvedImport).unwrap();
        assert_eq!(json, "\"unresolvedImport\"");
        assert!(FindingKind::UnresolvedImport.to_string().starts_with("unresolved"));
    }
}
