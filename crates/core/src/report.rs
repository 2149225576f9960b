//! Run summaries returned to the operator.

use std::fmt;

use serde::Serialize;

use crate::record::RecordId;
use crate::retention::Retention;
use crate::target::DedupTarget;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexOutcome {
    /// The unique index exists (newly built, or already present with the same spec).
    Created { name: String },
    /// Not attempted (dry run).
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub target: DedupTarget,
    pub dry_run: bool,
    /// Deletion passes that found at least one duplicate group.
    pub passes: u32,
    pub groups_found: usize,
    pub deleted: Vec<RecordId>,
    /// Records already gone when their delete ran.
    pub skipped: Vec<RecordId>,
    /// Records a dry run would have deleted.
    pub planned: Vec<RecordId>,
    pub index: IndexOutcome,
}

impl DedupReport {
    #[must_use]
    pub fn new(target: DedupTarget, dry_run: bool) -> Self {
        Self {
            target,
            dry_run,
            passes: 0,
            groups_found: 0,
            deleted: Vec::new(),
            skipped: Vec::new(),
            planned: Vec::new(),
            index: IndexOutcome::Skipped,
        }
    }

    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

impl fmt::Display for DedupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.target)?;
        if self.dry_run {
            writeln!(
                f,
                "  dry run: {} duplicate groups, {} records would be deleted",
                self.groups_found,
                self.planned.len()
            )?;
            for id in &self.planned {
                writeln!(f, "    would delete {id}")?;
            }
        } else {
            writeln!(
                f,
                "  {} duplicate groups over {} passes, {} deleted, {} already gone",
                self.groups_found,
                self.passes,
                self.deleted.len(),
                self.skipped.len()
            )?;
        }
        match &self.index {
            IndexOutcome::Created { name } => write!(f, "  unique index {name} created"),
            IndexOutcome::Skipped => write!(f, "  unique index not created"),
        }
    }
}

/// Read-only view of the duplicate groups in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub target: DedupTarget,
    pub groups: Vec<Retention>,
}

impl ScanReport {
    #[must_use]
    pub fn surplus(&self) -> usize {
        self.groups.iter().map(|g| g.discard.len()).sum()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.target)?;
        write!(f, "  {} duplicate groups, {} surplus records", self.groups.len(), self.surplus())?;
        for group in &self.groups {
            write!(f, "\n  {} keep {} ({})", group.key_value, group.keep.id, group.keep.timestamp)?;
            for dropped in &group.discard {
                write!(f, "\n    drop {} ({})", dropped.id, dropped.timestamp)?;
            }
        }
        Ok(())
    }
}

/// Indexes installed on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub collection: String,
    pub indexes: Vec<String>,
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} indexes ensured", self.collection, self.indexes.len())?;
        for name in &self.indexes {
            write!(f, "\n  {name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record::{GroupKeyValue, RecordRef, Timestamp};

    #[test]
    fn test_dedup_report_display() {
        let mut report = DedupReport::new(DedupTarget::transfers("boon_transfers").unwrap(), false);
        report.passes = 1;
        report.groups_found = 1;
        report.deleted.push(RecordId::Int(1));
        report.index = IndexOutcome::Created { name: "signature_1".to_owned() };
        let text = report.to_string();
        assert!(text.contains("boon_transfers"));
        assert!(text.contains("1 deleted"));
        assert!(text.contains("unique index signature_1 created"));
        assert_eq!(report.deleted_count(), 1);
    }

    #[test]
    fn test_dry_run_report_lists_planned() {
        let mut report = DedupReport::new(DedupTarget::wallet_rewards(), true);
        report.planned.push(RecordId::Text("dup".to_owned()));
        let text = report.to_string();
        assert!(text.contains("would delete \"dup\""));
        assert!(text.contains("not created"));
    }

    #[test]
    fn test_scan_report_surplus_and_json() {
        let report = ScanReport {
            target: DedupTarget::transfers("tnt_transfers").unwrap(),
            groups: vec![Retention {
                key_value: GroupKeyValue(vec![json!("sig")]),
                keep: RecordRef::new(RecordId::Int(2), Timestamp::Numeric(2.0)),
                discard: vec![
                    RecordRef::new(RecordId::Int(1), Timestamp::Numeric(1.0)),
                    RecordRef::new(RecordId::Int(0), Timestamp::Missing),
                ],
            }],
        };
        assert_eq!(report.surplus(), 2);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["target"]["collection"], "tnt_transfers");
        assert_eq!(value["groups"][0]["keep"]["id"]["value"], 2);
        assert!(report.to_string().contains("drop 0 (<missing>)"));
    }
}
