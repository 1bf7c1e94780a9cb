//! Boundaries joined to their commute records.

use std::collections::HashSet;
use tracing::warn;

use crate::aggregate::{CommunityRecord, Dataset};
use crate::error::AggregateError;
use crate::loader::Boundary;

/// Communities that failed to match across the two inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    /// Boundary codes with no table row; drawn with the no-data colour.
    pub missing_rows: Vec<String>,
    /// Table rows with no boundary; dropped before totals are computed.
    pub orphan_rows: Vec<String>,
}

/// The joined data every render works from.
#[derive(Debug, Clone)]
pub struct Atlas {
    boundaries: Vec<Boundary>,
    dataset: Dataset,
    report: JoinReport,
}

impl Atlas {
    /// Joins by `comm_code`. Rows without a boundary are excluded and the
    /// totals are folded again over the rows that remain.
    pub fn join(boundaries: Vec<Boundary>, dataset: Dataset) -> Result<Self, AggregateError> {
        let codes: HashSet<&str> = boundaries.iter().map(|b| b.comm_code.as_str()).collect();

        let missing_rows: Vec<String> = boundaries
            .iter()
            .filter(|b| dataset.get(&b.comm_code).is_none())
            .map(|b| b.comm_code.clone())
            .collect();

        let (kept, orphans): (Vec<CommunityRecord>, Vec<CommunityRecord>) = dataset
            .records()
            .iter()
            .cloned()
            .partition(|r| codes.contains(r.comm_code.as_str()));

        let orphan_rows: Vec<String> = orphans.into_iter().map(|r| r.comm_code).collect();
        if !orphan_rows.is_empty() {
            warn!(
                count = orphan_rows.len(),
                codes = ?orphan_rows,
                "Table rows without a boundary excluded from totals"
            );
        }
        if !missing_rows.is_empty() {
            warn!(
                count = missing_rows.len(),
                codes = ?missing_rows,
                "Boundaries without a table row drawn as no-data"
            );
        }

        let dataset = Dataset::from_records(kept, dataset.modes().to_vec())?;
        Ok(Self {
            boundaries,
            dataset,
            report: JoinReport {
                missing_rows,
                orphan_rows,
            },
        })
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn report(&self) -> &JoinReport {
        &self.report
    }

    pub fn record(&self, comm_code: &str) -> Option<&CommunityRecord> {
        self.dataset.get(comm_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::TravelMode;
    use std::collections::BTreeMap;

    fn boundary(code: &str) -> Boundary {
        Boundary {
            comm_code: code.to_string(),
            name: code.to_string(),
            sector: None,
            polygons: vec![vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]],
        }
    }

    fn record(code: &str, walk: u64) -> CommunityRecord {
        CommunityRecord {
            comm_code: code.to_string(),
            name: code.to_string(),
            sector: None,
            counts: BTreeMap::from([(TravelMode::Walk, walk)]),
            sum: walk,
        }
    }

    #[test]
    fn test_join_reports_both_directions() {
        let dataset = Dataset::from_records(
            vec![record("BEL", 10), record("ZZZ", 90)],
            vec![TravelMode::Walk],
        )
        .unwrap();
        let atlas = Atlas::join(vec![boundary("BEL"), boundary("ABB")], dataset).unwrap();

        assert_eq!(atlas.report().missing_rows, ["ABB"]);
        assert_eq!(atlas.report().orphan_rows, ["ZZZ"]);
        assert!(atlas.record("ZZZ").is_none());
        assert!(atlas.record("ABB").is_none());
        assert_eq!(atlas.dataset().totals().get(TravelMode::Walk), 10);
        assert_eq!(atlas.dataset().modes(), &[TravelMode::Walk]);
    }
}
