//! Per-community counts and global per-mode totals.
//!
//! [`aggregate`] is a pure fold over a [`RawTable`]: it builds one
//! [`CommunityRecord`] per row and returns a fresh [`ModeTotals`]. Nothing is
//! accumulated outside the returned [`Dataset`], so aggregating the same table
//! twice yields the same totals.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use crate::error::{AggregateError, ParseError};
use crate::modes::TravelMode;

/// What to do with a count cell that is not an integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// Fail with [`ParseError::InvalidCount`].
    #[default]
    Strict,
    /// Log a warning and count the cell as zero.
    Zero,
}

/// The tabular file as read from disk: header plus string cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Recognised mode columns in header order, with their positions.
    pub fn mode_columns(&self) -> Vec<(TravelMode, usize)> {
        self.headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| TravelMode::from_column(h.trim()).map(|m| (m, i)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunityRecord {
    pub comm_code: String,
    pub name: String,
    pub sector: Option<String>,
    pub counts: BTreeMap<TravelMode, u64>,
    pub sum: u64,
}

impl CommunityRecord {
    /// Count for `mode`; a column missing from the table reads as zero.
    pub fn count(&self, mode: TravelMode) -> u64 {
        self.counts.get(&mode).copied().unwrap_or(0)
    }
}

/// Sector key for records whose table row names no sector.
pub const UNASSIGNED_SECTOR: &str = "UNASSIGNED";

/// Sum of every record's count, per mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModeTotals(BTreeMap<TravelMode, u64>);

impl ModeTotals {
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a CommunityRecord>,
    ) -> Result<Self, AggregateError> {
        records
            .into_iter()
            .try_fold(ModeTotals::default(), |mut totals, record| {
                totals.add(record)?;
                Ok(totals)
            })
    }

    fn add(&mut self, record: &CommunityRecord) -> Result<(), AggregateError> {
        for (&mode, &count) in &record.counts {
            let total = self.0.entry(mode).or_insert(0);
            *total = total
                .checked_add(count)
                .ok_or_else(|| AggregateError::Overflow {
                    comm_code: record.comm_code.clone(),
                    mode,
                })?;
        }
        Ok(())
    }

    pub fn get(&self, mode: TravelMode) -> u64 {
        self.0.get(&mode).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TravelMode, u64)> + '_ {
        self.0.iter().map(|(m, c)| (*m, *c))
    }
}

/// [`ModeTotals`] per sector (or quadrant). Every record lands in exactly one
/// sector, so the sector totals add up to the city-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectorTotals(BTreeMap<String, ModeTotals>);

impl SectorTotals {
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a CommunityRecord>,
    ) -> Result<Self, AggregateError> {
        records
            .into_iter()
            .try_fold(SectorTotals::default(), |mut sectors, record| {
                let sector = record.sector.as_deref().unwrap_or(UNASSIGNED_SECTOR);
                sectors.0.entry(sector.to_string()).or_default().add(record)?;
                Ok(sectors)
            })
    }

    pub fn get(&self, sector: &str) -> Option<&ModeTotals> {
        self.0.get(sector)
    }

    /// Totals for the sector `record` belongs to.
    pub fn for_record(&self, record: &CommunityRecord) -> Option<&ModeTotals> {
        self.get(record.sector.as_deref().unwrap_or(UNASSIGNED_SECTOR))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModeTotals)> + '_ {
        self.0.iter().map(|(s, t)| (s.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Records in table order plus the totals folded over them.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CommunityRecord>,
    index: HashMap<String, usize>,
    totals: ModeTotals,
    sectors: SectorTotals,
    modes: Vec<TravelMode>,
}

impl Dataset {
    /// Builds a dataset from already-parsed records, recomputing the totals.
    pub fn from_records(
        records: Vec<CommunityRecord>,
        modes: Vec<TravelMode>,
    ) -> Result<Self, AggregateError> {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.comm_code.clone(), i))
            .collect();
        let totals = ModeTotals::from_records(&records)?;
        let sectors = SectorTotals::from_records(&records)?;
        Ok(Self {
            records,
            index,
            totals,
            sectors,
            modes,
        })
    }

    pub fn records(&self) -> &[CommunityRecord] {
        &self.records
    }

    pub fn get(&self, comm_code: &str) -> Option<&CommunityRecord> {
        self.index.get(comm_code).map(|&i| &self.records[i])
    }

    pub fn totals(&self) -> &ModeTotals {
        &self.totals
    }

    pub fn sectors(&self) -> &SectorTotals {
        &self.sectors
    }

    /// Recognised mode columns present in the table header.
    pub fn modes(&self) -> &[TravelMode] {
        &self.modes
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a comma-grouped count such as `"1,234"`.
///
/// An empty cell is zero. Signs, decimals and anything else non-numeric are
/// rejected; `field` and `row` only label the error.
pub fn parse_count(s: &str, field: &str, row: usize) -> Result<u64, ParseError> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0);
    }
    if !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(s, field, row));
    }
    cleaned.parse::<u64>().map_err(|_| invalid(s, field, row))
}

fn invalid(s: &str, field: &str, row: usize) -> ParseError {
    ParseError::InvalidCount {
        field: field.to_string(),
        row,
        value: s.to_string(),
    }
}

/// Folds every row of `table` into a [`Dataset`].
pub fn aggregate(table: &RawTable, policy: CountPolicy) -> Result<Dataset, AggregateError> {
    let code_idx = table
        .column_index("comm_code")
        .ok_or(AggregateError::MissingColumn("comm_code"))?;
    let name_idx = table.column_index("name");
    let sector_idx = table
        .column_index("sector")
        .or_else(|| table.column_index("quadrant"));
    let mode_columns = table.mode_columns();

    let mut records = Vec::with_capacity(table.rows.len());
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, row) in table.rows.iter().enumerate() {
        let row_number = i + 1;
        let cell = |idx: usize| row.get(idx).map(|s| s.trim()).unwrap_or("");

        let comm_code = cell(code_idx).to_string();
        if let Some(&first_row) = seen.get(&comm_code) {
            return Err(AggregateError::DuplicateCommunity {
                comm_code,
                first_row,
                row: row_number,
            });
        }
        seen.insert(comm_code.clone(), row_number);

        let mut counts = BTreeMap::new();
        let mut sum = 0u64;
        for &(mode, idx) in &mode_columns {
            let raw = cell(idx);
            let count = match parse_count(raw, mode.column(), row_number) {
                Ok(c) => c,
                Err(e) => match policy {
                    CountPolicy::Strict => return Err(e.into()),
                    CountPolicy::Zero => {
                        warn!(
                            field = mode.column(),
                            row = row_number,
                            value = raw,
                            comm_code = %comm_code,
                            "Unparseable count, using zero"
                        );
                        0
                    }
                },
            };
            sum = sum
                .checked_add(count)
                .ok_or_else(|| AggregateError::Overflow {
                    comm_code: comm_code.clone(),
                    mode,
                })?;
            counts.insert(mode, count);
        }

        records.push(CommunityRecord {
            comm_code,
            name: name_idx.map(|idx| cell(idx).to_string()).unwrap_or_default(),
            sector: sector_idx
                .map(|idx| cell(idx).to_string())
                .filter(|s| !s.is_empty()),
            counts,
            sum,
        });
    }

    let modes = mode_columns.into_iter().map(|(m, _)| m).collect();
    let dataset = Dataset::from_records(records, modes)?;
    debug!(
        records = dataset.len(),
        modes = dataset.modes().len(),
        sectors = dataset.sectors().len(),
        "Aggregated commute table"
    );
    Ok(dataset)
}
