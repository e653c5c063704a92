use std::collections::BTreeSet;
use std::io;

use serde::Serialize;

use crate::NOT_AVAILABLE;
use crate::types::LocationResult;

pub const FIXED_COLUMNS: [&str; 5] = [
    "Kód lokality",
    "Název lokality",
    "Voliči v seznamu",
    "Vydané obálky",
    "Platné hlasy",
];

/// All locations flattened into one table.
///
/// The party columns are the sorted union of the parties seen at any location,
/// so every row has the same width; a party that did not appear at a location
/// is filled with `N/A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UnifiedTable {
    pub fn from_results(results: &[LocationResult]) -> Self {
        let parties: BTreeSet<&str> = results
            .iter()
            .flat_map(|r| r.party_votes.keys())
            .map(String::as_str)
            .collect();

        let columns = FIXED_COLUMNS
            .iter()
            .copied()
            .chain(parties.iter().copied())
            .map(str::to_string)
            .collect();

        let rows = results
            .iter()
            .map(|result| {
                let mut row = vec![
                    result.code.to_string(),
                    result.name.clone(),
                    result.registered_voters.to_string(),
                    result.issued_envelopes.to_string(),
                    result.valid_votes.to_string(),
                ];
                row.extend(parties.iter().map(|party| {
                    result
                        .party_votes
                        .get(*party)
                        .map(u64::to_string)
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
                }));
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn party_columns(&self) -> &[String] {
        &self.columns[FIXED_COLUMNS.len()..]
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
