use crate::types::{LocationDirectory, LocationResult};

use std::collections::BTreeSet;

/// Selects a slice of a territorial unit's locations.
#[derive(Debug, Default)]
pub struct LocationFilter {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl LocationFilter {
    pub fn apply(self, directory: LocationDirectory) -> LocationDirectory {
        let mut locations: Vec<_> = directory.into_iter().collect();
        if let Some(off) = self.offset {
            locations = locations.into_iter().skip(off).collect();
        }
        if let Some(lim) = self.limit {
            locations.truncate(lim);
        }
        locations.into_iter().collect()
    }

    pub fn validate(self) -> Result<Self, String> {
        if self.offset.is_some_and(|o| o == 0) {
            return Err("Offset must be greater than 0".to_string());
        }
        if self.limit.is_some_and(|l| l == 0) {
            return Err("Limit must be greater than 0".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug)]
pub struct ScrapeStats {
    pub locations: usize,
    pub with_summary: usize,
    pub without_data: usize,
    pub parties: usize,
}

impl ScrapeStats {
    pub fn from_results(results: &[LocationResult]) -> ScrapeStats {
        ScrapeStats {
            locations: results.len(),
            with_summary: results.iter().filter(|r| r.has_summary()).count(),
            without_data: results.iter().filter(|r| r.is_empty()).count(),
            parties: results
                .iter()
                .flat_map(|r| r.party_votes.keys())
                .collect::<BTreeSet<_>>()
                .len(),
        }
    }
}

impl std::fmt::Display for ScrapeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Locations:              {}", self.locations)?;
        writeln!(f, "  With complete summary:  {}", self.with_summary)?;
        writeln!(f, "  Without any data:       {}", self.without_data)?;
        writeln!(f, "  Distinct parties:       {}", self.parties)
    }
}
