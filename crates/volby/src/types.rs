use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use serde::{Serialize, Serializer};

use crate::NOT_AVAILABLE;

/// Party name to number of votes, ordered by party name.
pub type PartyVotes = BTreeMap<String, u64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub code: u32,
    pub name: String,
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>6}  {}", self.code, self.name)
    }
}

/// Municipalities of one territorial unit in listing order.
///
/// Codes are unique. Inserting a code that is already present replaces its
/// name but keeps the position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDirectory {
    locations: Vec<Location>,
    positions: HashMap<u32, usize>,
}

impl LocationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: u32, name: String) {
        match self.positions.get(&code) {
            Some(&pos) => self.locations[pos].name = name,
            None => {
                self.positions.insert(code, self.locations.len());
                self.locations.push(Location { code, name });
            }
        }
    }

    pub fn get(&self, code: u32) -> Option<&Location> {
        self.positions.get(&code).map(|&pos| &self.locations[pos])
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }
}

impl FromIterator<Location> for LocationDirectory {
    fn from_iter<I: IntoIterator<Item = Location>>(iter: I) -> Self {
        let mut directory = LocationDirectory::new();
        for location in iter {
            directory.insert(location.code, location.name);
        }
        directory
    }
}

impl IntoIterator for LocationDirectory {
    type Item = Location;
    type IntoIter = std::vec::IntoIter<Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.into_iter()
    }
}

impl<'a> IntoIterator for &'a LocationDirectory {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}

impl Serialize for LocationDirectory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.locations.serialize(serializer)
    }
}

/// A value read from a page, or the fact that the page did not have it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field {
    Present(String),
    #[default]
    Unavailable,
}

impl Field {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Field::Present(value) => Some(value),
            Field::Unavailable => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Field::Present(_))
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_deref().unwrap_or(NOT_AVAILABLE))
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_deref().unwrap_or(NOT_AVAILABLE))
    }
}

/// Everything read from one municipality's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElectionDetail {
    pub registered_voters: Field,
    pub issued_envelopes: Field,
    pub valid_votes: Field,
    pub party_votes: PartyVotes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationResult {
    pub code: u32,
    pub name: String,
    pub registered_voters: Field,
    pub issued_envelopes: Field,
    pub valid_votes: Field,
    pub party_votes: PartyVotes,
}

impl LocationResult {
    pub fn new(location: Location, detail: ElectionDetail) -> Self {
        Self {
            code: location.code,
            name: location.name,
            registered_voters: detail.registered_voters,
            issued_envelopes: detail.issued_envelopes,
            valid_votes: detail.valid_votes,
            party_votes: detail.party_votes,
        }
    }

    pub fn has_summary(&self) -> bool {
        self.registered_voters.is_present()
            && self.issued_envelopes.is_present()
            && self.valid_votes.is_present()
    }

    /// True when the detail page yielded neither summary counters nor parties.
    pub fn is_empty(&self) -> bool {
        !self.registered_voters.is_present()
            && !self.issued_envelopes.is_present()
            && !self.valid_votes.is_present()
            && self.party_votes.is_empty()
    }
}

impl Display for LocationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ {} {}", self.code, self.name)?;
        writeln!(
            f,
            "│  Registered: {} · Envelopes: {} · Valid: {}",
            self.registered_voters, self.issued_envelopes, self.valid_votes
        )?;
        write!(f, "└─ {} part(ies)", self.party_votes.len())
    }
}
