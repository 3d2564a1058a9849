use std::{error::Error, fmt::Display, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mass::MassDelta;

/// Where on a peptide a modification may occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Site {
    Anywhere,
    NTerminal,
    CTerminal,
}

impl Site {
    pub const fn code(&self) -> &'static str {
        match self {
            Site::Anywhere => "*",
            Site::NTerminal => "N",
            Site::CTerminal => "C",
        }
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::Anywhere
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteParsingError {
    Empty,
    UnknownSite(String),
}

impl Display for SiteParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match &self {
            Self::Empty => "Modification site cannot be an empty string".to_string(),
            Self::UnknownSite(label) => {
                format!("Unknown modification site \"{}\", expected N, C or *", label)
            }
        };
        f.write_str(&text)
    }
}

impl Error for SiteParsingError {}

impl FromStr for Site {
    type Err = SiteParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(SiteParsingError::Empty),
            "*" => Ok(Site::Anywhere),
            "N" | "n" => Ok(Site::NTerminal),
            "C" | "c" => Ok(Site::CTerminal),
            _ => Err(SiteParsingError::UnknownSite(s.to_string())),
        }
    }
}

impl Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A mass shift on `residue` at `site`. `delta` is the mass the modification
/// adds to the residue, so searches look for trie paths that weigh `delta`
/// less than the query block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Modification {
    pub site: Site,
    pub residue: u8,
    pub delta: MassDelta,
}

impl Modification {
    pub fn new(site: Site, residue: u8, delta: MassDelta) -> Self {
        Self { site, residue, delta }
    }
}

/// All the deltas configured for one residue at one site class, in the
/// order they were declared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModificationGroup {
    pub residue: u8,
    pub deltas: Vec<MassDelta>,
}

impl ModificationGroup {
    pub fn new(residue: u8) -> Self {
        Self { residue, deltas: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

/// Modification groups for each site class, ordered by residue symbol.
///
/// The position of a group in its site class is what the modification
/// tolerant search's counters index into.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModificationTable {
    pub anywhere: Vec<ModificationGroup>,
    pub n_terminal: Vec<ModificationGroup>,
    pub c_terminal: Vec<ModificationGroup>,
}

impl ModificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, modification: Modification) {
        let groups = match modification.site {
            Site::Anywhere => &mut self.anywhere,
            Site::NTerminal => &mut self.n_terminal,
            Site::CTerminal => &mut self.c_terminal,
        };
        let i = match groups.binary_search_by(|g| g.residue.cmp(&modification.residue)) {
            Ok(i) => i,
            Err(i) => {
                groups.insert(i, ModificationGroup::new(modification.residue));
                i
            }
        };
        groups[i].deltas.push(modification.delta);
    }

    pub fn groups(&self, site: Site) -> &[ModificationGroup] {
        match site {
            Site::Anywhere => &self.anywhere,
            Site::NTerminal => &self.n_terminal,
            Site::CTerminal => &self.c_terminal,
        }
    }

    /// The residues that carry any modification, sorted and unique
    pub fn residues(&self) -> Vec<u8> {
        let mut residues: Vec<u8> = self
            .anywhere
            .iter()
            .chain(self.n_terminal.iter())
            .chain(self.c_terminal.iter())
            .map(|g| g.residue)
            .collect();
        residues.sort_unstable();
        residues.dedup();
        residues
    }

    pub fn iter(&self) -> impl Iterator<Item = Modification> + '_ {
        [Site::Anywhere, Site::NTerminal, Site::CTerminal]
            .into_iter()
            .flat_map(move |site| {
                self.groups(site).iter().flat_map(move |g| {
                    g.deltas
                        .iter()
                        .map(move |delta| Modification::new(site, g.residue, *delta))
                })
            })
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.anywhere.is_empty() && self.n_terminal.is_empty() && self.c_terminal.is_empty()
    }
}

impl FromIterator<Modification> for ModificationTable {
    fn from_iter<T: IntoIterator<Item = Modification>>(iter: T) -> Self {
        let mut table = Self::new();
        iter.into_iter().for_each(|m| table.add(m));
        table
    }
}
