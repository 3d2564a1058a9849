#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Masses are fixed point, in hundredths of a dalton
pub type MassType = u64;
pub type MassDelta = i64;

/// Unknown residue, stop and gap. They may appear in sequences but carry no mass.
pub const RESERVED_SYMBOLS: [u8; 3] = [b'X', b'*', b'-'];

const DEFAULT_MASSES: [(u8, MassType); 21] = [
    (b'G', 5702),
    (b'A', 7104),
    (b'S', 8703),
    (b'P', 9705),
    (b'V', 9907),
    (b'T', 10105),
    (b'C', 10301),
    (b'I', 11308),
    (b'L', 11308),
    (b'N', 11404),
    (b'D', 11503),
    (b'Q', 12806),
    (b'K', 12809),
    (b'E', 12904),
    (b'M', 13104),
    (b'H', 13706),
    (b'F', 14707),
    (b'U', 15004),
    (b'R', 15610),
    (b'Y', 16306),
    (b'W', 18608),
];

/// Maps residue symbols to their masses, along with the set of pairwise
/// mass differences used to recognize single residue substitutions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResidueTable {
    masses: Vec<Option<MassType>>,
    differences: Vec<MassType>,
    max_mass: MassType,
}

impl Default for ResidueTable {
    fn default() -> Self {
        let mut this = Self::empty();
        for (symbol, mass) in DEFAULT_MASSES {
            this.masses[symbol as usize] = Some(mass);
        }
        this.update_derived();
        this
    }
}

impl ResidueTable {
    /// A table that only knows the reserved, massless symbols
    pub fn empty() -> Self {
        let mut masses = vec![None; 256];
        for symbol in RESERVED_SYMBOLS {
            masses[symbol as usize] = Some(0);
        }
        Self {
            masses,
            differences: Vec::new(),
            max_mass: 0,
        }
    }

    pub fn insert(&mut self, symbol: u8, mass: MassType) {
        if RESERVED_SYMBOLS.contains(&symbol) {
            log::warn!("Ignoring mass {mass} for reserved symbol {}", symbol as char);
            return;
        }
        self.masses[symbol as usize] = Some(mass);
        self.update_derived();
    }

    fn update_derived(&mut self) {
        let masses: Vec<MassType> = self.residues().map(|(_, m)| m).filter(|m| *m > 0).collect();
        let mut differences = Vec::new();
        for a in masses.iter() {
            for b in masses.iter() {
                if a > b {
                    differences.push(a - b);
                }
            }
        }
        differences.sort_unstable();
        differences.dedup();
        self.differences = differences;
        self.max_mass = masses.into_iter().max().unwrap_or_default();
    }

    pub fn get(&self, symbol: u8) -> Option<MassType> {
        self.masses[symbol as usize]
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.get(symbol).is_some()
    }

    /// The summed mass of `sequence`, or `None` if it contains an unknown symbol
    pub fn mass_of(&self, sequence: &str) -> Option<MassType> {
        sequence.bytes().map(|c| self.get(c)).sum()
    }

    pub fn is_indexable(&self, sequence: &str) -> bool {
        sequence.bytes().all(|c| self.contains(c))
    }

    /// Every known symbol with its mass, in symbol order
    pub fn residues(&self) -> impl Iterator<Item = (u8, MassType)> + '_ {
        self.masses
            .iter()
            .enumerate()
            .filter_map(|(symbol, mass)| mass.map(|m| (symbol as u8, m)))
    }

    pub fn is_residue_mass(&self, mass: MassType) -> bool {
        mass > 0 && self.residues().any(|(_, m)| m == mass)
    }

    pub fn max_mass(&self) -> MassType {
        self.max_mass
    }

    pub fn mass_differences(&self) -> &[MassType] {
        &self.differences
    }

    pub fn is_mass_difference(&self, delta: MassType) -> bool {
        self.differences.binary_search(&delta).is_ok()
    }

    pub fn len(&self) -> usize {
        self.masses.iter().filter(|m| m.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = ResidueTable::default();
        assert_eq!(table.get(b'G'), Some(5702));
        assert_eq!(table.get(b'W'), Some(18608));
        assert_eq!(table.get(b'X'), Some(0));
        assert_eq!(table.get(b'B'), None);
        assert_eq!(table.len(), 24);
        assert_eq!(table.max_mass(), 18608);
        assert_eq!(table.mass_of("PLL"), Some(32321));
        assert_eq!(table.mass_of("PBL"), None);
    }

    #[test]
    fn test_mass_differences() {
        let table = ResidueTable::default();
        let diffs = table.mass_differences();
        assert!(diffs.windows(2).all(|w| w[0] < w[1]));
        // I and L share a mass, and reserved symbols never contribute
        assert!(!table.is_mass_difference(0));
        assert!(!table.is_mass_difference(1));
        assert!(!table.is_mass_difference(11404));
        assert!(table.is_mass_difference(7104 - 5702));
        assert!(table.is_mass_difference(18608 - 13706));
        assert!(table.is_residue_mass(11404));
        assert!(!table.is_residue_mass(0));
    }

    #[test]
    fn test_insert() {
        let mut table = ResidueTable::empty();
        table.insert(b'A', 100);
        table.insert(b'B', 250);
        table.insert(b'X', 999);
        assert_eq!(table.get(b'X'), Some(0));
        assert_eq!(table.mass_differences(), &[150]);
        assert_eq!(table.max_mass(), 250);
    }
}
