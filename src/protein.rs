#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::trie::ProteinID;

/// The longest candidate substring indexed per start position by default
pub const DEFAULT_MAX_LENGTH: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Protein {
    pub id: ProteinID,
    pub name: String,
    pub sequence: String,
}

impl Protein {
    pub fn new(id: ProteinID, name: String, sequence: String) -> Self {
        Self { id, name, sequence }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Split the protein into the candidate substrings the index stores: one
    /// per start position, each at most `max_length` residues long.
    pub fn peptides(&self, max_length: usize) -> impl Iterator<Item = Peptide> + '_ {
        let max_length = max_length.max(1);
        let n = self.sequence.len();
        (0..n).map(move |start| {
            let end = (start + max_length).min(n);
            Peptide::new(self.id, start as u32, self.sequence[start..end].to_string())
        })
    }
}


#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peptide {
    pub protein_id: ProteinID,
    pub start_position: u32,
    pub sequence: String,
}

impl Peptide {
    pub fn new(protein_id: ProteinID, start_position: u32, sequence: String) -> Self {
        Self {
            protein_id,
            start_position,
            sequence,
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_short_protein_suffixes() {
        let protein = Protein::new(0, "short".to_string(), "MGAP".to_string());
        let seqs: Vec<String> = protein.peptides(30).map(|p| p.sequence).collect();
        assert_eq!(seqs, vec!["MGAP", "GAP", "AP", "P"]);
    }

    #[test]
    fn test_windows_then_tail() {
        let protein = Protein::new(3, "long".to_string(), "MGAPLLS".to_string());
        let peptides: Vec<Peptide> = protein.peptides(4).collect();
        let seqs: Vec<&str> = peptides.iter().map(|p| p.sequence.as_str()).collect();
        assert_eq!(seqs, vec!["MGAP", "GAPL", "APLL", "PLLS", "LLS", "LS", "S"]);
        assert_eq!(peptides[1].start_position, 1);
        assert!(peptides.iter().all(|p| p.protein_id == 3));
    }
}
