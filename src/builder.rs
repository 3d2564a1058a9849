use std::collections::HashMap;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::config::Config;
use crate::fasta::Fasta;
use crate::index::{BlockIndex, NodeRecord};
use crate::mass::MassType;
use crate::protein::{Protein, DEFAULT_MAX_LENGTH};
use crate::pst::MinMaxPST;
use crate::trie::{ProteinID, Trie, TrieError};

/// Accumulates protein substrings into a trie and flattens it into a
/// [`BlockIndex`].
#[derive(Debug)]
pub struct IndexBuilder<'a> {
    config: &'a Config,
    trie: Trie<'a>,
    max_length: usize,
    with_links: bool,
    num_proteins: usize,
    num_peptides: usize,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            trie: Trie::new(config),
            max_length: DEFAULT_MAX_LENGTH,
            with_links: true,
            num_proteins: 0,
            num_peptides: 0,
        }
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Whether to compute the link table mutation tolerant search needs
    pub fn with_links(mut self, with_links: bool) -> Self {
        self.with_links = with_links;
        self
    }

    pub fn add_sequence(&mut self, sequence: &str, protein: ProteinID) -> Result<(), TrieError> {
        self.trie.add(sequence, protein)?;
        self.num_peptides += 1;
        Ok(())
    }

    /// Add every candidate substring of `protein`. Proteins with unknown
    /// residues are skipped and report zero substrings.
    pub fn add_protein(&mut self, protein: &Protein) -> Result<usize, TrieError> {
        if !self.config.residues.is_indexable(&protein.sequence) {
            log::warn!("Skipping protein {} with unknown residues", protein.name);
            return Ok(0);
        }
        let mut added = 0;
        for peptide in protein.peptides(self.max_length) {
            self.add_sequence(&peptide.sequence, peptide.protein_id)?;
            added += 1;
        }
        self.num_proteins += 1;
        Ok(added)
    }

    pub fn add_fasta(&mut self, fasta: &Fasta) -> Result<usize, TrieError> {
        let mut added = 0;
        for protein in fasta.iter() {
            added += self.add_protein(protein)?;
        }
        Ok(added)
    }

    pub fn num_proteins(&self) -> usize {
        self.num_proteins
    }

    pub fn num_peptides(&self) -> usize {
        self.num_peptides
    }

    pub fn build(mut self) -> BlockIndex {
        self.trie.finalize();
        log::debug!(
            "Building index over {} substrings of {} proteins, {} trie nodes",
            self.num_peptides,
            self.num_proteins,
            self.trie.len()
        );

        let groups = self.trie.nodes_by_mass();

        #[cfg(feature = "parallelism")]
        let psts: HashMap<MassType, MinMaxPST> = groups
            .into_par_iter()
            .map(|(mass, points)| (mass, MinMaxPST::build(points)))
            .collect();

        #[cfg(not(feature = "parallelism"))]
        let psts: HashMap<MassType, MinMaxPST> = groups
            .into_iter()
            .map(|(mass, points)| (mass, MinMaxPST::build(points)))
            .collect();

        let leaves = MinMaxPST::build(self.trie.leaves());
        log::debug!("Built {} mass search trees and {} leaves", psts.len(), leaves.len());

        let tracked_symbols = self.trie.tracked_symbols().to_vec();
        let mut nodes = Vec::with_capacity(self.trie.len());
        let mut last_occurrence = Vec::with_capacity(self.trie.len() * tracked_symbols.len());
        let mut sequences = HashMap::new();
        for node in self.trie.nodes_in_preorder() {
            nodes.push(NodeRecord::new(node.postorder(), node.parent_preorder()));
            last_occurrence.extend(node.last_occurrences().iter().map(|p| p.unwrap_or(0)));
            if node.is_word_end() {
                sequences.insert(node.preorder(), String::new());
            }
        }
        for (preorder, sequence) in sequences.iter_mut() {
            *sequence = self.trie.sequence_of(*preorder).unwrap_or_default();
        }

        let links = if self.with_links {
            self.trie.compute_links()
        } else {
            HashMap::new()
        };

        BlockIndex {
            psts,
            leaves,
            nodes,
            sequences,
            tracked_symbols,
            last_occurrence,
            links,
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    use crate::point::Point;

    #[test]
    fn test_build() {
        let config = Config::default();
        let mut builder = IndexBuilder::new(&config);
        for (i, word) in ["AAA", "AG", "AAG", "GA", "GAG", "GG"].iter().enumerate() {
            builder.add_sequence(word, i as ProteinID).unwrap();
        }
        let index = builder.build();

        assert_eq!(index.num_nodes(), 10);
        assert_eq!(index.num_masses(), 9);
        assert_eq!(index.pst_for(12806).unwrap().len(), 2);
        assert_eq!(index.pst_for(0).unwrap().points(), &[Point::new(0, 9)]);
        assert_eq!(index.leaves().len(), 6);
        assert_eq!(index.leaf_sequence(8), Some("GAG"));
        assert_eq!(index.leaf_sequence(2), None);
        assert_eq!(index.node(7), Some(&NodeRecord::new(6, 6)));
        assert!(index.tracked_symbols().is_empty());
        assert!(index.has_links());
    }

    #[test]
    fn test_add_protein() {
        let config = Config::default();
        let mut builder = IndexBuilder::new(&config).max_length(3).with_links(false);
        let protein = Protein::new(0, "p".to_string(), "MGAPL".to_string());
        assert_eq!(builder.add_protein(&protein).unwrap(), 5);
        let unknown = Protein::new(1, "q".to_string(), "MBX".to_string());
        assert_eq!(builder.add_protein(&unknown).unwrap(), 0);
        assert_eq!(builder.num_proteins(), 1);

        let index = builder.build();
        assert!(!index.has_links());
        let mut leaves: Vec<&str> = index.sequences.values().map(|s| s.as_str()).collect();
        leaves.sort();
        assert_eq!(leaves, vec!["APL", "GAP", "L", "MGA", "PL"]);
    }
}
