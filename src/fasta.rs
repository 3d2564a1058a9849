use std::{fs, io, path::Path};

use crate::protein::Protein;
use crate::trie::ProteinID;

/// The proteins of a FASTA file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fasta {
    pub proteins: Vec<Protein>,
}

impl Fasta {
    /// Parse FASTA text. Each `>` header starts a protein named by the rest of
    /// the header line, and the lines that follow are joined into its
    /// sequence. Blank lines are ignored.
    pub fn parse(contents: &str) -> Self {
        let mut proteins = Vec::new();
        let mut current: Option<Protein> = None;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('>') {
                if let Some(protein) = current.take() {
                    proteins.push(protein);
                }
                current = Some(Protein::new(
                    proteins.len() as ProteinID,
                    name.trim().to_string(),
                    String::new(),
                ));
            } else if let Some(protein) = current.as_mut() {
                protein.sequence.push_str(line);
            } else {
                log::warn!("Ignoring sequence data before the first FASTA header");
            }
        }
        if let Some(protein) = current.take() {
            proteins.push(protein);
        }
        log::debug!("Parsed {} proteins", proteins.len());
        Self { proteins }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    /// Total number of residues over all proteins
    pub fn num_residues(&self) -> usize {
        self.proteins.iter().map(|p| p.len()).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Protein> {
        self.proteins.iter()
    }
}
