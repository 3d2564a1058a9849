use std::{error::Error, fmt::Display, str::FromStr};

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::index::BlockIndex;
use crate::mass::MassType;
use crate::query::BlockPattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchMode {
    Exact,
    ModificationTolerant,
    MutationTolerant,
}

impl Default for SearchMode {
    fn default() -> Self {
        Self::Exact
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SearchModeParsingError(String);

impl Display for SearchModeParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown search mode \"{}\"", self.0)
    }
}

impl Error for SearchModeParsingError {}

impl FromStr for SearchMode {
    type Err = SearchModeParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "mod" | "modification" | "modifications" => Ok(Self::ModificationTolerant),
            "mut" | "mutation" | "mutations" => Ok(Self::MutationTolerant),
            _ => Err(SearchModeParsingError(s.to_string())),
        }
    }
}

/// Runs block patterns against an index in one [`SearchMode`] and reports
/// the matched sequences.
#[derive(Debug, Clone, Copy)]
pub struct BlockMatcher<'a> {
    pub index: &'a BlockIndex,
    pub config: &'a Config,
    pub mode: SearchMode,
}

impl<'a> BlockMatcher<'a> {
    pub fn new(index: &'a BlockIndex, config: &'a Config, mode: SearchMode) -> Self {
        Self { index, config, mode }
    }

    pub fn search(&self, blocks: &[MassType]) -> Vec<String> {
        match self.mode {
            SearchMode::Exact => self
                .index
                .find_exact(blocks)
                .into_iter()
                .map(|node| self.index.sequence_of(node))
                .collect(),
            SearchMode::ModificationTolerant => self
                .index
                .find_mod_tolerant(blocks, &self.config.modifications)
                .into_iter()
                .map(|node| self.index.sequence_of(node))
                .collect(),
            SearchMode::MutationTolerant => {
                self.index.find_mut_tolerant(blocks, &self.config.residues)
            }
        }
    }

    pub fn search_all(&self, patterns: &[BlockPattern]) -> Vec<Vec<String>> {
        patterns.iter().map(|p| self.search(p)).collect()
    }

    #[cfg(feature = "parallelism")]
    pub fn par_search_all(&self, patterns: &[BlockPattern]) -> Vec<Vec<String>> {
        patterns.par_iter().map(|p| self.search(p)).collect()
    }
}


#[cfg(test)]
mod test {
    use super::*;

    use crate::builder::IndexBuilder;
    use crate::protein::Protein;

    #[test]
    fn test_parse_mode() {
        assert_eq!("exact".parse::<SearchMode>().unwrap(), SearchMode::Exact);
        assert_eq!("Mod".parse::<SearchMode>().unwrap(), SearchMode::ModificationTolerant);
        assert_eq!("mutation".parse::<SearchMode>().unwrap(), SearchMode::MutationTolerant);
        assert!("fuzzy".parse::<SearchMode>().is_err());
    }

    #[test]
    fn test_search_modes() {
        let config = Config::default();
        let mut builder = IndexBuilder::new(&config);
        let protein = Protein::new(0, "p".to_string(), "PLLSPGWGAGAAGR".to_string());
        builder.add_protein(&protein).unwrap();
        let index = builder.build();

        let exact = BlockMatcher::new(&index, &config, SearchMode::Exact);
        assert_eq!(exact.search(&[32321, 48420]), vec!["PLLSPGWG".to_string()]);
        assert!(exact.search(&[32321, 48420 - 18608]).is_empty());

        // Without modifications the tolerant mode is the exact mode
        let modified = BlockMatcher::new(&index, &config, SearchMode::ModificationTolerant);
        assert_eq!(modified.search(&[32321, 48420]), exact.search(&[32321, 48420]));

        let patterns = vec![
            BlockPattern::new(vec![32321, 48420, 19910, 28416]),
            BlockPattern::new(vec![32321, 48420 - 18608, 19910, 28416]),
        ];
        let mutated = BlockMatcher::new(&index, &config, SearchMode::MutationTolerant);
        let results = mutated.search_all(&patterns);
        assert_eq!(results[1], vec!["PLLSPGWGAGAAGR".to_string()]);
        #[cfg(feature = "parallelism")]
        assert_eq!(mutated.par_search_all(&patterns), results);
    }
}
