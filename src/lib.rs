pub mod point;
pub mod mass;
pub mod modification;
pub mod config;
pub mod pst;
pub mod trie;
pub mod index;
pub mod builder;
pub mod search;
pub mod modified;
pub mod mutation;
pub mod protein;
pub mod fasta;
pub mod query;
pub mod r#match;
pub mod storage;

pub use crate::point::{Coord, Point};
pub use crate::mass::{MassDelta, MassType, ResidueTable};
pub use crate::modification::{Modification, ModificationTable, Site, SiteParsingError};
pub use crate::config::{Config, ConfigError};
pub use crate::pst::{MinMaxPST, PSTParsingError};
pub use crate::trie::{ProteinID, Trie, TrieError};
pub use crate::index::{BlockIndex, NodeRecord};
pub use crate::builder::IndexBuilder;
pub use crate::modified::ModState;
pub use crate::mutation::is_possible_mutation;
pub use crate::protein::{Peptide, Protein};
pub use crate::fasta::Fasta;
pub use crate::query::{read_queries, BlockPattern, BlockPatternParsingError, QueryLine};
pub use crate::r#match::{BlockMatcher, SearchMode};
pub use crate::storage::{read_block_index, write_block_index, IndexParsingError};
