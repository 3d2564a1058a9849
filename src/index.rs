use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mass::MassType;
use crate::point::{Coord, Point};
use crate::pst::MinMaxPST;

/// The flattened attributes of one trie node, stored by preorder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeRecord {
    pub postorder: Coord,
    pub parent_preorder: Coord,
}

impl NodeRecord {
    pub fn new(postorder: Coord, parent_preorder: Coord) -> Self {
        Self {
            postorder,
            parent_preorder,
        }
    }
}

/// A searchable block-mass index.
///
/// There is no trie here: trie nodes are `(preorder, postorder)` points,
/// grouped into one [`MinMaxPST`] per cumulative mass, with the flat node
/// table supplying parent links for reconstructing matched sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockIndex {
    pub(crate) psts: HashMap<MassType, MinMaxPST>,
    pub(crate) leaves: MinMaxPST,
    pub(crate) nodes: Vec<NodeRecord>,
    /// Full path labels of word end nodes
    pub(crate) sequences: HashMap<Coord, String>,
    pub(crate) tracked_symbols: Vec<u8>,
    /// Row-major, one row of `tracked_symbols.len()` per node. Zero means none.
    pub(crate) last_occurrence: Vec<Coord>,
    pub(crate) links: HashMap<Coord, Vec<Coord>>,
}

impl BlockIndex {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_masses(&self) -> usize {
        self.psts.len()
    }

    pub fn pst_for(&self, mass: MassType) -> Option<&MinMaxPST> {
        self.psts.get(&mass)
    }

    pub fn masses(&self) -> impl Iterator<Item = &MassType> {
        self.psts.keys()
    }

    pub fn leaves(&self) -> &MinMaxPST {
        &self.leaves
    }

    pub fn node(&self, preorder: Coord) -> Option<&NodeRecord> {
        self.nodes.get(preorder)
    }

    pub fn point(&self, preorder: Coord) -> Point {
        Point::new(preorder, self.nodes[preorder].postorder)
    }

    pub fn root(&self) -> Point {
        self.point(0)
    }

    pub fn parent_of(&self, preorder: Coord) -> Coord {
        self.nodes[preorder].parent_preorder
    }

    /// The number of edges between the node numbered `preorder` and the root
    pub fn depth_of(&self, preorder: Coord) -> usize {
        let mut depth = 0;
        let mut current = preorder;
        while current != 0 {
            current = self.parent_of(current);
            depth += 1;
        }
        depth
    }

    pub fn leaf_sequence(&self, preorder: Coord) -> Option<&str> {
        self.sequences.get(&preorder).map(|s| s.as_str())
    }

    pub fn tracked_symbols(&self) -> &[u8] {
        &self.tracked_symbols
    }

    /// The preorder of the nearest ancestor-or-self of `preorder` reached by
    /// a `symbol` edge.
    pub fn last_occurrence(&self, preorder: Coord, symbol: u8) -> Option<Coord> {
        let k = self.tracked_symbols.binary_search(&symbol).ok()?;
        let stride = self.tracked_symbols.len();
        match self.last_occurrence.get(preorder * stride + k) {
            Some(0) | None => None,
            Some(p) => Some(*p),
        }
    }

    pub(crate) fn last_occurrence_row(&self, preorder: Coord) -> &[Coord] {
        let stride = self.tracked_symbols.len();
        &self.last_occurrence[preorder * stride..(preorder + 1) * stride]
    }

    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn links_of(&self, preorder: Coord) -> &[Coord] {
        match self.links.get(&preorder) {
            Some(targets) => targets,
            None => &[],
        }
    }
}
