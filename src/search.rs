use crate::index::BlockIndex;
use crate::mass::MassType;
use crate::point::{Coord, Point};
use crate::pst::MinMaxPST;

/// Prefix sums of the block masses
pub(crate) fn cumulative_masses(blocks: &[MassType]) -> Vec<MassType> {
    blocks
        .iter()
        .scan(0, |acc, b| {
            *acc += b;
            Some(*acc)
        })
        .collect()
}

/// The leftmost node of `pst` strictly inside `parent`'s subtree
pub(crate) fn first_child(pst: &MinMaxPST, parent: Point) -> Option<Point> {
    pst.leftmost_se(parent).filter(|c| c.y < parent.y)
}

/// The next node of `pst` after `previous`'s subtree that is still inside
/// `parent`'s subtree
pub(crate) fn next_sibling(pst: &MinMaxPST, previous: Point, parent: Point) -> Option<Point> {
    pst.leftmost_ne(Point::new(previous.x, previous.y + 1))
        .filter(|c| c.y < parent.y)
}

impl BlockIndex {
    /// Preorders of every node whose root path passes through nodes at each
    /// cumulative block mass and ends at the last one.
    pub fn find_exact(&self, blocks: &[MassType]) -> Vec<Coord> {
        let mut hits = Vec::new();
        if blocks.is_empty() {
            return hits;
        }
        let Some(levels) = cumulative_masses(blocks)
            .into_iter()
            .map(|m| self.pst_for(m))
            .collect::<Option<Vec<&MinMaxPST>>>()
        else {
            return hits;
        };

        let k = levels.len();
        let mut path = vec![Point::VIRTUAL_ROOT];
        let mut descend = true;
        while let Some(top) = path.last().copied() {
            let depth = path.len();
            if depth == k + 1 {
                hits.push(top.x);
                descend = Self::advance_sibling(&mut path, levels[depth - 2]);
                continue;
            }
            if descend {
                if let Some(child) = first_child(levels[depth - 1], top) {
                    path.push(child);
                    continue;
                }
            }
            if depth == 1 {
                path.pop();
            } else {
                descend = Self::advance_sibling(&mut path, levels[depth - 2]);
            }
        }
        hits
    }

    /// Replace the top of `path` with its next sibling at the same mass.
    /// Returns false, leaving the top popped, when there is none.
    fn advance_sibling(path: &mut Vec<Point>, pst: &MinMaxPST) -> bool {
        let Some(previous) = path.pop() else {
            return false;
        };
        let Some(parent) = path.last().copied() else {
            return false;
        };
        match next_sibling(pst, previous, parent) {
            Some(sibling) => {
                path.push(sibling);
                true
            }
            None => false,
        }
    }

    /// Reconstruct the path label of the node numbered `preorder` from the
    /// first leaf of its subtree.
    pub fn sequence_of(&self, preorder: Coord) -> String {
        let node = self.point(preorder);
        let leaf = self
            .leaves
            .leftmost_se(node)
            .unwrap_or_else(|| panic!("Node {preorder} has no leaf in its subtree"));
        assert!(
            leaf.y <= node.y,
            "Leaf {leaf:?} is outside the subtree of {node:?}"
        );
        let mut sequence = self
            .leaf_sequence(leaf.x)
            .unwrap_or_else(|| panic!("Leaf {} has no stored sequence", leaf.x))
            .to_string();

        let mut current = leaf.x;
        while current != preorder {
            assert!(
                current > preorder,
                "Walked past node {preorder} while trimming leaf {}",
                leaf.x
            );
            current = self.parent_of(current);
            sequence.pop();
        }
        sequence
    }
}


#[cfg(test)]
mod test {
    use super::*;

    use crate::builder::IndexBuilder;
    use crate::config::Config;
    use crate::trie::ProteinID;

    fn six_word_index(config: &Config) -> BlockIndex {
        let mut builder = IndexBuilder::new(config);
        for (i, word) in ["AAA", "AG", "AAG", "GA", "GAG", "GG"].iter().enumerate() {
            builder.add_sequence(word, i as ProteinID).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_cumulative_masses() {
        assert_eq!(cumulative_masses(&[7104, 5702, 1]), vec![7104, 12806, 12807]);
        assert!(cumulative_masses(&[]).is_empty());
    }

    #[test]
    fn test_find_exact() {
        let config = Config::default();
        let index = six_word_index(&config);
        assert_eq!(index.find_exact(&[7104, 5702]), vec![5]);
        assert_eq!(index.find_exact(&[12806]), vec![5, 7]);
        assert_eq!(index.find_exact(&[5702, 7104]), vec![7]);
        assert_eq!(index.find_exact(&[7104, 7104, 7104]), vec![3]);
        assert_eq!(index.find_exact(&[7104]), vec![1]);
        assert!(index.find_exact(&[7104, 5703]).is_empty());
        assert!(index.find_exact(&[]).is_empty());
    }

    #[test]
    fn test_sequence_of() {
        let config = Config::default();
        let index = six_word_index(&config);
        let sequences: Vec<String> = (0..index.num_nodes()).map(|i| index.sequence_of(i)).collect();
        assert_eq!(
            sequences,
            vec!["", "A", "AA", "AAA", "AAG", "AG", "G", "GA", "GAG", "GG"]
        );
    }
}
