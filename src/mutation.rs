use std::collections::HashSet;

use crate::index::BlockIndex;
use crate::mass::{MassType, ResidueTable};
use crate::point::{Coord, Point};

/// Whether one inserted, deleted or substituted residue turns `segment`
/// into something weighing exactly `mass`.
pub fn is_possible_mutation(segment: &str, mass: MassType, residues: &ResidueTable) -> bool {
    let Some(segment_mass) = residues.mass_of(segment) else {
        return false;
    };
    if segment_mass == mass {
        return false;
    }
    let mass_of = |c: u8| residues.get(c).unwrap_or_default();

    if segment_mass < mass {
        let missing = mass - segment_mass;
        if residues.is_residue_mass(missing) {
            return true;
        }
    } else {
        let extra = segment_mass - mass;
        if segment.bytes().any(|c| mass_of(c) == extra) {
            return true;
        }
    }

    if !residues.is_mass_difference(segment_mass.abs_diff(mass)) {
        return false;
    }
    segment.bytes().any(|original| {
        let without = segment_mass - mass_of(original);
        residues
            .residues()
            .any(|(_, replacement)| replacement > 0 && without + replacement == mass)
    })
}

/// Collects mutation tolerant matches in first-seen order
struct MutationHits<'a> {
    index: &'a BlockIndex,
    residues: &'a ResidueTable,
    seen: HashSet<String>,
    hits: Vec<String>,
}

impl<'a> MutationHits<'a> {
    fn new(index: &'a BlockIndex, residues: &'a ResidueTable) -> Self {
        Self {
            index,
            residues,
            seen: HashSet::new(),
            hits: Vec::new(),
        }
    }

    fn push(&mut self, sequence: String) {
        if self.seen.insert(sequence.clone()) {
            self.hits.push(sequence);
        }
    }

    /// Splice the exact prefix match `prefix` to the exact suffix match
    /// `suffix` through every linked node whose extra segment could be the
    /// mutated block.
    fn combine(&mut self, prefix: Point, suffix: Coord, mass: MassType) {
        let index = self.index;
        let targets = index.links_of(suffix);
        if targets.is_empty() {
            return;
        }
        let prefix_depth = index.depth_of(prefix.x);
        let mut suffix_sequence: Option<String> = None;

        for &target in targets {
            if !prefix.encloses(&index.point(target)) {
                continue;
            }
            let joined = index.sequence_of(target);
            let segment = &joined[prefix_depth..];
            if is_possible_mutation(segment, mass, self.residues) {
                let suffix_sequence =
                    suffix_sequence.get_or_insert_with(|| index.sequence_of(suffix));
                let mut spliced = joined;
                spliced.push_str(suffix_sequence);
                self.push(spliced);
            }
        }
    }

    /// Extend the exact prefix match `prefix` along every leaf below it by
    /// any number of residues that could be the mutated final block.
    fn extend_to_leaves(&mut self, prefix: Point, mass: MassType) {
        let index = self.index;
        let prefix_depth = index.depth_of(prefix.x);
        let limit = mass + self.residues.max_mass();

        let mut cursor = index.leaves().leftmost_se(prefix);
        while let Some(leaf) = cursor {
            if let Some(sequence) = index.leaf_sequence(leaf.x) {
                let mut segment_mass: MassType = 0;
                for end in (prefix_depth + 1)..=sequence.len() {
                    segment_mass += self
                        .residues
                        .get(sequence.as_bytes()[end - 1])
                        .unwrap_or_default();
                    if segment_mass > limit {
                        break;
                    }
                    if is_possible_mutation(&sequence[prefix_depth..end], mass, self.residues) {
                        self.push(sequence[..end].to_string());
                    }
                }
            }
            cursor = index
                .leaves()
                .leftmost_se(Point::new(leaf.x + 1, prefix.y));
        }
    }
}

impl BlockIndex {
    /// Sequences matching `blocks` with one substitution, insertion or
    /// deletion inside exactly one block.
    pub fn find_mut_tolerant(&self, blocks: &[MassType], residues: &ResidueTable) -> Vec<String> {
        let k = blocks.len();
        let mut hits = MutationHits::new(self, residues);
        let root = self.root();

        for (i, &mass) in blocks.iter().enumerate() {
            let prefixes: Vec<Point> = if i == 0 {
                vec![root]
            } else {
                self.find_exact(&blocks[..i])
                    .into_iter()
                    .map(|p| self.point(p))
                    .collect()
            };
            if prefixes.is_empty() {
                continue;
            }

            if i + 1 == k {
                for prefix in prefixes {
                    hits.extend_to_leaves(prefix, mass);
                }
            } else if self.has_links() {
                let suffixes = self.find_exact(&blocks[i + 1..]);
                for prefix in prefixes.iter() {
                    for suffix in suffixes.iter() {
                        hits.combine(*prefix, *suffix, mass);
                    }
                }
            }
        }
        hits.hits
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_possible_mutation() {
        let residues = ResidueTable::default();
        // insertion of N
        assert!(is_possible_mutation("AGA", 19910 + 11404, &residues));
        // deletion of W
        assert!(is_possible_mutation("SPGWG", 48420 - 18608, &residues));
        // W to H
        assert!(is_possible_mutation("SPGWG", 48420 - 18608 + 13706, &residues));
        // exact match is not a mutation
        assert!(!is_possible_mutation("AGA", 19910, &residues));
        // deletion of a residue the segment does not contain
        assert!(!is_possible_mutation("AGA", 19910 - 11404, &residues));
        assert!(!is_possible_mutation("SPGWG", 48421, &residues));
        assert!(!is_possible_mutation("AJA", 19910, &residues));
    }
}
