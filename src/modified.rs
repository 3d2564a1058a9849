use std::collections::HashSet;

use crate::index::BlockIndex;
use crate::mass::{MassDelta, MassType};
use crate::modification::{ModificationGroup, ModificationTable, Site};
use crate::point::{Coord, Point};
use crate::search::{cumulative_masses, first_child, next_sibling};

/// For each modification group of each site class, zero for "unmodified"
/// or `i` for the group's `i-1`th delta.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModCounters {
    pub anywhere: Vec<usize>,
    pub n_terminal: Vec<usize>,
    pub c_terminal: Vec<usize>,
}

impl ModCounters {
    fn zeroed(table: &ModificationTable) -> Self {
        Self {
            anywhere: vec![0; table.anywhere.len()],
            n_terminal: vec![0; table.n_terminal.len()],
            c_terminal: vec![0; table.c_terminal.len()],
        }
    }

    fn counters(&self, site: Site) -> &[usize] {
        match site {
            Site::Anywhere => &self.anywhere,
            Site::NTerminal => &self.n_terminal,
            Site::CTerminal => &self.c_terminal,
        }
    }

    /// The `(site, residue, delta)` of every selected modification
    pub fn active<'t>(
        &'t self,
        table: &'t ModificationTable,
    ) -> impl Iterator<Item = (Site, u8, MassDelta)> + 't {
        [Site::Anywhere, Site::NTerminal, Site::CTerminal]
            .into_iter()
            .flat_map(move |site| {
                table
                    .groups(site)
                    .iter()
                    .zip(self.counters(site))
                    .filter(|(_, c)| **c > 0)
                    .map(move |(g, c)| (site, g.residue, g.deltas[c - 1]))
            })
    }

    /// The total mass the selected modifications add
    pub fn delta(&self, table: &ModificationTable) -> MassDelta {
        self.active(table).map(|(_, _, d)| d).sum()
    }
}

/// Step one odometer digit group, rightmost counter least significant.
/// Returns false when every counter wrapped back to zero.
fn bump(counters: &mut [usize], groups: &[ModificationGroup]) -> bool {
    for (counter, group) in counters.iter_mut().zip(groups).rev() {
        if *counter == group.len() {
            *counter = 0;
        } else {
            *counter += 1;
            return true;
        }
    }
    false
}

/// Which combination of modifications a search level is currently trying
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModState {
    Active(ModCounters),
    Exhausted,
}

impl ModState {
    /// The unmodified combination, always tried first
    pub fn first(table: &ModificationTable) -> Self {
        Self::Active(ModCounters::zeroed(table))
    }

    /// Move to the next combination. N-terminal counters only turn for the
    /// first block and C-terminal counters only for the last.
    pub fn advance(&mut self, table: &ModificationTable, first_block: bool, last_block: bool) {
        let Self::Active(counters) = self else {
            return;
        };
        let moved = (first_block && bump(&mut counters.n_terminal, &table.n_terminal))
            || (last_block && bump(&mut counters.c_terminal, &table.c_terminal))
            || bump(&mut counters.anywhere, &table.anywhere);
        if !moved {
            *self = Self::Exhausted;
        }
    }

    pub fn delta(&self, table: &ModificationTable) -> MassDelta {
        match self {
            Self::Active(counters) => counters.delta(table),
            Self::Exhausted => 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// One level of the modification tolerant search path: the node reached, the
/// modification combination being tried for the block below it, and the last
/// child returned for that combination.
#[derive(Debug, Clone)]
struct Frame {
    node: Point,
    mods: ModState,
    cursor: Option<Point>,
}

impl Frame {
    fn new(node: Point, table: &ModificationTable) -> Self {
        Self {
            node,
            mods: ModState::first(table),
            cursor: None,
        }
    }
}

impl BlockIndex {
    /// Like [`BlockIndex::find_exact`], but each block may carry the mass of
    /// configured modifications on residues that occur inside it.
    pub fn find_mod_tolerant(&self, blocks: &[MassType], table: &ModificationTable) -> Vec<Coord> {
        if table.is_empty() {
            return self.find_exact(blocks);
        }
        let mut hits = Vec::new();
        if blocks.is_empty() {
            return hits;
        }
        let masses = cumulative_masses(blocks);
        let mut seen = HashSet::new();
        let mut stack = vec![Frame::new(Point::VIRTUAL_ROOT, table)];

        while !stack.is_empty() {
            if stack.len() == masses.len() + 1 {
                if let Some(frame) = stack.pop() {
                    if seen.insert(frame.node.x) {
                        hits.push(frame.node.x);
                    }
                }
                continue;
            }
            match self.next_modified_child(&mut stack, &masses, table) {
                Some(child) => stack.push(Frame::new(child, table)),
                None => {
                    stack.pop();
                }
            }
        }
        hits
    }

    /// Find the next acceptable child of the top frame, moving through
    /// modification combinations until one yields a child or none remain.
    fn next_modified_child(
        &self,
        stack: &mut [Frame],
        masses: &[MassType],
        table: &ModificationTable,
    ) -> Option<Point> {
        let block = stack.len() - 1;
        let first_block = block == 0;
        let last_block = block + 1 == masses.len();
        let offset: MassDelta = stack[..block].iter().map(|f| f.mods.delta(table)).sum();
        let frame = &mut stack[block];

        loop {
            let ModState::Active(counters) = &frame.mods else {
                return None;
            };
            let target = masses[block] as MassDelta - offset - counters.delta(table);
            let pst = if target > 0 {
                self.pst_for(target as MassType)
            } else {
                None
            };
            if let Some(pst) = pst {
                let mut candidate = match frame.cursor {
                    None => first_child(pst, frame.node),
                    Some(previous) => next_sibling(pst, previous, frame.node),
                };
                while let Some(child) = candidate {
                    if self.is_valid_site(child, frame.node, counters, table) {
                        frame.cursor = Some(child);
                        return Some(child);
                    }
                    candidate = next_sibling(pst, child, frame.node);
                }
            }
            frame.mods.advance(table, first_block, last_block);
            frame.cursor = None;
        }
    }

    /// Every selected modification needs its residue on the path strictly
    /// below `parent`, and an N-terminal one must sit on the first residue.
    fn is_valid_site(
        &self,
        node: Point,
        parent: Point,
        counters: &ModCounters,
        table: &ModificationTable,
    ) -> bool {
        counters.active(table).all(|(site, residue, _)| {
            match self.last_occurrence(node.x, residue) {
                Some(occurrence) if occurrence > parent.x => {
                    site != Site::NTerminal || self.parent_of(occurrence) == 0
                }
                _ => false,
            }
        })
    }
}


#[cfg(test)]
mod test {
    use super::*;

    use crate::modification::Modification;

    fn table() -> ModificationTable {
        [
            Modification::new(Site::Anywhere, b'M', 1600),
            Modification::new(Site::Anywhere, b'S', 7997),
            Modification::new(Site::Anywhere, b'S', 4200),
            Modification::new(Site::NTerminal, b'M', 4321),
            Modification::new(Site::CTerminal, b'K', 1234),
        ]
        .into_iter()
        .collect()
    }

    fn count_states(table: &ModificationTable, first: bool, last: bool) -> usize {
        let mut state = ModState::first(table);
        let mut n = 0;
        while !state.is_exhausted() {
            n += 1;
            state.advance(table, first, last);
        }
        n
    }

    #[test]
    fn test_odometer_counts() {
        let table = table();
        // M: none or one delta, S: none or one of two
        assert_eq!(count_states(&table, false, false), 2 * 3);
        assert_eq!(count_states(&table, true, false), 2 * 3 * 2);
        assert_eq!(count_states(&table, false, true), 2 * 3 * 2);
        assert_eq!(count_states(&table, true, true), 2 * 3 * 2 * 2);
        assert_eq!(count_states(&ModificationTable::new(), true, true), 1);
    }

    #[test]
    fn test_odometer_order() {
        let table = table();
        let mut state = ModState::first(&table);
        assert_eq!(state.delta(&table), 0);
        state.advance(&table, false, false);
        assert_eq!(state.delta(&table), 7997);
        state.advance(&table, false, false);
        assert_eq!(state.delta(&table), 4200);
        state.advance(&table, false, false);
        assert_eq!(state.delta(&table), 1600);
        state.advance(&table, false, false);
        assert_eq!(state.delta(&table), 1600 + 7997);

        let mut state = ModState::first(&table);
        state.advance(&table, true, false);
        let ModState::Active(counters) = &state else {
            panic!("state should still be active")
        };
        assert_eq!(counters.n_terminal, vec![1]);
        let active: Vec<(Site, u8, MassDelta)> = counters.active(&table).collect();
        assert_eq!(active, vec![(Site::NTerminal, b'M', 4321)]);
    }
}
