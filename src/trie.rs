use std::collections::{BTreeMap, HashMap};
use std::{error::Error, fmt::Display};

use crate::config::Config;
use crate::mass::MassType;
use crate::point::{Coord, Point};

pub type ProteinID = u32;

type NodeIndex = usize;

const ROOT: NodeIndex = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    UnknownResidue(char),
    Finalized,
}

impl Display for TrieError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match &self {
            Self::UnknownResidue(symbol) => format!("Residue '{}' has no known mass", symbol),
            Self::Finalized => "Cannot add sequences to a finalized trie".to_string(),
        };
        f.write_str(&text)
    }
}

impl Error for TrieError {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrieNode {
    symbol: u8,
    parent: NodeIndex,
    /// Arena slots, ordered by edge symbol
    children: Vec<NodeIndex>,
    proteins: Vec<ProteinID>,
    word_end: bool,
    preorder: Coord,
    postorder: Coord,
    parent_preorder: Coord,
    mass: MassType,
    /// Aligned with [`Trie::tracked_symbols`]
    last_occurrence: Vec<Option<Coord>>,
}

impl TrieNode {
    fn new(symbol: u8, parent: NodeIndex) -> Self {
        Self {
            symbol,
            parent,
            ..Default::default()
        }
    }

    pub fn symbol(&self) -> u8 {
        self.symbol
    }

    pub fn preorder(&self) -> Coord {
        self.preorder
    }

    pub fn postorder(&self) -> Coord {
        self.postorder
    }

    pub fn parent_preorder(&self) -> Coord {
        self.parent_preorder
    }

    pub fn mass(&self) -> MassType {
        self.mass
    }

    pub fn is_word_end(&self) -> bool {
        self.word_end
    }

    pub fn proteins(&self) -> &[ProteinID] {
        &self.proteins
    }

    pub fn point(&self) -> Point {
        Point::new(self.preorder, self.postorder)
    }

    pub fn last_occurrences(&self) -> &[Option<Coord>] {
        &self.last_occurrence
    }
}

/// A trie over database substrings, stored as an arena of nodes.
///
/// Sequences are added first, then [`Trie::finalize`] numbers the nodes
/// and computes their masses. Everything that reads node coordinates
/// finalizes first.
#[derive(Debug, Clone)]
pub struct Trie<'a> {
    config: &'a Config,
    nodes: Vec<TrieNode>,
    by_preorder: Vec<NodeIndex>,
    tracked_symbols: Vec<u8>,
    finalized: bool,
}

impl<'a> Trie<'a> {
    /// Last occurrences are tracked for every residue that carries a
    /// modification in `config`.
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            nodes: vec![TrieNode::default()],
            by_preorder: Vec::new(),
            tracked_symbols: config.modifications.residues(),
            finalized: false,
        }
    }

    pub fn add(&mut self, sequence: &str, protein: ProteinID) -> Result<(), TrieError> {
        if self.finalized {
            return Err(TrieError::Finalized);
        }
        if let Some(c) = sequence.bytes().find(|c| !self.config.residues.contains(*c)) {
            return Err(TrieError::UnknownResidue(c as char));
        }

        let mut current = ROOT;
        for symbol in sequence.bytes() {
            current = match self.nodes[current]
                .children
                .binary_search_by(|c| self.nodes[*c].symbol.cmp(&symbol))
            {
                Ok(i) => self.nodes[current].children[i],
                Err(i) => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::new(symbol, current));
                    self.nodes[current].children.insert(i, child);
                    child
                }
            };
        }
        let node = &mut self.nodes[current];
        node.word_end = true;
        if !node.proteins.contains(&protein) {
            node.proteins.push(protein);
        }
        Ok(())
    }

    fn child(&self, node: NodeIndex, symbol: u8) -> Option<NodeIndex> {
        let children = &self.nodes[node].children;
        children
            .binary_search_by(|c| self.nodes[*c].symbol.cmp(&symbol))
            .ok()
            .map(|i| children[i])
    }

    fn walk(&self, sequence: &[u8]) -> Option<NodeIndex> {
        sequence
            .iter()
            .try_fold(ROOT, |node, symbol| self.child(node, *symbol))
    }

    /// Whether `sequence` was added to the trie
    pub fn find(&self, sequence: &str) -> bool {
        self.walk(sequence.as_bytes())
            .is_some_and(|node| self.nodes[node].word_end)
    }

    pub fn proteins(&self, sequence: &str) -> &[ProteinID] {
        match self.walk(sequence.as_bytes()) {
            Some(node) => &self.nodes[node].proteins,
            None => &[],
        }
    }

    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.number();
        self.accumulate_masses();
        self.propagate_last_occurrences();
        self.finalized = true;
        log::debug!(
            "Finalized trie with {} nodes tracking {} symbols",
            self.nodes.len(),
            self.tracked_symbols.len()
        );
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn number(&mut self) {
        self.by_preorder = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(current) = stack.pop() {
            let preorder = self.by_preorder.len();
            self.nodes[current].preorder = preorder;
            self.by_preorder.push(current);
            for i in (0..self.nodes[current].children.len()).rev() {
                let child = self.nodes[current].children[i];
                self.nodes[child].parent_preorder = preorder;
                stack.push(child);
            }
        }

        let mut pending = vec![ROOT];
        let mut completed = Vec::with_capacity(self.nodes.len());
        while let Some(current) = pending.pop() {
            completed.push(current);
            pending.extend(self.nodes[current].children.iter().copied());
        }
        for (postorder, node) in completed.into_iter().rev().enumerate() {
            self.nodes[node].postorder = postorder;
        }
    }

    // Children are always allocated after their parent, so arena order
    // visits parents first.
    fn accumulate_masses(&mut self) {
        for i in 1..self.nodes.len() {
            let node = &self.nodes[i];
            let mass = self.nodes[node.parent].mass
                + self.config.residues.get(node.symbol).unwrap_or_default();
            self.nodes[i].mass = mass;
        }
    }

    fn propagate_last_occurrences(&mut self) {
        if self.tracked_symbols.is_empty() {
            return;
        }
        self.nodes[ROOT].last_occurrence = vec![None; self.tracked_symbols.len()];
        for i in 1..self.nodes.len() {
            let mut occurrences = self.nodes[self.nodes[i].parent].last_occurrence.clone();
            if let Ok(k) = self.tracked_symbols.binary_search(&self.nodes[i].symbol) {
                occurrences[k] = Some(self.nodes[i].preorder);
            }
            self.nodes[i].last_occurrence = occurrences;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && !self.nodes[ROOT].word_end
    }

    /// The residues whose last occurrences every node records, sorted
    pub fn tracked_symbols(&self) -> &[u8] {
        &self.tracked_symbols
    }

    /// The node numbered `preorder`, once the trie is finalized
    pub fn node(&self, preorder: Coord) -> Option<&TrieNode> {
        self.by_preorder.get(preorder).map(|i| &self.nodes[*i])
    }

    pub fn nodes_in_preorder(&mut self) -> impl Iterator<Item = &TrieNode> + '_ {
        self.finalize();
        self.by_preorder.iter().map(|i| &self.nodes[*i])
    }

    /// The path label from the root to the node numbered `preorder`
    pub fn sequence_of(&self, preorder: Coord) -> Option<String> {
        let mut current = *self.by_preorder.get(preorder)?;
        let mut symbols = Vec::new();
        while current != ROOT {
            symbols.push(self.nodes[current].symbol);
            current = self.nodes[current].parent;
        }
        symbols.reverse();
        String::from_utf8(symbols).ok()
    }

    /// Every node's point grouped by cumulative mass, the root included
    pub fn nodes_by_mass(&mut self) -> BTreeMap<MassType, Vec<Point>> {
        self.finalize();
        let mut groups: BTreeMap<MassType, Vec<Point>> = BTreeMap::new();
        for node in self.nodes.iter() {
            groups.entry(node.mass).or_default().push(node.point());
        }
        groups
    }

    /// The points of all word end nodes, in preorder
    pub fn leaves(&mut self) -> Vec<Point> {
        self.finalize();
        self.by_preorder
            .iter()
            .map(|i| &self.nodes[*i])
            .filter(|n| n.word_end)
            .map(|n| n.point())
            .collect()
    }

    /// For every node `v` and every proper suffix of its path label that is
    /// itself spelled by a node `s`, link `s` to the ancestor `a` of `v` with
    /// `path(a) + path(s) == path(v)`. Keyed and valued by preorder.
    pub fn compute_links(&mut self) -> HashMap<Coord, Vec<Coord>> {
        self.finalize();
        let mut links: HashMap<Coord, Vec<Coord>> = HashMap::new();
        let mut path: Vec<NodeIndex> = Vec::new();
        let mut label: Vec<u8> = Vec::new();

        for &node in self.by_preorder.iter() {
            if node == ROOT {
                path.push(ROOT);
                continue;
            }
            let parent = self.nodes[node].parent;
            while path.last() != Some(&parent) {
                path.pop();
                label.pop();
            }
            path.push(node);
            label.push(self.nodes[node].symbol);

            let depth = label.len();
            for j in 1..depth {
                if let Some(partner) = self.walk(&label[depth - j..]) {
                    links
                        .entry(self.nodes[partner].preorder)
                        .or_default()
                        .push(self.nodes[path[depth - j]].preorder);
                }
            }
        }
        log::debug!("Computed links for {} nodes", links.len());
        links
    }
}


#[cfg(test)]
mod test {
    use super::*;

    use crate::mass::ResidueTable;
    use crate::modification::{Modification, Site};

    fn build<'a>(config: &'a Config, words: &[&str]) -> Trie<'a> {
        let mut trie = Trie::new(config);
        for (i, w) in words.iter().enumerate() {
            trie.add(w, i as ProteinID).unwrap();
        }
        trie.finalize();
        trie
    }

    fn tracking_config() -> Config {
        Config::new(
            ResidueTable::default(),
            [
                Modification::new(Site::Anywhere, b'A', 100),
                Modification::new(Site::Anywhere, b'C', 200),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn collect_subtree(trie: &Trie, node: NodeIndex, acc: &mut Vec<NodeIndex>) {
        acc.push(node);
        for child in trie.nodes[node].children.iter() {
            collect_subtree(trie, *child, acc);
        }
    }

    #[test]
    fn test_numbering() {
        let config = Config::default();
        let trie = build(&config, &["AAA", "AG", "AAG", "GA", "GAG", "GG"]);
        assert_eq!(trie.len(), 10);

        let node = trie.node(2).unwrap();
        assert_eq!((node.postorder(), node.parent_preorder()), (2, 1));
        let node = trie.node(3).unwrap();
        assert_eq!((node.postorder(), node.parent_preorder()), (0, 2));
        assert_eq!(trie.node(0).unwrap().postorder(), 9);
        let node = trie.node(7).unwrap();
        assert_eq!((node.postorder(), node.parent_preorder()), (6, 6));
        let node = trie.node(9).unwrap();
        assert_eq!((node.postorder(), node.parent_preorder()), (7, 6));
        assert_eq!(trie.sequence_of(7).unwrap(), "GA");
        assert_eq!(trie.sequence_of(0).unwrap(), "");
    }

    #[test]
    fn test_nodes_by_mass() {
        let config = Config::default();
        let mut trie = build(&config, &["AAA", "AG", "AAG", "GA", "GAG", "GG"]);
        let groups = trie.nodes_by_mass();
        assert_eq!(groups[&0], vec![Point::new(0, 9)]);
        assert_eq!(groups[&5702].len(), 1);
        assert_eq!(groups[&7104].len(), 1);
        assert_eq!(groups[&12806].len(), 2);
        assert_eq!(groups[&18508].len(), 1);
        assert!(!groups.contains_key(&5703));
    }

    #[test]
    fn test_find_and_leaves() {
        let config = Config::default();
        let mut trie = build(&config, &["AAA", "AG", "AAG", "GA", "GAG", "GG"]);
        assert!(trie.find("AAA"));
        assert!(trie.find("GA"));
        assert!(!trie.find("AA"));
        assert!(!trie.find("GAGA"));
        assert_eq!(trie.proteins("GAG"), &[4]);
        assert!(trie.proteins("AA").is_empty());

        let leaves: Vec<Coord> = trie.leaves().iter().map(|p| p.x).collect();
        assert_eq!(leaves, vec![3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn test_subtree_contiguity() {
        let config = Config::default();
        let trie = build(
            &config,
            &["MGAPLL", "GAPLLS", "APLLSP", "PLLSPG", "LLSPGW", "LSPGWG", "SPGW", "PGW", "GW", "W"],
        );
        for node in 0..trie.len() {
            let mut members = Vec::new();
            collect_subtree(&trie, node, &mut members);
            let mut pre: Vec<Coord> = members.iter().map(|i| trie.nodes[*i].preorder).collect();
            let mut post: Vec<Coord> = members.iter().map(|i| trie.nodes[*i].postorder).collect();
            pre.sort();
            post.sort();
            assert!(pre.windows(2).all(|w| w[1] == w[0] + 1));
            assert!(post.windows(2).all(|w| w[1] == w[0] + 1));
            assert_eq!(pre[0], trie.nodes[node].preorder);
            assert_eq!(*post.last().unwrap(), trie.nodes[node].postorder);
        }
    }

    #[test]
    fn test_last_occurrence() {
        let config = tracking_config();
        let trie = build(&config, &["AAA", "AAC", "ACC", "CCA", "CCC"]);
        assert_eq!(trie.tracked_symbols(), &[b'A', b'C']);

        let expected_a = [0, 1, 2, 3, 2, 1, 1, 0, 0, 9, 0];
        let expected_c = [0, 0, 0, 0, 4, 5, 6, 7, 8, 8, 10];
        for preorder in 0..trie.len() {
            let occ = trie.node(preorder).unwrap().last_occurrences();
            assert_eq!(occ[0].unwrap_or(0), expected_a[preorder], "A at node {preorder}");
            assert_eq!(occ[1].unwrap_or(0), expected_c[preorder], "C at node {preorder}");
        }
        assert_eq!(trie.node(0).unwrap().last_occurrences(), &[None, None]);
    }

    #[test]
    fn test_no_tracking_without_modifications() {
        let config = Config::default();
        let trie = build(&config, &["AAA"]);
        assert!(trie.tracked_symbols().is_empty());
        assert!(trie.node(3).unwrap().last_occurrences().is_empty());
    }

    #[test]
    fn test_links() {
        let config = Config::default();
        let mut trie = build(&config, &["AAA", "AAC", "ACC", "CCA", "CCC"]);
        let links = trie.compute_links();
        assert_eq!(links[&1], vec![1, 2, 8]);
        assert_eq!(links[&2], vec![1]);
        assert_eq!(links[&5], vec![1]);
        assert_eq!(links[&7], vec![2, 1, 5, 7, 8]);
        assert_eq!(links[&8], vec![1, 7]);
        for absent in [3, 4, 6, 9, 10] {
            assert!(!links.contains_key(&absent));
        }
    }

    #[test]
    fn test_finalize_idempotent() {
        let config = tracking_config();
        let mut trie = build(&config, &["AAA", "AAC", "ACC", "CCA", "CCC"]);
        let before: Vec<TrieNode> = trie.nodes_in_preorder().cloned().collect();
        trie.finalize();
        trie.finalize();
        let after: Vec<TrieNode> = trie.nodes_in_preorder().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_add_errors() {
        let config = Config::default();
        let mut trie = Trie::new(&config);
        assert_eq!(trie.add("AJA", 0), Err(TrieError::UnknownResidue('J')));
        assert_eq!(trie.len(), 1);
        trie.add("AXA", 0).unwrap();
        trie.finalize();
        assert_eq!(trie.add("GG", 1), Err(TrieError::Finalized));
        assert_eq!(trie.node(2).unwrap().mass(), 7104);
    }
}
