use std::fs;
use std::io::{self, prelude::*};
use std::path::Path;
use std::{error::Error, fmt::Display};

use itertools::Itertools;

use crate::index::{BlockIndex, NodeRecord};
use crate::mass::MassType;
use crate::point::{Coord, Point};
use crate::pst::MinMaxPST;

const LEAVES_TAG: &str = "LEAVES:";
const TRIE_TAG: &str = "TRIE:";
const LAST_OCCURRENCE_TAG: &str = "LASTOCC-ORDER:";

#[derive(Debug)]
pub enum IndexParsingError {
    Io(io::Error),
    MissingLeaves,
    InvalidLeaves(String),
    MissingTrieHeader,
    InvalidTrieHeader(String),
    InvalidLastOccurrenceOrder(String),
    Truncated { expected: usize, found: usize },
    UnknownNode { mass: Option<MassType>, point: Point },
}

impl Display for IndexParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match &self {
            Self::Io(e) => format!("Failed to read index: {}", e),
            Self::MissingLeaves => "Index has no LEAVES line".to_string(),
            Self::InvalidLeaves(line) => format!("Malformed LEAVES line \"{}\"", line),
            Self::MissingTrieHeader => "Index has no TRIE header after LEAVES".to_string(),
            Self::InvalidTrieHeader(line) => format!("Malformed TRIE header \"{}\"", line),
            Self::InvalidLastOccurrenceOrder(line) => {
                format!("Malformed LASTOCC-ORDER line \"{}\"", line)
            }
            Self::Truncated { expected, found } => format!(
                "Index declares {} trie nodes but only {} were read",
                expected, found
            ),
            Self::UnknownNode { mass: Some(mass), point } => format!(
                "Search tree for mass {} holds ({},{}), which is not a trie node",
                mass, point.x, point.y
            ),
            Self::UnknownNode { mass: None, point } => format!(
                "Leaves hold ({},{}), which is not a trie node",
                point.x, point.y
            ),
        };
        f.write_str(&text)
    }
}

impl Error for IndexParsingError {}

impl From<io::Error> for IndexParsingError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<IndexParsingError> for io::Error {
    fn from(value: IndexParsingError) -> Self {
        match value {
            IndexParsingError::Io(e) => e,
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Write `index` as lines of text: one `<mass>:<PST>` line per mass in
/// ascending order, the leaves PST, the trie header, the last occurrence
/// symbol order and one record per trie node in preorder.
pub fn write_index<W: Write>(index: &BlockIndex, mut writer: W) -> io::Result<()> {
    for (mass, pst) in index.psts.iter().sorted_by_key(|(mass, _)| **mass) {
        writeln!(writer, "{}:{}", mass, pst)?;
    }
    writeln!(writer, "{}{}", LEAVES_TAG, index.leaves)?;
    writeln!(writer, "{}{}", TRIE_TAG, index.nodes.len())?;

    let tracked = &index.tracked_symbols;
    if !tracked.is_empty() {
        writeln!(
            writer,
            "{}{}:{}",
            LAST_OCCURRENCE_TAG,
            tracked.len(),
            tracked.iter().map(|s| *s as char).join(",")
        )?;
    }

    for (preorder, node) in index.nodes.iter().enumerate() {
        write!(
            writer,
            "{},{},{},{},",
            preorder,
            node.postorder,
            node.parent_preorder,
            index.leaf_sequence(preorder).unwrap_or_default()
        )?;
        if !tracked.is_empty() {
            for occurrence in index.last_occurrence_row(preorder) {
                write!(writer, "{},", occurrence)?;
            }
        }
        let links = index.links_of(preorder);
        if !links.is_empty() {
            write!(writer, "|{}:{}", links.len(), links.iter().join(","))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn parse_mass_line(line: &str) -> Option<(MassType, MinMaxPST)> {
    let (mass, pst) = line.split_once(':')?;
    let mass = mass.trim().parse().ok()?;
    let pst = pst.parse().ok()?;
    Some((mass, pst))
}

fn parse_trie_header(line: &str) -> Result<usize, IndexParsingError> {
    let count = line
        .strip_prefix(TRIE_TAG)
        .ok_or(IndexParsingError::MissingTrieHeader)?;
    count
        .trim()
        .parse()
        .map_err(|_| IndexParsingError::InvalidTrieHeader(line.to_string()))
}

fn parse_last_occurrence_order(line: &str) -> Result<Vec<u8>, IndexParsingError> {
    let invalid = || IndexParsingError::InvalidLastOccurrenceOrder(line.to_string());
    let body = line.strip_prefix(LAST_OCCURRENCE_TAG).ok_or_else(invalid)?;
    let (count, symbols) = body.split_once(':').ok_or_else(invalid)?;
    let count: usize = count.trim().parse().map_err(|_| invalid())?;
    let symbols = symbols
        .split(',')
        .map(|s| match s.trim().as_bytes() {
            [symbol] => Ok(*symbol),
            _ => Err(invalid()),
        })
        .collect::<Result<Vec<u8>, _>>()?;
    // Lookups binary search this order
    if symbols.len() != count || !symbols.windows(2).all(|w| w[0] < w[1]) {
        return Err(invalid());
    }
    Ok(symbols)
}

/// One node record as written by [`write_index`]
#[derive(Debug, PartialEq)]
struct ParsedRecord<'a> {
    preorder: Coord,
    node: NodeRecord,
    sequence: &'a str,
    last_occurrence: Vec<Coord>,
    links: Vec<Coord>,
}

fn parse_record(line: &str, num_tracked: usize) -> Option<ParsedRecord<'_>> {
    let (body, links) = match line.split_once('|') {
        Some((body, links)) => (body, Some(links)),
        None => (line, None),
    };

    let fields: Vec<&str> = body.split(',').collect();
    if fields.len() != 5 + num_tracked || !fields[fields.len() - 1].is_empty() {
        return None;
    }
    let preorder = fields[0].parse().ok()?;
    let postorder = fields[1].parse().ok()?;
    let parent_preorder = fields[2].parse().ok()?;
    let sequence = fields[3];
    let last_occurrence = fields[4..4 + num_tracked]
        .iter()
        .map(|f| f.parse().ok())
        .collect::<Option<Vec<Coord>>>()?;

    let links = match links {
        None => Vec::new(),
        Some(links) => {
            let (count, targets) = links.split_once(':')?;
            let count: usize = count.parse().ok()?;
            let targets = targets
                .split(',')
                .map(|t| t.parse().ok())
                .collect::<Option<Vec<Coord>>>()?;
            if targets.len() != count {
                return None;
            }
            targets
        }
    };

    Some(ParsedRecord {
        preorder,
        node: NodeRecord::new(postorder, parent_preorder),
        sequence,
        last_occurrence,
        links,
    })
}

impl ParsedRecord<'_> {
    /// Whether every reference in the record names one of `num_nodes` nodes
    /// and the parent precedes the node, so parent walks reach the root.
    fn is_consistent(&self, num_nodes: usize) -> bool {
        let parent = self.node.parent_preorder;
        let parent_ok = if self.preorder == 0 {
            parent == 0
        } else {
            parent < self.preorder
        };
        self.preorder < num_nodes
            && self.node.postorder < num_nodes
            && parent_ok
            && self.last_occurrence.iter().all(|&p| p < num_nodes)
            && self.links.iter().all(|&p| p < num_nodes)
    }
}

fn check_points(
    index: &BlockIndex,
    mass: Option<MassType>,
    pst: &MinMaxPST,
) -> Result<(), IndexParsingError> {
    for point in pst.iter() {
        let known = index
            .node(point.x)
            .is_some_and(|node| node.postorder == point.y);
        if !known {
            return Err(IndexParsingError::UnknownNode { mass, point: *point });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Masses,
    TrieHeader,
    Records { first: bool },
}

/// Read an index written by [`write_index`].
///
/// Malformed mass and node lines are reported and skipped, and so are node
/// records that point outside the trie or at a later parent. Structural
/// lines that are missing or malformed, node records that never turn up and
/// search tree points that are not trie nodes are an error.
pub fn read_index<R: BufRead>(reader: R) -> Result<BlockIndex, IndexParsingError> {
    let mut index = BlockIndex::default();
    let mut section = Section::Masses;
    let mut nodes: Vec<Option<NodeRecord>> = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        match section {
            Section::Masses => {
                if let Some(leaves) = line.strip_prefix(LEAVES_TAG) {
                    index.leaves = leaves
                        .parse()
                        .map_err(|_| IndexParsingError::InvalidLeaves(line.to_string()))?;
                    section = Section::TrieHeader;
                } else if let Some((mass, pst)) = parse_mass_line(line) {
                    index.psts.insert(mass, pst);
                } else {
                    log::error!("Skipping malformed mass line {}: {}", line_number + 1, line);
                }
            }
            Section::TrieHeader => {
                let n = parse_trie_header(line)?;
                nodes = vec![None; n];
                section = Section::Records { first: true };
            }
            Section::Records { first } => {
                section = Section::Records { first: false };
                if first && line.starts_with(LAST_OCCURRENCE_TAG) {
                    index.tracked_symbols = parse_last_occurrence_order(line)?;
                    index.last_occurrence = vec![0; nodes.len() * index.tracked_symbols.len()];
                    continue;
                }
                let stride = index.tracked_symbols.len();
                match parse_record(line, stride) {
                    Some(record) if record.is_consistent(nodes.len()) => {
                        let preorder = record.preorder;
                        nodes[preorder] = Some(record.node);
                        if !record.sequence.is_empty() {
                            index.sequences.insert(preorder, record.sequence.to_string());
                        }
                        index.last_occurrence[preorder * stride..(preorder + 1) * stride]
                            .copy_from_slice(&record.last_occurrence);
                        if !record.links.is_empty() {
                            index.links.insert(preorder, record.links);
                        }
                    }
                    _ => {
                        log::warn!("Skipping malformed node record {}: {}", line_number + 1, line);
                    }
                }
            }
        }
    }

    match section {
        Section::Masses => return Err(IndexParsingError::MissingLeaves),
        Section::TrieHeader => return Err(IndexParsingError::MissingTrieHeader),
        Section::Records { .. } => {}
    }

    let expected = nodes.len();
    index.nodes = nodes.into_iter().flatten().collect();
    if index.nodes.len() != expected {
        return Err(IndexParsingError::Truncated {
            expected,
            found: index.nodes.len(),
        });
    }
    for (mass, pst) in index.psts.iter() {
        check_points(&index, Some(*mass), pst)?;
    }
    check_points(&index, None, &index.leaves)?;
    log::debug!(
        "Read index with {} masses, {} leaves and {} trie nodes",
        index.psts.len(),
        index.leaves.len(),
        index.nodes.len()
    );
    Ok(index)
}

pub fn write_block_index<P: AsRef<Path>>(index: &BlockIndex, path: &P) -> io::Result<()> {
    let mut writer = io::BufWriter::new(fs::File::create(path)?);
    write_index(index, &mut writer)?;
    writer.flush()
}

pub fn read_block_index<P: AsRef<Path>>(path: &P) -> io::Result<BlockIndex> {
    let reader = io::BufReader::new(fs::File::open(path)?);
    Ok(read_index(reader)?)
}
