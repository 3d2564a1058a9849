use std::io::{self, prelude::*};
use std::{error::Error, fmt::Display, ops::Deref, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mass::{MassType, ResidueTable};

/// An ordered sequence of block masses to look for
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlockPattern {
    pub blocks: Vec<MassType>,
}

impl BlockPattern {
    pub fn new(blocks: Vec<MassType>) -> Self {
        Self { blocks }
    }

    /// The pattern a sequence split into `blocks` would produce
    pub fn from_sequences(blocks: &[&str], residues: &ResidueTable) -> Option<Self> {
        blocks
            .iter()
            .map(|b| residues.mass_of(b))
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
    }

    pub fn total_mass(&self) -> MassType {
        self.blocks.iter().sum()
    }
}

impl Deref for BlockPattern {
    type Target = [MassType];

    fn deref(&self) -> &Self::Target {
        &self.blocks
    }
}

impl From<Vec<MassType>> for BlockPattern {
    fn from(value: Vec<MassType>) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockPatternParsingError {
    Empty,
    MissingBrackets,
    InvalidMass(String),
}

impl Display for BlockPatternParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match &self {
            Self::Empty => "Block pattern has no blocks".to_string(),
            Self::MissingBrackets => "Block pattern must be enclosed in [ and ]".to_string(),
            Self::InvalidMass(mass) => {
                format!("Invalid block mass \"{}\", should be a positive integer", mass)
            }
        };
        f.write_str(&text)
    }
}

impl Error for BlockPatternParsingError {}

impl FromStr for BlockPattern {
    type Err = BlockPatternParsingError;

    /// Parse `[m1, m2, ..., mk]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or(BlockPatternParsingError::MissingBrackets)?;
        if inner.trim().is_empty() {
            return Err(BlockPatternParsingError::Empty);
        }
        let blocks = inner
            .split(',')
            .map(|token| {
                let token = token.trim();
                match token.parse::<MassType>() {
                    Ok(mass) if mass > 0 => Ok(mass),
                    _ => Err(BlockPatternParsingError::InvalidMass(token.to_string())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(blocks))
    }
}

impl Display for BlockPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, mass) in self.blocks.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", mass)?;
        }
        f.write_str("]")
    }
}

/// One line of a query stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryLine {
    /// A `#` line, echoed to the output where it appeared
    Comment(String),
    Pattern(BlockPattern),
}

impl QueryLine {
    pub fn pattern(&self) -> Option<&BlockPattern> {
        match self {
            Self::Pattern(pattern) => Some(pattern),
            Self::Comment(_) => None,
        }
    }
}

/// Read query lines up to the first blank line. Lines that do not parse
/// are reported and dropped.
pub fn read_queries<R: BufRead>(reader: R) -> io::Result<Vec<QueryLine>> {
    let mut queries = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if line.starts_with('#') {
            queries.push(QueryLine::Comment(line.to_string()));
            continue;
        }
        match line.parse::<BlockPattern>() {
            Ok(pattern) => queries.push(QueryLine::Pattern(pattern)),
            Err(e) => log::error!("Skipping query {} \"{}\": {}", line_number + 1, line, e),
        }
    }
    Ok(queries)
}
