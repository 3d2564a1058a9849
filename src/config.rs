use std::{error::Error, fmt::Display, fs, io, path::Path};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mass::{MassDelta, MassType, ResidueTable};
use crate::modification::{Modification, ModificationTable, Site, SiteParsingError};

#[derive(Debug)]
pub enum ConfigError {
    Csv(csv::Error),
    MissingField(String),
    InvalidSymbol(String),
    InvalidMass(String),
    UnknownResidue(char),
    InvalidSite(SiteParsingError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match &self {
            Self::Csv(e) => format!("Failed to read configuration table: {}", e),
            Self::MissingField(line) => format!("Missing field in \"{}\"", line),
            Self::InvalidSymbol(symbol) => format!(
                "Invalid residue symbol \"{}\", should be a single character",
                symbol
            ),
            Self::InvalidMass(mass) => format!("Invalid mass \"{}\", should be an integer", mass),
            Self::UnknownResidue(symbol) => format!("Unknown residue '{}'", symbol),
            Self::InvalidSite(e) => e.to_string(),
        };
        f.write_str(&text)
    }
}

impl Error for ConfigError {}

impl From<csv::Error> for ConfigError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<SiteParsingError> for ConfigError {
    fn from(value: SiteParsingError) -> Self {
        Self::InvalidSite(value)
    }
}

/// Residue masses and modifications shared by index construction and search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub residues: ResidueTable,
    pub modifications: ModificationTable,
}

impl Config {
    pub fn new(residues: ResidueTable, modifications: ModificationTable) -> Self {
        Self { residues, modifications }
    }

    /// Load the residue table and modification table from their files,
    /// substituting the built-in residues and no modifications for any file
    /// that is not given or cannot be read.
    pub fn load(alphabet: Option<&Path>, modifications: Option<&Path>) -> Self {
        let residues = match alphabet {
            Some(path) => {
                let table = open_table(path).and_then(read_residue_table);
                match table {
                    Ok(table) => table,
                    Err(e) => {
                        log::warn!(
                            "Could not load residue masses from {}: {e}. Using defaults",
                            path.display()
                        );
                        ResidueTable::default()
                    }
                }
            }
            None => ResidueTable::default(),
        };

        let modifications = match modifications {
            Some(path) => {
                let table = open_table(path).and_then(|fh| read_modification_table(fh, &residues));
                match table {
                    Ok(table) => table,
                    Err(e) => {
                        log::warn!(
                            "Could not load modifications from {}: {e}. Using none",
                            path.display()
                        );
                        ModificationTable::default()
                    }
                }
            }
            None => ModificationTable::default(),
        };
        log::debug!(
            "Loaded {} residues and {} modifications",
            residues.len(),
            modifications.len()
        );
        Self::new(residues, modifications)
    }
}

fn open_table(path: &Path) -> Result<fs::File, ConfigError> {
    let handle = fs::File::open(path).map_err(csv::Error::from)?;
    Ok(handle)
}

fn table_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b' ')
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Repeated separators produce empty fields and tabs are not separators to
/// the csv reader, so re-split every field on whitespace.
fn fields_of(record: &csv::StringRecord) -> Vec<&str> {
    record.iter().flat_map(str::split_whitespace).collect()
}

fn parse_symbol(field: &str) -> Result<u8, ConfigError> {
    match field.as_bytes() {
        [symbol] => Ok(*symbol),
        _ => Err(ConfigError::InvalidSymbol(field.to_string())),
    }
}

fn parse_residue(fields: &[&str]) -> Result<(u8, MassType), ConfigError> {
    let [symbol, mass, ..] = fields else {
        return Err(ConfigError::MissingField(fields.join(" ")));
    };
    let symbol = parse_symbol(symbol)?;
    let mass = mass
        .parse::<MassType>()
        .map_err(|_| ConfigError::InvalidMass(mass.to_string()))?;
    Ok((symbol, mass))
}

fn parse_modification(
    fields: &[&str],
    residues: &ResidueTable,
) -> Result<Modification, ConfigError> {
    let [symbol, delta, site, ..] = fields else {
        return Err(ConfigError::MissingField(fields.join(" ")));
    };
    let symbol = parse_symbol(symbol)?;
    if !residues.contains(symbol) {
        return Err(ConfigError::UnknownResidue(symbol as char));
    }
    let delta = delta
        .parse::<MassDelta>()
        .map_err(|_| ConfigError::InvalidMass(delta.to_string()))?;
    let site: Site = site.parse()?;
    Ok(Modification::new(site, symbol, delta))
}

/// Read `symbol mass` lines. Lines starting with `#` are comments and
/// malformed lines are skipped.
pub fn read_residue_table<R: io::Read>(reader: R) -> Result<ResidueTable, ConfigError> {
    let mut table = ResidueTable::empty();
    for record in table_reader(reader).records() {
        let record = record?;
        let fields = fields_of(&record);
        if fields.is_empty() {
            continue;
        }
        match parse_residue(&fields) {
            Ok((symbol, mass)) => table.insert(symbol, mass),
            Err(e) => log::warn!("Skipping residue entry: {e}"),
        }
    }
    Ok(table)
}

/// Read `symbol delta site` lines, where site is one of `N`, `C` or `*`.
/// Modifications of residues that `residues` does not know are skipped.
pub fn read_modification_table<R: io::Read>(
    reader: R,
    residues: &ResidueTable,
) -> Result<ModificationTable, ConfigError> {
    let mut table = ModificationTable::new();
    for record in table_reader(reader).records() {
        let record = record?;
        let fields = fields_of(&record);
        if fields.is_empty() {
            continue;
        }
        match parse_modification(&fields, residues) {
            Ok(modification) => table.add(modification),
            Err(e) => log::warn!("Skipping modification entry: {e}"),
        }
    }
    Ok(table)
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_residues() {
        let text = "# symbol mass\nG 5702\nA  7104\nB\tnope\nZ 9999\n";
        let table = read_residue_table(text.as_bytes()).unwrap();
        assert_eq!(table.get(b'G'), Some(5702));
        assert_eq!(table.get(b'A'), Some(7104));
        assert_eq!(table.get(b'Z'), Some(9999));
        assert_eq!(table.get(b'B'), None);
        assert_eq!(table.get(b'L'), None);
        assert_eq!(table.get(b'X'), Some(0));
    }

    #[test]
    fn test_read_modifications() {
        let residues = ResidueTable::default();
        let text = "# symbol delta site\nM 4321 N\nM 1234 C\nS 7997 *\n\
                    B 100 *\nT 100 Q\nM -1700 *\n";
        let table = read_modification_table(text.as_bytes(), &residues).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.n_terminal[0].deltas, vec![4321]);
        assert_eq!(table.c_terminal[0].deltas, vec![1234]);
        assert_eq!(table.anywhere[0].residue, b'M');
        assert_eq!(table.anywhere[0].deltas, vec![-1700]);
        assert_eq!(table.anywhere[1].residue, b'S');
    }

    #[test]
    fn test_load_missing_files() {
        let config = Config::load(
            Some(Path::new("this/path/does/not/exist.cfg")),
            Some(Path::new("this/path/does/not/exist/either.cfg")),
        );
        assert_eq!(config.residues, ResidueTable::default());
        assert!(config.modifications.is_empty());
    }
}
