use std::fs;
use std::io::{self, prelude::*};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use mass_block_index::{
    read_block_index, read_queries, write_block_index, BlockMatcher, BlockPattern, Config, Fasta,
    IndexBuilder, QueryLine, SearchMode,
};

#[derive(Parser)]
#[command(name = "mass-block-index")]
#[command(version = "0.1.0")]
#[command(about = "Index protein sequences and search them by block masses", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index file from a FASTA file
    Build(BuildArgs),

    /// Search an index with block patterns, one `[m1, m2, ...]` per line
    Search(SearchArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    pub fasta: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
    /// Residue mass table, one `<symbol> <mass>` per line
    #[arg(short, long)]
    pub alphabet: Option<PathBuf>,
    /// Modification table, one `<residue> <delta> <site>` per line
    #[arg(short, long)]
    pub modifications: Option<PathBuf>,
    #[arg(long, default_value_t = mass_block_index::protein::DEFAULT_MAX_LENGTH)]
    pub max_length: usize,
    /// Skip the link table that mutation tolerant search needs
    #[arg(long, default_value_t = false)]
    pub no_links: bool,
}

#[derive(Args, Debug)]
struct SearchArgs {
    pub index: PathBuf,
    #[arg(long, default_value = "exact")]
    pub mode: SearchMode,
    #[arg(short, long)]
    pub alphabet: Option<PathBuf>,
    #[arg(short, long)]
    pub modifications: Option<PathBuf>,
    /// Read patterns from this file instead of standard input
    #[arg(short, long)]
    pub queries: Option<PathBuf>,
}

fn build(args: BuildArgs) -> io::Result<()> {
    let config = Config::load(args.alphabet.as_deref(), args.modifications.as_deref());

    let start = Instant::now();
    let fasta = Fasta::open(&args.fasta)?;
    log::info!(
        "Read {} proteins ({} residues) in {:0.3} seconds",
        fasta.len(),
        fasta.num_residues(),
        start.elapsed().as_secs_f64()
    );

    let start = Instant::now();
    let mut builder = IndexBuilder::new(&config)
        .max_length(args.max_length)
        .with_links(!args.no_links);
    let added = builder
        .add_fasta(&fasta)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    log::info!(
        "Added {} substrings of {} proteins in {:0.3} seconds",
        added,
        builder.num_proteins(),
        start.elapsed().as_secs_f64()
    );

    let start = Instant::now();
    let index = builder.build();
    log::info!(
        "Built index with {} trie nodes over {} masses in {:0.3} seconds",
        index.num_nodes(),
        index.num_masses(),
        start.elapsed().as_secs_f64()
    );

    let start = Instant::now();
    write_block_index(&index, &args.output)?;
    log::info!(
        "Wrote {} in {:0.3} seconds",
        args.output.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn search(args: SearchArgs) -> io::Result<()> {
    let config = Config::load(args.alphabet.as_deref(), args.modifications.as_deref());

    let start = Instant::now();
    let index = read_block_index(&args.index)?;
    log::info!(
        "Read index with {} trie nodes over {} masses in {:0.3} seconds",
        index.num_nodes(),
        index.num_masses(),
        start.elapsed().as_secs_f64()
    );

    if args.mode == SearchMode::ModificationTolerant {
        for residue in config.modifications.residues() {
            if !index.tracked_symbols().contains(&residue) {
                log::warn!(
                    "The index was built without modifications on '{}', they will never match",
                    residue as char
                );
            }
        }
    }
    if args.mode == SearchMode::MutationTolerant && !index.has_links() {
        log::warn!("The index has no link table, only the last block may carry a mutation");
    }

    let queries = match &args.queries {
        Some(path) => read_queries(io::BufReader::new(fs::File::open(path)?))?,
        None => read_queries(io::stdin().lock())?,
    };
    let patterns: Vec<BlockPattern> = queries
        .iter()
        .filter_map(QueryLine::pattern)
        .cloned()
        .collect();

    let start = Instant::now();
    let matcher = BlockMatcher::new(&index, &config, args.mode);
    #[cfg(feature = "parallelism")]
    let results = matcher.par_search_all(&patterns);
    #[cfg(not(feature = "parallelism"))]
    let results = matcher.search_all(&patterns);
    log::info!(
        "Searched {} patterns in {:0.3} seconds",
        patterns.len(),
        start.elapsed().as_secs_f64()
    );

    let mut stdout = io::BufWriter::new(io::stdout().lock());
    write_results(&queries, results, &mut stdout)?;
    stdout.flush()
}

/// Write the hits of each pattern query, one per line, with comments echoed
/// where they appeared. `results` holds one entry per pattern in order.
fn write_results<W: Write>(
    queries: &[QueryLine],
    results: Vec<Vec<String>>,
    mut writer: W,
) -> io::Result<()> {
    let mut results = results.into_iter();
    for query in queries.iter() {
        match query {
            QueryLine::Comment(text) => writeln!(writer, "{}", text)?,
            QueryLine::Pattern(pattern) => {
                let hits = results.next().unwrap_or_default();
                log::debug!("{} has {} matches", pattern, hits.len());
                for hit in hits {
                    writeln!(writer, "{}", hit)?;
                }
            }
        }
    }
    Ok(())
}

fn main() -> io::Result<()> {
    pretty_env_logger::init_timed();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => build(args),
        Commands::Search(args) => search(args),
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_results() {
        let queries = vec![
            QueryLine::Comment("# first".to_string()),
            QueryLine::Pattern(BlockPattern::new(vec![32321, 48420])),
            QueryLine::Pattern(BlockPattern::new(vec![1])),
            QueryLine::Comment("# last".to_string()),
            QueryLine::Pattern(BlockPattern::new(vec![21312])),
        ];
        let results = vec![
            vec!["PLLSPGWG".to_string()],
            vec![],
            vec!["GR".to_string(), "RG".to_string()],
        ];
        let mut buffer = Vec::new();
        write_results(&queries, results, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "# first\nPLLSPGWG\n# last\nGR\nRG\n"
        );
    }
}
