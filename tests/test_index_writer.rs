use std::io;
use std::path::Path;

use mass_block_index::storage::{read_block_index, write_block_index};
use mass_block_index::{BlockIndex, BlockMatcher, Config, Fasta, IndexBuilder, SearchMode};

fn build_index(config: &Config) -> io::Result<BlockIndex> {
    let fasta = Fasta::open("tests/data/pep1.fasta")?;
    let mut builder = IndexBuilder::new(config);
    builder
        .add_fasta(&fasta)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(builder.build())
}

#[test]
fn test_index_write_read() -> io::Result<()> {
    let config = Config::load(None, Some(Path::new("tests/data/terminal.cfg")));
    let index = build_index(&config)?;

    let tmpdir = tempfile::tempdir()?;
    let path = tmpdir.path().join("pep1.idx");
    write_block_index(&index, &path)?;
    let duplicate_index = read_block_index(&path)?;

    assert_eq!(duplicate_index.num_nodes(), index.num_nodes());
    assert_eq!(duplicate_index.num_masses(), index.num_masses());
    assert_eq!(duplicate_index.tracked_symbols(), &[b'M']);
    for mass in index.masses() {
        assert_eq!(
            duplicate_index.pst_for(*mass).map(|p| p.points()),
            index.pst_for(*mass).map(|p| p.points())
        );
    }
    assert_eq!(duplicate_index.leaves().points(), index.leaves().points());
    for preorder in 0..index.num_nodes() {
        assert_eq!(duplicate_index.node(preorder), index.node(preorder));
        assert_eq!(duplicate_index.links_of(preorder), index.links_of(preorder));
        assert_eq!(
            duplicate_index.last_occurrence(preorder, b'M'),
            index.last_occurrence(preorder, b'M')
        );
    }
    assert_eq!(duplicate_index, index);

    let patterns: [(SearchMode, &[u64]); 3] = [
        (SearchMode::Exact, &[32321, 48420, 19910, 28416]),
        (SearchMode::ModificationTolerant, &[35720 + 4321, 28117]),
        (SearchMode::MutationTolerant, &[32321, 29812, 19910, 28416]),
    ];
    for (mode, blocks) in patterns {
        let expected = BlockMatcher::new(&index, &config, mode).search(blocks);
        assert!(!expected.is_empty());
        assert_eq!(
            BlockMatcher::new(&duplicate_index, &config, mode).search(blocks),
            expected
        );
    }
    Ok(())
}

#[test]
fn test_read_missing_index() {
    let err = read_block_index(&"tests/data/does-not-exist.idx").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[test]
fn test_read_corrupt_index() -> io::Result<()> {
    let tmpdir = tempfile::tempdir()?;
    let path = tmpdir.path().join("corrupt.idx");
    std::fs::write(&path, "0:1:(0,3)\nLEAVES:1:(1,0)\nTRIE:4\n0,3,0,,\n")?;
    let err = read_block_index(&path).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    Ok(())
}
