//! Shardbridge Tool - CLI for inspecting shardbridge wire buffers
//!
//! # Commands
//!
//! - `inspect-tuples` - Decode a tuple response and print its header and tuples
//! - `sort-tuples` - Sort a tuple response into heap order
//! - `inspect-xids` - Decode an xid-set response
//! - `merge-terms` - Merge sorted newline-delimited term files
//! - `config-check` - Parse and validate a bridge configuration file
//!
//! # Examples
//!
//! ```bash
//! shardbridge-tool inspect-tuples -f response.bin --scores -n 20
//! shardbridge-tool sort-tuples -i response.bin -o sorted.bin --scores
//! shardbridge-tool merge-terms shard0.txt shard1.txt shard2.txt > merged.txt
//! ```

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use shardbridge_core::{BridgeConfig, TupleBuffer, decode_xid_set, merge::KWayMerge};

#[derive(Parser)]
#[command(name = "shardbridge-tool")]
#[command(version, about = "CLI for inspecting shardbridge wire buffers")]
#[command(after_help = "Use 'shardbridge-tool <command> --help' for more information.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a tuple response buffer
    InspectTuples {
        /// Path to the buffer
        #[arg(short, long)]
        file: PathBuf,

        /// Buffer carries scores (10-byte tuples)
        #[arg(long, default_value = "false")]
        scores: bool,

        /// Number of tuples to print
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Sort a tuple response buffer by (blockno, offno)
    SortTuples {
        /// Input buffer
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (defaults to sorting in place)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Buffer carries scores (10-byte tuples)
        #[arg(long, default_value = "false")]
        scores: bool,
    },

    /// Decode an xid-set response buffer
    InspectXids {
        /// Path to the buffer
        #[arg(short, long)]
        file: PathBuf,

        /// Number of xids to print
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Merge sorted newline-delimited term files to stdout
    MergeTerms {
        /// Input files, each sorted
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Validate a JSON bridge configuration
    ConfigCheck {
        /// Path to the JSON config
        #[arg(short, long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shardbridge_tool=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match cli.command {
        Commands::InspectTuples {
            file,
            scores,
            limit,
        } => inspect_tuples(&file, scores, limit, &mut out)?,
        Commands::SortTuples {
            input,
            output,
            scores,
        } => {
            let output = output.unwrap_or_else(|| input.clone());
            sort_tuples(&input, &output, scores)?;
        }
        Commands::InspectXids { file, limit } => inspect_xids(&file, limit, &mut out)?,
        Commands::MergeTerms { files } => merge_terms(&files, &mut out)?,
        Commands::ConfigCheck { file } => config_check(&file, &mut out)?,
    }

    out.flush()?;
    Ok(())
}

fn read_tuples(path: &Path, scores: bool) -> Result<TupleBuffer> {
    let data = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    TupleBuffer::from_bytes(data, scores)
        .with_context(|| format!("Failed to decode tuple buffer {:?}", path))
}

fn inspect_tuples<W: Write>(path: &Path, scores: bool, limit: usize, out: &mut W) -> Result<()> {
    let buffer = read_tuples(path, scores)?;

    writeln!(out, "tuples:     {}", buffer.len())?;
    writeln!(out, "stride:     {} bytes", buffer.stride())?;
    if let Some(max) = buffer.max_score() {
        writeln!(out, "max score:  {}", max)?;
    }
    writeln!(out, "sorted:     {}", buffer.is_sorted())?;

    for (i, tuple) in buffer.iter().take(limit).enumerate() {
        match tuple.score {
            Some(score) => writeln!(out, "{:>8}  {}  {}", i, tuple.pointer, score)?,
            None => writeln!(out, "{:>8}  {}", i, tuple.pointer)?,
        }
    }
    if buffer.len() > limit {
        writeln!(out, "... {} more", buffer.len() - limit)?;
    }
    Ok(())
}

fn sort_tuples(input: &Path, output: &Path, scores: bool) -> Result<()> {
    let mut buffer = read_tuples(input, scores)?;
    buffer.sort();
    fs::write(output, buffer.as_bytes())
        .with_context(|| format!("Failed to write {:?}", output))?;
    info!("Sorted {} tuples into {:?}", buffer.len(), output);
    Ok(())
}

fn inspect_xids<W: Write>(path: &Path, limit: usize, out: &mut W) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let xids = decode_xid_set(&data)
        .with_context(|| format!("Failed to decode xid set {:?}", path))?;

    writeln!(out, "xids:       {}", xids.len())?;
    if let (Some(min), Some(max)) = (xids.iter().min(), xids.iter().max()) {
        writeln!(out, "range:      {}..={}", min, max)?;
    }
    for xid in xids.iter().take(limit) {
        writeln!(out, "{}", xid)?;
    }
    if xids.len() > limit {
        writeln!(out, "... {} more", xids.len() - limit)?;
    }
    Ok(())
}

fn merge_terms<W: Write>(files: &[PathBuf], out: &mut W) -> Result<()> {
    let mut lists = Vec::with_capacity(files.len());
    for path in files {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let terms = BufReader::new(file)
            .lines()
            .collect::<io::Result<Vec<String>>>()
            .with_context(|| format!("Failed to read {:?}", path))?;
        if let Some(pos) = terms.windows(2).position(|w| w[0] > w[1]) {
            anyhow::bail!("{:?} is not sorted at line {}", path, pos + 2);
        }
        lists.push(terms);
    }

    let lengths: Vec<usize> = lists.iter().map(Vec::len).collect();
    let merge = KWayMerge::new(&lists, &lengths);
    let total = merge.len();
    for term in merge {
        writeln!(out, "{}", term)?;
    }
    info!("Merged {} terms from {} files", total, files.len());
    Ok(())
}

fn config_check<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let config = BridgeConfig::from_json(&json)
        .with_context(|| format!("Invalid configuration {:?}", path))?;
    writeln!(out, "{:#?}", config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardbridge_core::{ItemPointer, LocationTuple, encode_tuples, encode_xid_set};

    fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_sort_tuples_file() {
        let dir = tempfile::tempdir().unwrap();
        let tuples = [
            LocationTuple::new(ItemPointer::new(8, 1), Some(1.0)),
            LocationTuple::new(ItemPointer::new(2, 5), Some(3.0)),
        ];
        let input = write_file(dir.path(), "in.bin", &encode_tuples(&tuples, true).unwrap());
        let output = dir.path().join("out.bin");

        sort_tuples(&input, &output, true).unwrap();
        let sorted = read_tuples(&output, true).unwrap();
        assert!(sorted.is_sorted());
        assert_eq!(sorted.get(0).unwrap().pointer, ItemPointer::new(2, 5));

        let mut report = Vec::new();
        inspect_tuples(&output, true, 1, &mut report).unwrap();
        let report = String::from_utf8(report).unwrap();
        assert!(report.contains("tuples:     2"));
        assert!(report.contains("max score:  3"));
        assert!(report.contains("2-5"));
        assert!(report.contains("... 1 more"));
    }

    #[test]
    fn test_inspect_rejects_wrong_stride() {
        let dir = tempfile::tempdir().unwrap();
        let tuples = [LocationTuple::new(ItemPointer::new(1, 1), Some(1.0))];
        let path = write_file(dir.path(), "t.bin", &encode_tuples(&tuples, true).unwrap());
        assert!(inspect_tuples(&path, false, 10, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_inspect_xids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "x.bin", &encode_xid_set([30u64, 10, 20]));

        let mut report = Vec::new();
        inspect_xids(&path, 10, &mut report).unwrap();
        let report = String::from_utf8(report).unwrap();
        assert!(report.contains("xids:       3"));
        assert!(report.contains("range:      10..=30"));
    }

    #[test]
    fn test_merge_terms() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.txt", b"apple\ncherry\n");
        let b = write_file(dir.path(), "b.txt", b"banana\ncherry\ndate\n");

        let mut merged = Vec::new();
        merge_terms(&[a, b], &mut merged).unwrap();
        assert_eq!(
            String::from_utf8(merged).unwrap(),
            "apple\nbanana\ncherry\ncherry\ndate\n"
        );

        let unsorted = write_file(dir.path(), "c.txt", b"zebra\naardvark\n");
        assert!(merge_terms(&[unsorted], &mut Vec::new()).is_err());
    }

    #[test]
    fn test_config_check() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "good.json", br#"{"scroll_batch_size": 250}"#);
        let mut report = Vec::new();
        config_check(&good, &mut report).unwrap();
        assert!(String::from_utf8(report).unwrap().contains("250"));

        let bad = write_file(dir.path(), "bad.json", br#"{"max_probes_per_shard": 0}"#);
        assert!(config_check(&bad, &mut Vec::new()).is_err());
    }
}
