//! Per-file analysis: stream the input through a sliding dictionary, build a
//! match table per block, walk it greedily and entropy-code the result.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::cli::tokens::{Token, TokenEncoder, MATCH_LEN_MAX};
use crate::config::DICTIONARY_SIZE_MIN;
use crate::displaylevel;
use crate::radix::{DataBlock, DictionaryBuffer, MatchTable, RadixParams};
use crate::threadpool::BuildPool;

const READ_CHUNK_SIZE: usize = 1 << 16;

/// Resolved run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub params: RadixParams,
    pub nb_workers: usize,
    pub verify: bool,
    pub poll_interval: Duration,
    pub recursive: bool,
}

/// Outcome of analysing one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub input_size: u64,
    pub blocks: u64,
    pub literals: u64,
    pub matches: u64,
    pub matched_bytes: u64,
    pub chunks: u64,
    pub coded_size: u64,
    pub estimated_size: u64,
}

impl FileReport {
    /// Share of input bytes covered by matches, in percent.
    pub fn coverage(&self) -> f64 {
        if self.input_size == 0 {
            return 0.0;
        }
        self.matched_bytes as f64 * 100.0 / self.input_size as f64
    }

    /// Coded size as a percentage of the input.
    pub fn ratio(&self) -> f64 {
        if self.input_size == 0 {
            return 0.0;
        }
        self.coded_size as f64 * 100.0 / self.input_size as f64
    }
}

/// Fill `dict` from `reader`. `Ok(true)` once the reader is exhausted.
fn fill_dictionary<R: Read>(
    dict: &mut DictionaryBuffer,
    reader: &mut R,
    scratch: &mut [u8],
) -> io::Result<bool> {
    while !dict.is_full() {
        let want = scratch.len().min(dict.free_space());
        let n = match reader.read(&mut scratch[..want]) {
            Ok(0) => return Ok(true),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        dict.append(&scratch[..n]);
    }
    Ok(false)
}

/// Greedy parse of the window of `block`, feeding `encoder` and `report`.
pub fn encode_block(
    table: &MatchTable,
    block: &DataBlock<'_>,
    depth: u32,
    encoder: &mut TokenEncoder,
    report: &mut FileReport,
) -> anyhow::Result<()> {
    let data = block.data();
    let mut index = block.start();
    while index < block.end() {
        let token = match table.get_match(block, index, MATCH_LEN_MAX, depth) {
            Some(m) => {
                report.matches += 1;
                report.matched_bytes += m.length as u64;
                Token::Match {
                    length: m.length,
                    offset: m.offset,
                }
            }
            None => {
                report.literals += 1;
                Token::Literal(data[index])
            }
        };
        encoder.push(token)?;
        index += token.len();
    }
    Ok(())
}

/// Analyse everything `reader` yields.
pub fn analyze_reader<R: Read>(
    mut reader: R,
    settings: &Settings,
    pool: &BuildPool,
) -> anyhow::Result<FileReport> {
    let params = &settings.params;
    let mut dict = DictionaryBuffer::new(params.dictionary_size)?;
    let mut table = MatchTable::new(params, pool.nb_threads())?;
    let mut encoder = TokenEncoder::new()?;
    let mut report = FileReport::default();
    let mut scratch = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let eof = fill_dictionary(&mut dict, &mut reader, &mut scratch)?;
        if dict.pending() == 0 {
            break;
        }
        let block = dict.block();
        report.input_size += block.len() as u64;
        report.blocks += 1;

        table.init(&block)?;
        let control = table.control();
        let total = block.end().max(1) as u64;
        table.build_with_progress(&block, pool, settings.poll_interval, || {
            displaylevel!(
                3,
                "\rblock {}: building table {:3}%",
                report.blocks,
                control.progress() * 100 / total
            );
        })?;
        if settings.verify {
            table
                .integrity_check(&block, params.depth)
                .context("match table verification failed")?;
        }
        displaylevel!(3, "\rblock {}: table built ({} jobs)    \n", report.blocks, table.job_count());

        encode_block(&table, &block, params.depth, &mut encoder, &mut report)?;

        if eof {
            break;
        }
        dict.shift(params.overlap_size());
    }

    report.estimated_size = encoder.estimated_bits().div_ceil(8);
    let chunks = encoder.finish()?;
    report.chunks = chunks.len() as u64;
    report.coded_size = chunks.iter().map(|c| c.bytes.len() as u64).sum();
    Ok(report)
}

pub fn analyze_file(path: &Path, settings: &Settings, pool: &BuildPool) -> anyhow::Result<FileReport> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    // No point allocating a dictionary larger than the file.
    let mut settings = settings.clone();
    if let Ok(meta) = file.metadata() {
        let size = usize::try_from(meta.len()).unwrap_or(usize::MAX);
        settings.params.dictionary_size = settings
            .params
            .dictionary_size
            .min(size.max(DICTIONARY_SIZE_MIN));
    }
    let mut report = analyze_reader(io::BufReader::new(file), &settings, pool)
        .with_context(|| format!("{}", path.display()))?;
    report.path = path.to_path_buf();
    Ok(report)
}
