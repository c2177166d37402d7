// e2e/streaming_dictionary.rs: one table reused across a streamed input
//
// Feeds an input through a DictionaryBuffer in blocks, rebuilding the same
// MatchTable for each window, and checks that:
//   - matches found in later blocks reach back into the retained prefix
//   - the greedy token stream over all blocks decodes to the input
//   - a cancelled block can be rebuilt and the stream continues

#[path = "../tests/range_enc/support.rs"]
mod support;

use std::time::Duration;

use flzma2::cli::analyze::encode_block;
use flzma2::cli::tokens::TokenEncoder;
use flzma2::cli::FileReport;
use flzma2::radix::{DictionaryBuffer, MatchTable, RadixParams, MIN_MATCH_LENGTH};
use flzma2::threadpool::BuildPool;
use flzma2::Fl2Error;

use support::{RangeDecoder, XorShift};

/// Random "records" that repeat with small edits: far repeats cross block
/// boundaries.
fn records(count: usize, seed: u64) -> Vec<u8> {
    let mut rng = XorShift::new(seed);
    let templates: Vec<Vec<u8>> = (0..24)
        .map(|_| (0..96).map(|_| b'a' + rng.below(26) as u8).collect())
        .collect();
    let mut out = Vec::new();
    for _ in 0..count {
        let mut rec = templates[rng.below(templates.len() as u64) as usize].clone();
        let edit = rng.below(rec.len() as u64) as usize;
        rec[edit] = b'#';
        out.extend_from_slice(&rec);
        out.push(b'\n');
    }
    out
}

fn decode(chunks: &[flzma2::cli::tokens::CodedChunk]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in chunks {
        let mut models = flzma2::cli::tokens::TokenModels::default();
        let mut dec = RangeDecoder::new(&chunk.bytes);
        let target = out.len() + chunk.input_size;
        while out.len() < target {
            let state = models.prev_match as usize;
            if dec.decode_bit(&mut models.is_match[state]) == 0 {
                out.push(dec.decode_bit_tree(&mut models.literal, 8) as u8);
                models.prev_match = false;
                continue;
            }
            let length = dec.decode_bit_tree(&mut models.length, 8) as usize + MIN_MATCH_LENGTH;
            let bits = dec.decode_bit_tree(&mut models.offset_slot, 5) + 1;
            let mut offset: u32 = 1;
            if bits > 1 {
                offset = (1 << (bits - 1)) | dec.decode_direct(bits - 1);
            }
            let from = out.len() - offset as usize;
            for k in 0..length {
                out.push(out[from + k]);
            }
            models.prev_match = true;
        }
    }
    out
}

struct Stream {
    dict: DictionaryBuffer,
    table: MatchTable,
    pool: BuildPool,
    params: RadixParams,
    encoder: TokenEncoder,
    report: FileReport,
    far_matches: u64,
}

impl Stream {
    fn new(dictionary_size: usize, threads: usize) -> Self {
        let params = RadixParams {
            overlap_fraction: 4,
            ..RadixParams::with_dictionary_size(dictionary_size)
        };
        Stream {
            dict: DictionaryBuffer::new(dictionary_size).unwrap(),
            table: MatchTable::new(&params, threads).unwrap(),
            pool: BuildPool::new(threads).unwrap(),
            params,
            encoder: TokenEncoder::new().unwrap(),
            report: FileReport::default(),
            far_matches: 0,
        }
    }

    /// Append as much of `input` as fits, build and walk the window, then
    /// shift. Returns the bytes consumed.
    fn step(&mut self, input: &[u8], cancel_first: bool) -> usize {
        let taken = self.dict.append(input);
        let block = self.dict.block();
        self.table.init(&block).unwrap();
        if cancel_first {
            let control = self.table.control();
            let result = self.table.build_with_progress(
                &block,
                &self.pool,
                Duration::ZERO,
                || control.cancel(),
            );
            // Small windows may finish before the first tick.
            assert!(matches!(result, Ok(()) | Err(Fl2Error::Cancelled)), "{result:?}");
            self.table.init(&block).unwrap();
        }
        self.table.build(&block, &self.pool).unwrap();
        self.table.integrity_check(&block, self.params.depth).unwrap();

        for i in block.start()..block.end() {
            if let Some(m) = self.table.get_match(&block, i, 273, self.params.depth) {
                if (m.offset as usize) > i - block.start() {
                    self.far_matches += 1;
                }
            }
        }
        encode_block(
            &self.table,
            &block,
            self.params.depth,
            &mut self.encoder,
            &mut self.report,
        )
        .unwrap();
        self.report.input_size += block.len() as u64;
        self.report.blocks += 1;
        self.dict.shift(self.params.overlap_size());
        taken
    }

    fn run(mut self, input: &[u8], cancel_every: usize) -> (FileReport, u64, Vec<u8>) {
        let mut pos = 0;
        let mut n = 0;
        while pos < input.len() {
            let cancel = cancel_every != 0 && n % cancel_every == 0;
            pos += self.step(&input[pos..], cancel);
            n += 1;
        }
        let chunks = self.encoder.finish().unwrap();
        (self.report, self.far_matches, decode(&chunks))
    }
}

#[test]
fn streamed_blocks_decode_to_input() {
    let input = records(3000, 1);
    let (report, far, decoded) = Stream::new(1 << 15, 3).run(&input, 0);
    assert!(report.blocks > 5);
    assert_eq!(report.input_size, input.len() as u64);
    assert_eq!(report.literals + report.matched_bytes, input.len() as u64);
    assert!(far > 0, "no match reached into a retained prefix");
    assert!(decoded == input);
}

#[test]
fn cancelled_blocks_are_rebuilt() {
    let input = records(2000, 2);
    let (report, _, decoded) = Stream::new(1 << 14, 2).run(&input, 2);
    assert_eq!(report.input_size, input.len() as u64);
    assert!(decoded == input);
}

#[test]
fn streamed_and_single_window_cover_similarly() {
    let input = records(1500, 3);
    let (streamed, _, _) = Stream::new(1 << 14, 2).run(&input, 0);
    let (single, _, _) = Stream::new(1 << 18, 2).run(&input, 0);
    assert_eq!(single.blocks, 1);
    // The 96-byte templates recur well within any window.
    assert!(streamed.coverage() > 90.0, "{streamed:?}");
    assert!(single.coverage() >= streamed.coverage() - 1.0);
}
