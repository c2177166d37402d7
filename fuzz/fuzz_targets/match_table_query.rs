#![no_main]
use libfuzzer_sys::fuzz_target;

use flzma2::radix::{build_table, DataBlock};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    // First byte picks the depth; the rest is the window.
    let depth = 6 + (data[0] as u32 % 249);
    let window = &data[1..];
    if window.is_empty() {
        return;
    }
    let block = DataBlock::whole(window);
    let table = build_table(&block, depth, 2).expect("build over a valid block");
    table
        .integrity_check(&block, depth)
        .expect("freshly built table must be consistent");

    for i in 0..window.len() {
        if let Some(m) = table.get_match(&block, i, 273, depth) {
            let (len, off) = (m.length as usize, m.offset as usize);
            assert!(len >= 2 && i + len <= window.len());
            assert!(off >= 1 && off <= i);
            assert_eq!(window[i..i + len], window[i - off..i - off + len]);
        }
    }
});
