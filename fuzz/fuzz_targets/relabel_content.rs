//! Fuzz target for whole-file label relabeling.
//!
//! This fuzzer feeds arbitrary UTF-8 label files to the relabeler's line
//! rewriter, checking for panics, crashes, or hangs, and that accepted files
//! keep their line count.

#![no_main]

use bsort::relabel::fuzz_relabel_content;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(lines) = fuzz_relabel_content(content) {
        assert_eq!(lines, content.lines().count());
    }
});
