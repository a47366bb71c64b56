#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Malformed search tool output is skipped, never a panic
    for candidate in fzgrep::search::parse_content_output(data) {
        assert!(!candidate.path.is_empty());
    }
    let _ = fzgrep::search::parse_file_output(data);
});
