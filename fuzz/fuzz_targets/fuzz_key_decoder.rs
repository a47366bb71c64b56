#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any byte sequence decodes to a key; only an empty read yields None
    let key = fzgrep::tui::decode(data);
    assert_eq!(key.is_none(), data.is_empty());

    let mut decoder = fzgrep::tui::InputDecoder::new();
    for chunk in data.chunks(fzgrep::tui::keys::MAX_KEY_BYTES) {
        let _ = decoder.feed(chunk);
    }
});
