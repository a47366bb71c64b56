#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    pattern: &'a str,
    text: &'a str,
}

fuzz_target!(|input: Input| {
    let score = fzgrep::query::score(input.pattern, input.text);
    let positions = fzgrep::query::match_positions(input.pattern, input.text);

    if input.pattern.is_empty() {
        assert_eq!(score, 0);
    }
    // Positions are strictly increasing char indices into the text
    let len = input.text.chars().count();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(positions.iter().all(|&p| p < len));
});
