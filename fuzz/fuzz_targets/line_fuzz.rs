//! Line parser fuzz target: feed arbitrary text to the dictionary line grammar,
//! then to the stateful reader. Neither may panic.
//! Build with: cargo fuzz run line_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    for line in s.lines() {
        let _ = raddict::parse_line(line);
    }
    let options = raddict::ParseOptions {
        extension: false,
        ..Default::default()
    };
    // Includes resolve against a directory that does not exist.
    let mut parser = raddict::DictionaryParser::new("/nonexistent", options);
    let _ = parser.parse_str(s);
    let _ = parser.finish();
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run line_fuzz");
}
