#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(note) = commitnote_claude::parse_note(text) {
            assert!(!note.title().is_empty());
            assert!(!note.title().contains('\n'));
            assert!(!note.body().is_empty());
        }
    }
});
