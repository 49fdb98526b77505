#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(once) = html::sanitize_fragment(input) else {
        return;
    };
    assert!(
        !once.to_ascii_lowercase().contains("<script"),
        "script survived: {once:?}"
    );
    if let Ok(twice) = html::sanitize_fragment(&once) {
        assert_eq!(once, twice);
    }
});
