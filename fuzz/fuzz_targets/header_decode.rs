#![no_main]

use libfuzzer_sys::fuzz_target;
use sevenz_inspect::{decode_header, Limits, NullSink};

fuzz_target!(|data: &[u8]| {
    // The property-tree decoder must terminate on arbitrary bytes and
    // never consume less than it reports.
    let result = decode_header(data, 0, &Limits::default(), &mut NullSink);
    // The top-level tag read always advances, even on an empty buffer.
    assert!(result.consumed >= 1);
});
