#![no_main]

use libfuzzer_sys::fuzz_target;
use sevenz_inspect::{scan, NullSink, TreeSink};

fuzz_target!(|data: &[u8]| {
    let mut src: &[u8] = data;
    let _ = scan(&mut src, &mut NullSink);

    // The collecting sink must stay balanced on the same input.
    let mut src: &[u8] = data;
    let mut sink = TreeSink::new();
    let _ = scan(&mut src, &mut sink);
    let _ = sink.into_roots();
});
