#![no_main]

use homemeter_rs::gpio::EdgeTimingDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = EdgeTimingDecoder::new();
    for chunk in data.chunks_exact(4) {
        let interval = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let _ = decoder.push_interval(interval);
    }
});
