#![no_main]

use homemeter_rs::p1::TelegramFrameAssembler;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut assembler = TelegramFrameAssembler::new();
    // Split the input so chunk boundaries land inside lines
    let (head, tail) = data.split_at(data.len() / 2);
    let _ = assembler.push_bytes(head);
    let _ = assembler.push_bytes(tail);
    let _ = assembler.finish();
});
