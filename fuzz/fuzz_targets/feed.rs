#![no_main]
use libfuzzer_sys::fuzz_target;

use tagstrom::{StreamAdapter, TagSchema};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let schema = TagSchema::root()
            .tag_with("a", |s| s.tag("c"))
            .tag("cite").alias("rag").attr("id")
            .tag("think").tag("thinking");
        let mut adapter = StreamAdapter::new(&schema).unwrap();

        // Erstes Byte bestimmt die Chunk-Größe, der Rest ist Strominhalt
        let chunk_size = input.bytes().next().map(|b| (b as usize % 7) + 1).unwrap_or(1);
        let mut rest = input;
        while !rest.is_empty() {
            let mut cut = chunk_size.min(rest.len());
            while cut < rest.len() && !rest.is_char_boundary(cut) {
                cut += 1;
            }
            let (chunk, tail) = rest.split_at(cut);
            let _ = adapter.feed(chunk);
            rest = tail;
        }
        let _ = adapter.flush();

        assert_eq!(adapter.raw(), input);
        assert!(adapter.flush().is_empty());
    }
});
