#![no_main]
use libfuzzer_sys::fuzz_target;

use tagstrom::{StreamAdapter, TagSchema, TaggedEvent};

/// Normalform: benachbarte Text-Events mit gleichem Pfad verschmolzen.
fn normalized_events(input: &str, chunk_size: usize) -> Vec<TaggedEvent> {
    let schema = TagSchema::root()
        .tag_with("a", |s| s.tag("c"))
        .tag("cite").alias("rag").attr("id");
    let mut adapter = StreamAdapter::new(&schema).unwrap();

    let mut events = Vec::new();
    let mut rest = input;
    while !rest.is_empty() {
        let mut cut = chunk_size.min(rest.len());
        while cut < rest.len() && !rest.is_char_boundary(cut) {
            cut += 1;
        }
        let (chunk, tail) = rest.split_at(cut);
        events.extend(adapter.feed(chunk));
        rest = tail;
    }
    events.extend(adapter.flush());

    let mut out: Vec<TaggedEvent> = Vec::new();
    for event in events {
        match event {
            TaggedEvent::Text { path, content } => match out.last_mut() {
                Some(TaggedEvent::Text { path: last_path, content: last_content })
                    if *last_path == path =>
                {
                    last_content.push_str(&content);
                }
                _ => out.push(TaggedEvent::Text { path, content }),
            },
            other => out.push(other),
        }
    }
    out
}

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Zwei verschiedene Zerteilungen derselben Eingabe müssen dieselben
        // normalisierten Events ergeben.
        let fine = normalized_events(input, 1);
        let coarse = normalized_events(input, 11);
        assert_eq!(fine, coarse);
    }
});
