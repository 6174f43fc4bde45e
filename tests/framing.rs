mod common;

use common::{frame, Rng};
use telemetry_bridge::decoder::decode;
use telemetry_bridge::frame::{FrameAssembler, FrameEvent};
use telemetry_bridge::{Metric, Snapshot, FRAME_CAPACITY};

fn frames_of(bytes: &[u8]) -> Vec<String> {
    FrameAssembler::new()
        .feed(bytes)
        .map(|f| f.to_string())
        .collect()
}

#[test]
fn random_streams_only_yield_clean_frames() {
    let mut rng = Rng::new(0x5EED);
    for _ in 0..200 {
        let len = rng.below(2000);
        let data = rng.noisy_bytes(len);
        let mut asm = FrameAssembler::new();
        for frame in asm.feed(&data) {
            assert!(!frame.is_empty());
            assert!(frame.len() <= FRAME_CAPACITY);
            assert!(frame.bytes().all(|b| (32..=126).contains(&b)), "{:?}", frame);
        }
        assert!(asm.pending().len() <= FRAME_CAPACITY);
    }
}

#[test]
fn random_chunking_does_not_change_frames() {
    let mut rng = Rng::new(42);
    for _ in 0..100 {
        let len = rng.below(1500);
        let data = rng.noisy_bytes(len);
        let whole = frames_of(&data);

        let mut asm = FrameAssembler::new();
        let mut chunked = Vec::new();
        let mut rest = &data[..];
        while !rest.is_empty() {
            let n = 1 + rng.below(rest.len().min(40));
            let (chunk, tail) = rest.split_at(n);
            chunked.extend(asm.feed(chunk).map(|f| f.to_string()));
            rest = tail;
        }
        assert_eq!(whole, chunked);
    }
}

#[test]
fn random_streams_never_corrupt_the_snapshot() {
    let mut rng = Rng::new(7);
    let mut snapshot = Snapshot::new();
    let keys = ["co2V.val=", "pm25V.val=", "o3V.val=", "tempV.val=", "humV.val=", "tvocV.val="];
    let mut asm = FrameAssembler::new();
    for now in 0..2000 {
        let mut data = keys[rng.below(keys.len())].as_bytes().to_vec();
        let value = rng.next_u64() as i64 % 20_000 - 5_000;
        data.extend(value.to_string().bytes());
        if rng.below(4) == 0 {
            data.extend(rng.noisy_bytes(8));
        }
        data.extend([0xFF, 0xFF, 0xFF]);
        for frame in asm.feed(&data) {
            decode(&frame, &mut snapshot, now);
        }
        for metric in Metric::ALL {
            let v = snapshot.get(metric);
            assert!(v == 0 || metric.range().contains(&v), "{} = {}", metric, v);
        }
    }
}

#[test]
fn sentinel_runs() {
    assert_eq!(frames_of(b"abc\xff\xff\xff"), vec!["abc"]);
    assert!(frames_of(b"abc\xff\xff").is_empty());
    assert_eq!(frames_of(b"abc\xff\xff\xff\xff\xff"), vec!["abc"]);
    assert!(frames_of(b"\xff\xff\xff\xff\xff\xff\xff\xff\xff").is_empty());
}

#[test]
fn overlong_content_is_never_emitted() {
    let long = "y".repeat(FRAME_CAPACITY + 1);
    assert!(frames_of(&frame(&long)).is_empty());

    let exact = "z".repeat(FRAME_CAPACITY);
    assert_eq!(frames_of(&frame(&exact)), vec![exact.clone()]);

    let mut asm = FrameAssembler::new();
    let mut events = Vec::new();
    for &b in frame(&long).iter() {
        events.extend(asm.consume(b));
    }
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], FrameEvent::Overflow(o) if o.discarded == FRAME_CAPACITY + 1));
}

#[test]
fn content_after_overflow_is_a_fresh_message() {
    let mut data = vec![b'q'; FRAME_CAPACITY + 1];
    data.extend(frame("co2V.val=450"));
    assert_eq!(frames_of(&data), vec!["co2V.val=450"]);
}
