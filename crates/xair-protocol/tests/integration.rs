//! Integration tests for the xair-protocol crate.
//!
//! These exercise the public API the way the sync layer uses it:
//! building snapshot commands, pushing them through the codec and
//! reading them back, plus the failure paths a noisy link produces.

use xair_protocol::address::{name_address, parse_name_slot, LOAD_ADDRESS};
use xair_protocol::message::{load_command, name_query, name_reply, parse_load_command};
use xair_protocol::{decode, encode, Arg, DecodeError, IndexBase, SnapshotIndex};

// ---------------------------------------------------------------------------
// 1. Recall commands survive the codec for every slot
// ---------------------------------------------------------------------------

#[test]
fn every_slot_load_command_roundtrips() {
    for index in SnapshotIndex::all() {
        let bytes = load_command(index, IndexBase::ZeroBased).encode().unwrap();
        let decoded = decode(&bytes).expect("load command should decode");

        assert_eq!(decoded.addr, LOAD_ADDRESS);
        assert_eq!(decoded.args, vec![Arg::Int(index.get() as i32 - 1)]);
        assert_eq!(parse_load_command(&decoded, IndexBase::ZeroBased), Some(index));
    }
}

#[test]
fn index_base_mismatch_shifts_the_slot() {
    let index = SnapshotIndex::new(10).unwrap();
    let decoded = decode(&load_command(index, IndexBase::OneBased).encode().unwrap()).unwrap();

    // Read back with the wrong base, slot 10 looks like slot 11
    assert_eq!(
        parse_load_command(&decoded, IndexBase::ZeroBased),
        Some(SnapshotIndex::new(11).unwrap())
    );
}

// ---------------------------------------------------------------------------
// 2. Name queries and replies
// ---------------------------------------------------------------------------

#[test]
fn name_query_has_no_arguments() {
    let query = name_query(SnapshotIndex::new(5).unwrap());
    let decoded = decode(&query.encode().unwrap()).unwrap();

    assert_eq!(decoded.addr, "/-snap/05/name");
    assert!(decoded.args.is_empty());
}

#[test]
fn name_reply_slot_and_name_recoverable() {
    let index = SnapshotIndex::new(64).unwrap();
    let bytes = name_reply(index, "Blackout").encode().unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(parse_name_slot(&decoded.addr), Ok(64));
    assert_eq!(decoded.first_str(), Some("Blackout"));
}

#[test]
fn reply_with_unicode_name() {
    let index = SnapshotIndex::new(2).unwrap();
    let decoded = decode(&name_reply(index, "Bühne – Totale").encode().unwrap()).unwrap();
    assert_eq!(decoded.first_str(), Some("Bühne – Totale"));
}

#[test]
fn name_address_matches_query_address() {
    for index in SnapshotIndex::all() {
        assert_eq!(name_query(index).addr, name_address(index));
    }
}

// ---------------------------------------------------------------------------
// 3. Generic codec round-trips
// ---------------------------------------------------------------------------

#[test]
fn codec_roundtrip_preserves_arguments() {
    let cases: Vec<(&str, Vec<Arg>)> = vec![
        ("/-snap/load", vec![Arg::Int(0)]),
        ("/-snap/load", vec![Arg::Int(i32::MAX)]),
        ("/-snap/01/name", vec![]),
        ("/-snap/01/name", vec![Arg::Str(String::new())]),
        ("/ch/01/mix/fader", vec![Arg::Float(0.5)]),
        ("/a/b/c", vec![Arg::Int(-1), Arg::Str("x".into()), Arg::Float(-2.25)]),
    ];

    for (addr, args) in cases {
        let decoded = decode(&encode(addr, &args).unwrap()).unwrap();
        assert_eq!(decoded.addr, addr);
        assert_eq!(decoded.args, args);
    }
}

// ---------------------------------------------------------------------------
// 4. Garbage in, recoverable error out
// ---------------------------------------------------------------------------

#[test]
fn decode_pseudo_random_bytes_never_panics() {
    // Small xorshift so the test is deterministic without a rand dependency
    let mut state: u32 = 0x9E37_79B9;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };

    for _ in 0..2000 {
        let len = (next() % 64) as usize;
        let data: Vec<u8> = (0..len).map(|_| next() as u8).collect();
        let _ = decode(&data);
    }
}

#[test]
fn decode_rejects_odd_lengths() {
    assert!(matches!(decode(&[b'/']), Err(DecodeError::Malformed(_))));
    assert!(matches!(decode(b"/abc\0"), Err(DecodeError::Malformed(_))));
}

#[test]
fn decode_rejects_address_without_slash() {
    // Hand-built packet: "abc\0" ",\0\0\0"
    let data = b"abc\0,\0\0\0";
    assert!(decode(data).is_err());
}
