#![allow(clippy::unwrap_used)]

use super::*;
use crate::import::SheetReader;

fn parse_all(content: &str) -> Vec<std::result::Result<crate::models::ParsedRow, String>> {
    SheetReader::new(content)
        .unwrap()
        .rows()
        .map(|r| r.map_err(|e| e.to_string()))
        .collect()
}

fn sample_sheet() -> String {
    let mut sheet = String::from("Item,Store ID,Regular Price,Sale Price,Category\n");
    for i in 0..40 {
        sheet.push_str(&format!("Crème brûlée {i},{},4.{i:02},2/$5,Dairy\n", i % 3 + 1));
    }
    sheet.push_str("Bad row,1,4.00,N/A,Dairy\n");
    sheet
}

// ── split_into_chunks ─────────────────────────────────────────

#[test]
fn test_split_short_content_is_one_chunk() {
    assert_eq!(split_into_chunks("a,b\n1,2\n", CHUNK_SIZE), vec!["a,b\n1,2\n"]);
}

#[test]
fn test_split_empty_content() {
    assert_eq!(split_into_chunks("", 10), vec![""]);
}

#[test]
fn test_split_exact_multiple() {
    assert_eq!(split_into_chunks("abcdef", 3), vec!["abc", "def"]);
    assert_eq!(split_into_chunks("abcdefg", 3), vec!["abc", "def", "g"]);
}

#[test]
fn test_split_counts_characters_not_bytes() {
    let chunks = split_into_chunks("ééééé", 2);
    assert_eq!(chunks, vec!["éé", "éé", "é"]);
}

#[test]
fn test_split_zero_target_does_not_loop() {
    assert_eq!(split_into_chunks("abc", 0), vec!["a", "b", "c"]);
}

#[test]
fn test_split_then_concat_is_identity() {
    let sheet = sample_sheet();
    for target in [1, 7, 64, 500, CHUNK_SIZE] {
        assert_eq!(split_into_chunks(&sheet, target).concat(), sheet);
    }
}

// ── ChunkAssembler ────────────────────────────────────────────

#[test]
fn test_assembler_orders_by_index_not_arrival() {
    let now = Instant::now();
    let mut asm = ChunkAssembler::new("u1".into(), 3, now).unwrap();
    asm.insert(2, 3, "c".into(), now).unwrap();
    asm.insert(0, 3, "a".into(), now).unwrap();
    assert!(!asm.is_complete());
    asm.insert(1, 3, "b".into(), now).unwrap();
    assert!(asm.is_complete());
    assert_eq!(asm.assemble().unwrap(), "abc");
}

#[test]
fn test_assembler_ignores_identical_duplicate() {
    let now = Instant::now();
    let mut asm = ChunkAssembler::new("u1".into(), 2, now).unwrap();
    assert!(asm.insert(0, 2, "a".into(), now).unwrap());
    assert!(!asm.insert(0, 2, "a".into(), now).unwrap());
    assert_eq!(asm.received(), 1);
}

#[test]
fn test_assembler_rejects_conflicting_duplicate() {
    let now = Instant::now();
    let mut asm = ChunkAssembler::new("u1".into(), 2, now).unwrap();
    asm.insert(0, 2, "a".into(), now).unwrap();
    let err = asm.insert(0, 2, "x".into(), now).unwrap_err();
    assert!(matches!(err, Error::ChunkConflict { index: 0, .. }));
}

#[test]
fn test_assembler_rejects_bad_positions() {
    let now = Instant::now();
    assert!(matches!(
        ChunkAssembler::new("u1".into(), 0, now),
        Err(Error::ChunkOutOfRange { .. })
    ));

    let mut asm = ChunkAssembler::new("u1".into(), 2, now).unwrap();
    assert!(matches!(
        asm.insert(2, 2, "c".into(), now),
        Err(Error::ChunkOutOfRange { index: 2, total: 2 })
    ));
    assert!(matches!(
        asm.insert(1, 3, "b".into(), now),
        Err(Error::ChunkCountMismatch {
            expected: 2,
            got: 3,
            ..
        })
    ));
}

#[test]
fn test_assembler_refuses_to_truncate() {
    let now = Instant::now();
    let mut asm = ChunkAssembler::new("u1".into(), 3, now).unwrap();
    asm.insert(0, 3, "a".into(), now).unwrap();
    asm.insert(2, 3, "c".into(), now).unwrap();
    assert!(matches!(
        asm.assemble(),
        Err(Error::IncompleteUpload {
            received: 2,
            total: 3,
            ..
        })
    ));
}

#[test]
fn test_assembler_staleness_tracks_last_chunk() {
    let start = Instant::now();
    let timeout = Duration::from_secs(300);
    let mut asm = ChunkAssembler::new("u1".into(), 2, start).unwrap();
    let later = start + Duration::from_secs(200);
    asm.insert(0, 2, "a".into(), later).unwrap();

    assert!(!asm.is_stale(start + Duration::from_secs(400), timeout));
    assert!(asm.is_stale(later + Duration::from_secs(301), timeout));
}

// ── Parsing reassembled content ───────────────────────────────

#[test]
fn test_chunked_parse_matches_whole_parse() {
    let sheet = sample_sheet();
    let expected = parse_all(&sheet);
    assert_eq!(expected.len(), 41);

    for target in [3, 17, 100, 1024] {
        let chunks = split_into_chunks(&sheet, target);
        let total = chunks.len();
        let now = Instant::now();
        let mut asm = ChunkAssembler::new("u1".into(), total, now).unwrap();
        // deliver newest first
        for (index, chunk) in chunks.iter().enumerate().rev() {
            asm.insert(index, total, chunk.to_string(), now).unwrap();
        }
        let reassembled = asm.assemble().unwrap();
        assert_eq!(reassembled, sheet);
        assert_eq!(parse_all(&reassembled), expected);
    }
}
