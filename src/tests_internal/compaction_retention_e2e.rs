use bytes::Bytes;

use crate::{
    cell::CellType,
    matcher::CellMatcher,
    mvcc::{TimeRange, Timestamp},
    scan::{RetentionConfig, ScanKind, ScanSpec},
    test_util::{coords, delete_column, put, scan, store_of, user_matcher, values},
};

fn compaction_matcher(
    spec: ScanSpec,
    retention: &RetentionConfig,
    kind: ScanKind,
    earliest_put_ts: u64,
) -> CellMatcher {
    CellMatcher::new(
        spec,
        retention,
        kind,
        None,
        Timestamp::new(earliest_put_ts),
        Timestamp::MAX,
    )
}

/// Minor compaction keeps every marker but still drops the data they cover.
#[test]
fn minor_compaction_keeps_markers_drops_covered_data() {
    let store = store_of([
        delete_column("r1", "a", 5),
        put("r1", "a", 5, "covered"),
        put("r1", "a", 3, "covered-too"),
        put("r1", "b", 7, "live"),
    ]);

    let matcher = compaction_matcher(
        ScanSpec::new(),
        &RetentionConfig::new(),
        ScanKind::MinorCompaction,
        0,
    );
    let cells = scan(&[&store], matcher).unwrap();
    let expected: Vec<(Bytes, u64, CellType)> = vec![
        ("a".into(), 5, CellType::DeleteColumn),
        ("b".into(), 7, CellType::Put),
    ];
    assert_eq!(coords(&cells), expected);
}

/// On a store that keeps deleted cells, minor compaction rewrites markers
/// and deleted data alike.
#[test]
fn minor_compaction_on_keep_deleted_store_retains_deleted_data() {
    let store = store_of([
        delete_column("r1", "a", 5),
        put("r1", "a", 5, "deleted-but-kept"),
        put("r1", "a", 3, "older"),
    ]);

    let spec = ScanSpec::new().max_versions(2);
    let retention = RetentionConfig::new().max_versions(2).keep_deleted_cells(true);
    let matcher = compaction_matcher(spec, &retention, ScanKind::MinorCompaction, 0);
    let cells = scan(&[&store], matcher).unwrap();
    let expected: Vec<(Bytes, u64, CellType)> = vec![
        ("a".into(), 5, CellType::DeleteColumn),
        ("a".into(), 5, CellType::Put),
        ("a".into(), 3, CellType::Put),
    ];
    assert_eq!(coords(&cells), expected);
}

/// Major compaction on a keep-deleted store drops only the markers older
/// than every surviving put; the rest, data included, is version counted.
#[test]
fn major_compaction_drops_markers_behind_earliest_put() {
    let store = store_of([
        put("r1", "a", 5, "a5"),
        delete_column("r1", "a", 3),
        delete_column("r1", "b", 6),
        put("r1", "b", 2, "b2"),
    ]);

    let retention = RetentionConfig::new().keep_deleted_cells(true);
    let matcher = compaction_matcher(
        ScanSpec::new(),
        &retention,
        ScanKind::MajorCompaction,
        4,
    );
    let cells = scan(&[&store], matcher).unwrap();
    let expected: Vec<(Bytes, u64, CellType)> = vec![
        ("a".into(), 5, CellType::Put),
        ("b".into(), 6, CellType::DeleteColumn),
        ("b".into(), 2, CellType::Put),
    ];
    assert_eq!(coords(&cells), expected);
}

/// Major compaction on a default store applies markers and emits neither
/// them nor what they covered.
#[test]
fn major_compaction_applies_and_drops_markers() {
    let store = store_of([
        delete_column("r1", "a", 5),
        put("r1", "a", 4, "covered"),
        put("r1", "b", 9, "live"),
    ]);

    let matcher = compaction_matcher(
        ScanSpec::new(),
        &RetentionConfig::new(),
        ScanKind::MajorCompaction,
        0,
    );
    let cells = scan(&[&store], matcher).unwrap();
    assert_eq!(values(&cells), vec!["live"]);
}

/// Raw scans emit markers in place and never apply them.
#[test]
fn raw_scan_emits_markers_in_place() {
    let store = store_of([
        delete_column("r1", "q", 5),
        put("r1", "q", 5, "q5"),
        put("r1", "q", 4, "q4"),
    ]);

    let spec = ScanSpec::new().raw(true).max_versions(2);
    let retention = RetentionConfig::new().max_versions(2);
    let cells = scan(&[&store], user_matcher(spec, &retention)).unwrap();
    let expected: Vec<(Bytes, u64, CellType)> = vec![
        ("q".into(), 5, CellType::DeleteColumn),
        ("q".into(), 5, CellType::Put),
        ("q".into(), 4, CellType::Put),
    ];
    assert_eq!(coords(&cells), expected);
}

/// A user scan against a keep-deleted store can time travel to before a
/// delete by narrowing its time range.
#[test]
fn user_scan_time_travels_past_markers() {
    let store = store_of([
        delete_column("r1", "q", 5),
        put("r1", "q", 5, "masked"),
        put("r1", "q", 3, "old"),
    ]);
    let retention = RetentionConfig::new().keep_deleted_cells(true);

    // Present-day view: the marker applies.
    let now_view = scan(
        &[&store],
        user_matcher(ScanSpec::new(), &retention),
    )
    .unwrap();
    assert!(now_view.is_empty());

    // Narrow range ending before the marker: the old version comes back.
    let spec = ScanSpec::new().time_range(TimeRange::at(3.into()));
    let past_view = scan(&[&store], user_matcher(spec, &retention)).unwrap();
    assert_eq!(values(&past_view), vec!["old"]);
}
