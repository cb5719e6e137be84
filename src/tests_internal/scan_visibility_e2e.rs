use std::collections::BTreeMap;

use bytes::Bytes;

use crate::{
    cell::{Cell, CellType},
    matcher::CellMatcher,
    mvcc::{TimeRange, Timestamp},
    scan::{RetentionConfig, ScanKind, ScanSpec},
    test_util::{
        self, delete, delete_column, delete_family, put, scan, store_of, user_matcher, values,
    },
    store::MemStore,
};

/// Newest versions win per column, across stores, up to the version cap.
#[test]
fn newest_versions_win_per_column() {
    let left = store_of([
        put("r1", "a", 9, "a9"),
        put("r1", "a", 7, "a7"),
        put("r1", "b", 3, "b3"),
    ]);
    let right = store_of([put("r1", "a", 8, "a8"), put("r1", "b", 5, "b5")]);

    let spec = ScanSpec::new().max_versions(2);
    let retention = RetentionConfig::new().max_versions(2);
    let cells = scan(&[&left, &right], user_matcher(spec, &retention)).unwrap();
    assert_eq!(values(&cells), vec!["a9", "a8", "b5", "b3"]);
}

/// A version-scope tombstone hides exactly its timestamp and nothing else.
#[test]
fn version_tombstone_hides_exact_version() {
    let store = store_of([
        delete("r1", "q", 5),
        put("r1", "q", 5, "q5"),
        put("r1", "q", 4, "q4"),
        put("r1", "q", 3, "q3"),
    ]);

    let spec = ScanSpec::new().max_versions(3);
    let retention = RetentionConfig::new().max_versions(3);
    let cells = scan(&[&store], user_matcher(spec, &retention)).unwrap();
    assert_eq!(values(&cells), vec!["q4", "q3"]);
}

/// A column-scope tombstone hides everything at or below its timestamp but
/// leaves newer versions alone.
#[test]
fn column_tombstone_hides_all_older() {
    let store = store_of([
        put("r1", "q", 6, "q6"),
        delete_column("r1", "q", 5),
        put("r1", "q", 5, "q5"),
        put("r1", "q", 4, "q4"),
        put("r1", "q", 3, "q3"),
    ]);

    let spec = ScanSpec::new().max_versions(3);
    let retention = RetentionConfig::new().max_versions(3);
    let cells = scan(&[&store], user_matcher(spec, &retention)).unwrap();
    assert_eq!(values(&cells), vec!["q6"]);
}

/// A family-scope tombstone hides every column at or below its timestamp.
#[test]
fn family_tombstone_hides_every_column() {
    let store = store_of([
        delete_family("r1", 10),
        put("r1", "a", 5, "a5"),
        put("r1", "b", 9, "b9"),
        put("r1", "c", 11, "c11"),
    ]);

    let cells = scan(&[&store], user_matcher(ScanSpec::new(), &RetentionConfig::new())).unwrap();
    assert_eq!(values(&cells), vec!["c11"]);
}

/// Tombstone state is discarded at row boundaries.
#[test]
fn tombstones_do_not_cross_rows() {
    let store = store_of([
        delete_column("r1", "q", 9),
        put("r1", "q", 5, "hidden"),
        put("r2", "q", 5, "visible"),
    ]);

    let cells = scan(&[&store], user_matcher(ScanSpec::new(), &RetentionConfig::new())).unwrap();
    assert_eq!(values(&cells), vec!["visible"]);
}

/// Tombstones in one store mask data in another.
#[test]
fn tombstone_masks_across_stores() {
    let markers = store_of([delete_column("r1", "q", 9)]);
    let data = store_of([put("r1", "q", 5, "hidden"), put("r1", "x", 5, "kept")]);

    let cells = scan(
        &[&markers, &data],
        user_matcher(ScanSpec::new(), &RetentionConfig::new()),
    )
    .unwrap();
    assert_eq!(values(&cells), vec!["kept"]);
}

/// The time range caps both ends: newer cells are stepped over, older ones
/// end the column.
#[test]
fn time_range_limits_versions() {
    let store = store_of([
        put("r1", "q", 9, "too-new"),
        put("r1", "q", 6, "in-range"),
        put("r1", "q", 2, "too-old"),
    ]);

    let spec = ScanSpec::new()
        .max_versions(3)
        .time_range(TimeRange::new(4.into(), 8.into()).unwrap());
    let retention = RetentionConfig::new().max_versions(3);
    let cells = scan(&[&store], user_matcher(spec, &retention)).unwrap();
    assert_eq!(values(&cells), vec!["in-range"]);
}

/// An explicit column set returns only its targets, stepping over columns
/// between them.
#[test]
fn explicit_columns_only() {
    let store = store_of([
        put("r1", "a", 1, "a1"),
        put("r1", "b", 2, "b2"),
        put("r1", "c", 3, "c3"),
        put("r1", "d", 4, "d4"),
        put("r1", "e", 5, "e5"),
        put("r2", "b", 6, "r2b6"),
    ]);

    let spec = ScanSpec::new().columns(["b", "d"]);
    let cells = scan(&[&store], user_matcher(spec, &RetentionConfig::new())).unwrap();
    assert_eq!(values(&cells), vec!["b2", "d4", "r2b6"]);
}

/// Explicit targets obey the version cap independently.
#[test]
fn explicit_versions_capped_per_target() {
    let store = store_of([
        put("r1", "q", 9, "q9"),
        put("r1", "q", 8, "q8"),
        put("r1", "q", 7, "q7"),
    ]);

    let spec = ScanSpec::new().columns(["q"]).max_versions(2);
    let retention = RetentionConfig::new().max_versions(2);
    let cells = scan(&[&store], user_matcher(spec, &retention)).unwrap();
    assert_eq!(values(&cells), vec!["q9", "q8"]);
}

/// TTL expiry hides old versions on stores without a minimum version floor.
#[test]
fn ttl_hides_expired_versions() {
    let store = store_of([put("r1", "q", 950, "fresh"), put("r1", "q", 800, "stale")]);

    let spec = ScanSpec::new().max_versions(3);
    let retention = RetentionConfig::new().max_versions(3).ttl(100);
    let matcher = CellMatcher::new(
        spec,
        &retention,
        ScanKind::User,
        None,
        Timestamp::MAX,
        Timestamp::new(1_000),
    );
    let cells = scan(&[&store], matcher).unwrap();
    assert_eq!(values(&cells), vec!["fresh"]);
}

/// `min_versions` keeps a floor of versions alive past their TTL.
#[test]
fn min_versions_survive_ttl() {
    let store = store_of([put("r1", "q", 800, "expired-but-kept")]);

    let retention = RetentionConfig::new().min_versions(1).ttl(100);
    let matcher = CellMatcher::new(
        ScanSpec::new(),
        &retention,
        ScanKind::User,
        None,
        Timestamp::MAX,
        Timestamp::new(1_000),
    );
    let cells = scan(&[&store], matcher).unwrap();
    assert_eq!(values(&cells), vec!["expired-but-kept"]);
}

/// Randomized write order across two stores still scans to exactly the
/// newest version of every column.
#[test]
fn shuffled_multi_store_scan_matches_model() {
    let mut rng = fastrand::Rng::with_seed(7);
    let rows = ["r01", "r02", "r03", "r04", "r05"];
    let columns = ["a", "b", "c"];

    let mut cells = Vec::new();
    let mut model: BTreeMap<(Bytes, Bytes), (u64, String)> = BTreeMap::new();
    for row in rows {
        for column in columns {
            for version in 0..4u64 {
                let ts = rng.u64(1..100) * 10 + version;
                let value = format!("{row}/{column}/{ts}");
                cells.push(Cell::put(
                    row,
                    test_util::FAMILY,
                    column,
                    ts.into(),
                    value.clone(),
                ));
                let key = (
                    Bytes::from_static(row.as_bytes()),
                    Bytes::from_static(column.as_bytes()),
                );
                let slot = model.entry(key).or_insert((ts, value.clone()));
                if ts >= slot.0 {
                    *slot = (ts, value);
                }
            }
        }
    }
    rng.shuffle(&mut cells);

    let left = MemStore::new();
    let right = MemStore::new();
    for (index, cell) in cells.into_iter().enumerate() {
        if index % 2 == 0 {
            left.insert(cell);
        } else {
            right.insert(cell);
        }
    }

    let scanned = scan(
        &[&left, &right],
        user_matcher(ScanSpec::new(), &RetentionConfig::new()),
    )
    .unwrap();

    let expected: Vec<Bytes> = model
        .values()
        .map(|(_, value)| Bytes::from(value.clone().into_bytes()))
        .collect();
    assert_eq!(values(&scanned), expected);
    assert!(scanned.iter().all(|cell| cell.kind() == CellType::Put));
}
