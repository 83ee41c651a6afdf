use std::sync::Arc;

use cadence::element::Heartrate;
use cadence::{Clamping, FileStore, SeriesConfig, Store, TimeSeries, Timestamp};
use tempfile::tempdir;

fn secs(s: i64) -> Timestamp {
    Timestamp::from_secs(s)
}

#[test]
fn queries_after_the_cut_are_unchanged() {
    let dir = tempdir().expect("tempdir");
    let store: Arc<dyn Store> = Arc::new(FileStore::open(dir.path()).expect("store"));
    let mut series: TimeSeries<Heartrate> = TimeSeries::open(store.clone(), SeriesConfig::default());
    for i in 0..20 {
        series.insert(Heartrate::new(secs(i * 7), 60.0 + (i * i) as f64));
    }

    let probes: Vec<Timestamp> = (50..200).map(|s| Timestamp::from_millis(s * 1_000 + 250)).collect();
    let before: Vec<Heartrate> = probes.iter().map(|&t| series.value_at(t)).collect();

    let up_to = Timestamp::from_millis(50_250);
    let removed = series.archive(up_to);
    assert!(removed > 0);

    let after: Vec<Heartrate> = probes.iter().map(|&t| series.value_at(t)).collect();
    assert_eq!(before, after);

    let keys = series.archived_keys();
    assert_eq!(keys, vec![format!("heartrate-{}", up_to.as_millis())]);
    let archived = series.load_archive(&keys[0]).expect("archive");
    assert_eq!(archived.len(), removed + 1);
    assert_eq!(archived.last(), series.first());
}

#[test]
fn archive_then_reopen_keeps_the_tail() {
    let dir = tempdir().expect("tempdir");
    let store: Arc<dyn Store> = Arc::new(FileStore::open(dir.path()).expect("store"));
    let mut series: TimeSeries<Heartrate> = TimeSeries::open(store.clone(), SeriesConfig::default());
    for i in 0..10 {
        series.insert(Heartrate::new(secs(i), i as f64));
    }
    assert_eq!(series.archive(secs(4)), 4);
    assert_eq!(series.archive(secs(6)), 2);
    assert!(series.flush());

    let reopened: TimeSeries<Heartrate> = TimeSeries::open(store, SeriesConfig::default());
    assert_eq!(reopened.len(), 4);
    assert_eq!(reopened.first().map(|e| e.date), Some(secs(6)));
    assert_eq!(reopened.archived_keys(), vec!["heartrate-4000", "heartrate-6000"]);
}

#[test]
fn archive_past_the_end_keeps_the_trend() {
    let dir = tempdir().expect("tempdir");
    let store: Arc<dyn Store> = Arc::new(FileStore::open(dir.path()).expect("store"));
    let mut series: TimeSeries<Heartrate> = TimeSeries::open(store, SeriesConfig::default());
    for i in 0..5 {
        series.insert(Heartrate::new(secs(i * 10), 100.0 + (i * i) as f64));
    }

    let probes: Vec<Timestamp> = (30..120).step_by(5).map(secs).collect();
    let before: Vec<Heartrate> = probes
        .iter()
        .map(|&t| series.value_at_with(t, Clamping::Unclamped))
        .collect();

    assert_eq!(series.archive(secs(60)), 3);
    assert_eq!(series.len(), 2);

    let after: Vec<Heartrate> = probes
        .iter()
        .map(|&t| series.value_at_with(t, Clamping::Unclamped))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn two_element_series_is_not_archived() {
    let dir = tempdir().expect("tempdir");
    let store: Arc<dyn Store> = Arc::new(FileStore::open(dir.path()).expect("store"));
    let mut series: TimeSeries<Heartrate> = TimeSeries::open(store, SeriesConfig::default());
    series.insert(Heartrate::new(secs(0), 100.0));
    series.insert(Heartrate::new(secs(10), 120.0));

    assert_eq!(series.archive(secs(20)), 0);
    assert_eq!(series.value_at_with(secs(30), Clamping::Unclamped).bpm, 160.0);
    assert!(series.archived_keys().is_empty());
}
