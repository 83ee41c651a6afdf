use std::sync::Arc;

use cadence::element::{Heartrate, Pedometer};
use cadence::{Clamping, MemoryStore, SeriesConfig, TimeSeries, TimeSeriesElement, Timestamp};

fn secs(s: i64) -> Timestamp {
    Timestamp::from_secs(s)
}

fn heartrate_series(samples: &[(i64, f64)]) -> TimeSeries<Heartrate> {
    let mut series = TimeSeries::open(Arc::new(MemoryStore::new()), SeriesConfig::default());
    for &(s, bpm) in samples {
        series.insert(Heartrate::new(secs(s), bpm));
    }
    series
}

#[test]
fn arbitrary_insertion_order_stays_sorted() {
    let mut series = heartrate_series(&[]);
    for s in [40, 10, 30, 0, 20, 10, 40, 5] {
        series.insert(Heartrate::new(secs(s), s as f64));
    }
    let dates: Vec<Timestamp> = series.elements().iter().map(|e| e.date()).collect();
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(dates.len(), 6);
}

#[test]
fn point_query_returns_stored_element_exactly() {
    let series = heartrate_series(&[(0, 0.1), (3, 0.7), (9, 1.3)]);
    for element in series.elements() {
        assert_eq!(&series.value_at(element.date), element);
    }
}

#[test]
fn midpoint_is_the_mean() {
    let series = heartrate_series(&[(0, 100.0), (10, 150.0)]);
    assert_eq!(series.value_at(secs(5)).bpm, 125.0);

    let mut pedometer: TimeSeries<Pedometer> =
        TimeSeries::open(Arc::new(MemoryStore::new()), SeriesConfig::default());
    pedometer.insert(Pedometer::new(secs(0), 0.0, 0).with_pace(0.3, 2.0));
    pedometer.insert(Pedometer::new(secs(10), 30.0, 20).with_pace(0.5, 3.0));
    let mid = pedometer.value_at(secs(5));
    assert_eq!(mid.distance_m(), 15.0);
    assert_eq!(mid.number_of_steps(), 10);
    assert!((mid.average_active_pace().expect("pace") - 0.4).abs() < 1e-12);
    assert!((mid.current_cadence().expect("cadence") - 2.5).abs() < 1e-12);
}

#[test]
fn missing_optional_on_either_side_stays_missing() {
    let mut pedometer: TimeSeries<Pedometer> =
        TimeSeries::open(Arc::new(MemoryStore::new()), SeriesConfig::default());
    pedometer.insert(Pedometer::new(secs(0), 0.0, 0).with_floors(1));
    pedometer.insert(Pedometer::new(secs(10), 30.0, 20));
    assert_eq!(pedometer.value_at(secs(5)).floors_ascended(), None);
}

#[test]
fn extrapolation_is_continuous_at_the_ends() {
    let series = heartrate_series(&[(0, 100.0), (10, 120.0)]);
    let last = series.last().expect("last").clone();
    let first = series.first().expect("first").clone();

    let just_after = series.value_at(Timestamp::from_millis(10_001));
    assert_eq!(just_after.bpm, last.bpm);
    let just_before = series.value_at(Timestamp::from_millis(-1));
    assert_eq!(just_before.bpm, first.bpm);

    let trend = series.value_at_with(Timestamp::from_millis(10_001), Clamping::Unclamped);
    assert!((trend.bpm - last.bpm).abs() < 0.01);
}

#[test]
fn range_holds_only_stored_elements() {
    let series = heartrate_series(&[(0, 1.0), (10, 2.0), (20, 3.0)]);
    let inside = series.range(secs(5)..secs(20));
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].date, secs(10));
    assert_eq!(series.range(secs(-100)..secs(100)).len(), 3);
}

#[test]
#[should_panic]
fn empty_series_point_query_panics() {
    let series = heartrate_series(&[]);
    let _ = series.value_at(secs(0));
}
