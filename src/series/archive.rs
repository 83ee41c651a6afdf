use crate::core::Timestamp;
use crate::element::TimeSeriesElement;
use crate::storage::Store;

/// Index of the first element to keep when archiving everything older than
/// `up_to`.
///
/// The retained tail still answers any point query at or after `up_to`
/// exactly as the full series would: an element dated exactly `up_to` is
/// kept, otherwise the closest element before `up_to` is kept so the
/// interpolation across `up_to` keeps its left anchor. At least two elements
/// stay behind whenever the series had two, so unclamped queries past the
/// end keep extending the same trend.
pub fn cut_index<E: TimeSeriesElement>(elements: &[E], up_to: Timestamp) -> usize {
    let first_not_older = elements.partition_point(|e| e.date() < up_to);
    let cut = match elements.get(first_not_older) {
        Some(e) if e.date() == up_to => first_not_older,
        _ => first_not_older.saturating_sub(1),
    };
    cut.min(elements.len().saturating_sub(2))
}

/// Snapshot key `<key>-<up_to ms>`, suffixed `-1`, `-2`, … if already taken.
///
/// `None` when the store cannot tell whether a key is taken.
pub fn snapshot_key(store: &dyn Store, key: &str, up_to: Timestamp) -> Option<String> {
    let base = format!("{key}-{}", up_to.as_millis());
    let mut candidate = base.clone();
    let mut n = 0u32;
    loop {
        match store.contains(&candidate) {
            Ok(false) => return Some(candidate),
            Ok(true) => {
                n += 1;
                candidate = format!("{base}-{n}");
            }
            Err(err) => {
                log::warn!("failed to look up `{candidate}`: {err:#}");
                return None;
            }
        }
    }
}

/// Whether `candidate` names a snapshot written for series `key`.
pub fn is_snapshot_of(key: &str, candidate: &str) -> bool {
    let rest = match candidate
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('-'))
    {
        Some(rest) => rest,
        None => return false,
    };
    let mut parts = rest.split('-');
    let stamp_ok = parts
        .next()
        .map_or(false, |p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    let suffix_ok = match parts.next() {
        None => true,
        Some(n) => !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) && parts.next().is_none(),
    };
    stamp_ok && suffix_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Heartrate;
    use crate::storage::MemoryStore;
    use anyhow::anyhow;

    struct UnreadableStore;

    impl Store for UnreadableStore {
        fn read(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Err(anyhow!("cannot read `{key}`"))
        }

        fn write(&self, _key: &str, _bytes: &[u8]) -> anyhow::Result<()> {
            Ok(())
        }

        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }

        fn contains(&self, key: &str) -> anyhow::Result<bool> {
            Err(anyhow!("cannot stat `{key}`"))
        }

        fn keys(&self) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn series(secs: &[i64]) -> Vec<Heartrate> {
        secs.iter()
            .map(|s| Heartrate::new(Timestamp::from_secs(*s), *s as f64))
            .collect()
    }

    #[test]
    fn cut_keeps_left_anchor() {
        let elements = series(&[0, 10, 20, 30]);
        assert_eq!(cut_index(&elements, Timestamp::from_secs(15)), 1);
        assert_eq!(cut_index(&elements, Timestamp::from_secs(20)), 2);
        assert_eq!(cut_index(&elements, Timestamp::from_secs(-5)), 0);
        assert_eq!(cut_index(&elements, Timestamp::from_secs(0)), 0);
        assert_eq!(cut_index::<Heartrate>(&[], Timestamp::from_secs(99)), 0);
    }

    #[test]
    fn cut_past_the_end_keeps_two_anchors() {
        let elements = series(&[0, 10, 20, 30]);
        assert_eq!(cut_index(&elements, Timestamp::from_secs(30)), 2);
        assert_eq!(cut_index(&elements, Timestamp::from_secs(99)), 2);
        assert_eq!(cut_index(&series(&[0, 10]), Timestamp::from_secs(20)), 0);
        assert_eq!(cut_index(&series(&[0]), Timestamp::from_secs(20)), 0);
    }

    #[test]
    fn snapshot_keys_are_unique() {
        let store = MemoryStore::new();
        let up_to = Timestamp::from_millis(1_500);
        let first = snapshot_key(&store, "heartrate", up_to);
        assert_eq!(first.as_deref(), Some("heartrate-1500"));
        store.write("heartrate-1500", b"x").expect("write");
        assert_eq!(
            snapshot_key(&store, "heartrate", up_to).as_deref(),
            Some("heartrate-1500-1")
        );
        store.write("heartrate-1500-1", b"x").expect("write");
        assert_eq!(
            snapshot_key(&store, "heartrate", up_to).as_deref(),
            Some("heartrate-1500-2")
        );
    }

    #[test]
    fn unreadable_store_yields_no_snapshot_key() {
        assert_eq!(snapshot_key(&UnreadableStore, "heartrate", Timestamp::from_secs(1)), None);
    }

    #[test]
    fn snapshot_names_match_their_series() {
        assert!(is_snapshot_of("heartrate", "heartrate-1500"));
        assert!(is_snapshot_of("heartrate", "heartrate-1500-2"));
        assert!(!is_snapshot_of("heartrate", "heartrate"));
        assert!(!is_snapshot_of("heart", "heartrate-1500"));
        assert!(!is_snapshot_of("heartrate", "heartrate-abc"));
        assert!(!is_snapshot_of("heartrate", "heartrate-1-2-3"));
    }
}
