use std::sync::Arc;

use pagedview::{CollectionView, Identifiable, MemoryStore, Record, ViewOptions};

type View = CollectionView<Record, MemoryStore<Record>>;

fn people(n: usize) -> Arc<MemoryStore<Record>> {
    let store = Arc::new(MemoryStore::new());
    for i in 0..n {
        store.insert(Record::new("Person", format!("p{i}")));
    }
    store
}

fn persisted(store: &Arc<MemoryStore<Record>>) -> View {
    CollectionView::all(Arc::clone(store), "Person", ViewOptions::persisted()).unwrap()
}

fn ids(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.object_id().unwrap().to_string())
        .collect()
}

#[test]
fn test_transient_view_keeps_nothing() {
    let store = people(5);
    let view = CollectionView::all(Arc::clone(&store), "Person", ViewOptions::default()).unwrap();

    view.to_vec().unwrap();

    assert!(!view.is_persisted());
    assert_eq!(view.persisted_size(), None);
    assert!(view.cache_stats().is_none());
    assert!(view.populate().unwrap_err().is_not_supported());
}

#[test]
fn test_iterating_twice_is_idempotent() {
    let store = people(5);
    let view = persisted(&store);

    let first = view.to_vec().unwrap();
    assert_eq!(view.persisted_size(), Some(5));

    let second = view.to_vec().unwrap();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(view.persisted_size(), Some(5));

    // Not loaded, so both walks went to the store
    assert_eq!(store.fetch_calls(), 6);
}

#[test]
fn test_cache_shared_between_iterators() {
    let store = people(6);
    let view = persisted(&store);

    let mut a = view.iter().unwrap();
    let mut b = view.iter().unwrap();

    // Interleave the two cursors
    for _ in 0..3 {
        a.next_entity().unwrap();
        b.next_entity().unwrap();
    }
    assert_eq!(view.persisted_size(), Some(3));

    a.by_ref().for_each(drop);
    assert_eq!(view.persisted_size(), Some(6));

    b.by_ref().for_each(drop);
    assert_eq!(view.persisted_size(), Some(6));
}

#[test]
fn test_contains_uses_cache_as_well_as_remote() {
    let store = people(3);
    let view = persisted(&store);
    let transient =
        CollectionView::all(Arc::clone(&store), "Person", ViewOptions::default()).unwrap();

    view.to_vec().unwrap();

    // Deleted behind the view's back
    let p1 = Record::new("Person", "p1");
    let other = persisted(&store);
    assert!(other.remove(&p1).unwrap());

    // The cache still knows p1; the transient view only asks the store
    assert!(view.contains(&p1).unwrap());
    assert!(!transient.contains(&p1).unwrap());

    let stats = view.cache_stats().unwrap();
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_remove_evicts_from_cache() {
    let store = people(5);
    let view = persisted(&store);
    view.to_vec().unwrap();

    assert!(view.remove(&Record::new("Person", "p1")).unwrap());
    assert_eq!(view.persisted_size(), Some(4));
    assert_eq!(store.len(), 4);

    let batch = vec![Record::new("Person", "p2"), Record::new("Person", "p3")];
    assert!(view.remove_all(&batch).unwrap());
    assert_eq!(view.persisted_size(), Some(2));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_remove_reports_local_eviction() {
    let store = people(3);
    let view = persisted(&store);
    view.to_vec().unwrap();

    // Another client deletes p0 first; the view still evicts its copy
    let other = persisted(&store);
    other.remove(&Record::new("Person", "p0")).unwrap();

    assert!(view.remove(&Record::new("Person", "p0")).unwrap());
    assert_eq!(view.persisted_size(), Some(2));
    assert!(!view.remove(&Record::new("Person", "p0")).unwrap());
}

#[test]
fn test_populate_then_replay() {
    let store = people(5);
    let view = persisted(&store);
    assert!(!view.is_loaded());

    assert_eq!(view.populate().unwrap(), 5);
    assert!(view.is_loaded());
    assert_eq!(view.size(), 5);
    assert_eq!(view.persisted_size(), Some(5));

    let fetches = store.fetch_calls();
    let mut iter = view.iter().unwrap();
    assert!(iter.is_replay());

    let mut replayed = Vec::new();
    while iter.has_next() {
        replayed.push(iter.next_entity().unwrap());
    }
    assert!(iter.next_entity().unwrap_err().is_exhausted());

    assert_eq!(ids(&replayed), vec!["p0", "p1", "p2", "p3", "p4"]);
    assert_eq!(store.fetch_calls(), fetches);
    assert_eq!(view.statistics().replay_iterators(), 1);
}

#[test]
fn test_populate_empty_view() {
    let store = people(0);
    let view = persisted(&store);

    assert_eq!(view.populate().unwrap(), 0);
    assert!(view.is_loaded());

    let mut iter = view.iter().unwrap();
    assert!(iter.is_replay());
    assert!(!iter.has_next());
    assert!(iter.next().is_none());
}

#[test]
fn test_populate_failure_leaves_view_unloaded() {
    let store = people(5);
    let view = persisted(&store);

    store.fail_next(1);
    assert!(view.populate().unwrap_err().is_remote_failure());
    assert!(!view.is_loaded());

    // Falls back to ordinary remote iteration
    let iter = view.iter().unwrap();
    assert!(!iter.is_replay());
    assert_eq!(iter.count(), 5);
}

#[test]
fn test_invalidate_drops_loaded_state() {
    let store = people(4);
    let view = persisted(&store);
    view.populate().unwrap();

    store.insert(Record::new("Person", "p4"));
    // Loaded views replay the cache and do not see the new record
    assert_eq!(view.to_vec().unwrap().len(), 4);

    view.invalidate_state().unwrap();
    assert!(!view.is_loaded());
    assert_eq!(view.size(), 5);
    assert_eq!(view.persisted_size(), Some(0));

    let iter = view.iter().unwrap();
    assert!(!iter.is_replay());
    assert_eq!(iter.count(), 5);
}

#[test]
fn test_stale_iterator_does_not_refill_cache() {
    let store = people(5);
    let view = persisted(&store);

    let mut stale = view.iter().unwrap();
    stale.next_entity().unwrap();
    stale.next_entity().unwrap();
    assert_eq!(view.persisted_size(), Some(2));

    view.invalidate_state().unwrap();
    assert_eq!(view.persisted_size(), Some(0));

    // The old cursor keeps going on its own pages
    assert_eq!(stale.by_ref().count(), 3);
    assert_eq!(view.persisted_size(), Some(0));

    // A new cursor starts from the clean cache
    assert_eq!(view.iter().unwrap().count(), 5);
    assert_eq!(view.persisted_size(), Some(5));
}

#[test]
fn test_stale_iterator_does_not_correct_size() {
    let store = people(4);
    let view = persisted(&store);

    // Primed before the invalidation with two full pages
    let mut stale = view.iter().unwrap();

    store.insert(Record::new("Person", "p4"));
    view.invalidate_state().unwrap();
    assert_eq!(view.size(), 5);

    // Appears after the recount
    store.insert(Record::new("Person", "p5"));

    // The stale cursor finds the end at 6 but may not publish it
    assert_eq!(stale.by_ref().count(), 6);
    assert_eq!(view.size(), 5);

    // A fresh cursor may
    assert_eq!(view.iter().unwrap().count(), 6);
    assert_eq!(view.size(), 6);
}

#[test]
fn test_failed_repopulate_unloads_view() {
    let store = people(5);
    let view = persisted(&store);
    assert_eq!(view.populate().unwrap(), 5);
    assert!(view.is_loaded());

    store.fail_next(1);
    assert!(view.populate().unwrap_err().is_remote_failure());
    assert!(!view.is_loaded());

    // No replay of the emptied cache; the store is read again
    let fetches = store.fetch_calls();
    let records = view.to_vec().unwrap();
    assert_eq!(ids(&records), vec!["p0", "p1", "p2", "p3", "p4"]);
    assert!(store.fetch_calls() > fetches);

    assert_eq!(view.populate().unwrap(), 5);
    assert!(view.iter().unwrap().is_replay());
    assert_eq!(view.to_vec().unwrap().len(), 5);
}

#[test]
fn test_repopulate_loaded_view() {
    let store = people(4);
    let view = persisted(&store);
    view.populate().unwrap();

    store.insert(Record::new("Person", "p4"));
    store.insert(Record::new("Person", "p5"));

    assert_eq!(view.populate().unwrap(), 6);
    assert!(view.is_loaded());
    assert_eq!(view.size(), 6);
    assert_eq!(view.persisted_size(), Some(6));

    let fetches = store.fetch_calls();
    let iter = view.iter().unwrap();
    assert!(iter.is_replay());
    let replayed: Vec<Record> = iter.collect::<pagedview::Result<_>>().unwrap();
    assert_eq!(ids(&replayed), vec!["p0", "p1", "p2", "p3", "p4", "p5"]);
    assert_eq!(store.fetch_calls(), fetches);
}

#[test]
fn test_failed_advance_caches_only_yielded_records() {
    let store = people(5);
    let view = persisted(&store);
    let mut iter = view.iter().unwrap();

    store.fail_next(1);

    // Taking p1 tries to fetch the page at offset 4 and fails
    for expected in ["p0", "p1", "p2", "p3"] {
        assert_eq!(iter.next_entity().unwrap().object_id(), Some(expected));
    }
    assert!(iter.next_entity().unwrap_err().is_remote_failure());
    assert!(iter.next_entity().unwrap_err().is_exhausted());

    assert_eq!(view.persisted_size(), Some(4));
    assert!(!view.is_loaded());
    assert_eq!(view.size(), 5);

    // Later walks fill in the rest
    assert_eq!(view.to_vec().unwrap().len(), 5);
    assert_eq!(view.persisted_size(), Some(5));
}

#[test]
fn test_failed_priming_leaves_cache_untouched() {
    let store = people(5);
    let view = persisted(&store);

    store.fail_next(1);
    assert!(view.iter().unwrap_err().is_remote_failure());
    assert_eq!(view.persisted_size(), Some(0));
}
