//! End-to-end scenarios for the data sources and their event streams.

use horizon_sections::source::diff::diff;
use horizon_sections::source::{
    AutoDiffConfig, AutoDiffSource, BatchDebug, ChangeBatch, ChangeEvent, DataSource,
    MutableSource, Position, Section, SectionMirror, SourceError,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn record<S: DataSource>(source: &S) -> Arc<Mutex<Vec<ChangeBatch>>> {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let recv = batches.clone();
    source.events().connect(move |batch| recv.lock().push(batch.clone()));
    batches
}

fn section(id: &'static str, items: Vec<i32>) -> Section<i32> {
    Section::new(items).with_supplementary("id", id)
}

fn same_id(a: &Section<i32>, b: &Section<i32>) -> bool {
    a.supplementary_as::<&str>("id") == b.supplementary_as::<&str>("id")
}

#[test]
fn insert_into_five_items() {
    let source = MutableSource::new(vec!['a', 'b', 'c', 'd', 'e']);
    let batches = record(&source);

    source.insert(vec!['x'], 2).unwrap();

    assert_eq!(source.item_count(0).unwrap(), 6);
    let batches = batches.lock();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].events(),
        &[ChangeEvent::InsertItems(vec![Position::new(0, 2)])]
    );
}

#[test]
fn delete_out_of_range_is_rejected() {
    let source = MutableSource::new(vec![1, 2, 3]);
    let batches = record(&source);

    let result = source.delete(10..12);

    assert!(matches!(result, Err(SourceError::RangeOutOfRange { .. })));
    assert_eq!(source.item_count(0).unwrap(), 3);
    assert!(batches.lock().is_empty());
}

#[test]
fn swapped_sections_yield_one_move() {
    let source = AutoDiffSource::new(
        vec![section("1", vec![1, 2, 3]), section("2", vec![4, 5])],
        AutoDiffConfig::with_item_equality(same_id).with_item_moves(true),
    );
    let batches = record(&source);

    source.set_sections(vec![section("2", vec![4, 5]), section("1", vec![1, 2, 3])]);

    let batches = batches.lock();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.move_count(), 1);
    assert!(batch.iter().all(ChangeEvent::is_section_level));
}

#[test]
fn swapped_sections_without_moves_delete_and_insert() {
    let source = AutoDiffSource::new(
        vec![section("1", vec![1, 2, 3]), section("2", vec![4, 5])],
        AutoDiffConfig::with_item_equality(same_id),
    );

    let batch = source.set_sections(vec![section("2", vec![4, 5]), section("1", vec![1, 2, 3])]);

    assert_eq!(batch.move_count(), 0);
    assert_eq!(batch.delete_count(), 1);
    assert_eq!(batch.insert_count(), 1);
}

#[test]
fn move_toggle_on_swap() {
    let old = ["a", "b", "c", "d", "e"];
    let new = ["d", "b", "c", "a", "e"];

    let with_moves = diff(&old, &new, |a, b| a == b, true);
    assert_eq!(with_moves.moves().len(), 2);
    assert!(with_moves.inserts().is_empty());
    assert!(with_moves.deletes().is_empty());

    let without_moves = diff(&old, &new, |a, b| a == b, false);
    assert!(without_moves.moves().is_empty());
    assert_eq!(without_moves.deletes().len(), 2);
    assert_eq!(without_moves.inserts().len(), 2);
}

#[test]
fn mirror_tracks_a_sequence_of_replacements() {
    let source = Arc::new(AutoDiffSource::new(
        vec![section("a", vec![1, 2, 3])],
        AutoDiffConfig::with_item_equality(same_id).with_item_moves(true),
    ));
    let mirror = Arc::new(Mutex::new(SectionMirror::from_source(&*source).unwrap()));

    let (mirror_clone, source_clone) = (mirror.clone(), source.clone());
    source.events().connect(move |batch| {
        mirror_clone.lock().apply(batch, &*source_clone).unwrap();
    });

    let steps = vec![
        vec![section("a", vec![3, 1, 2]), section("b", vec![7])],
        vec![section("b", vec![7, 8]), section("a", vec![2, 3])],
        vec![section("c", vec![]), section("b", vec![8, 7]), section("a", vec![2, 2, 3])],
        vec![],
        vec![section("a", vec![1])],
    ];
    for sections in steps {
        let expected: Vec<Vec<i32>> = sections.iter().map(|s| s.items().to_vec()).collect();
        source.set_sections(sections);
        assert_eq!(mirror.lock().sections(), expected.as_slice());
    }
}

#[test]
fn subscriber_added_during_delivery_misses_in_flight_batch() {
    let source = Arc::new(MutableSource::new(vec![0]));
    let late = Arc::new(Mutex::new(Vec::new()));

    let (source_clone, late_clone) = (source.clone(), late.clone());
    let registered = Arc::new(Mutex::new(false));
    source.events().connect(move |_| {
        let mut registered = registered.lock();
        if !*registered {
            *registered = true;
            let late_inner = late_clone.clone();
            source_clone
                .events()
                .connect(move |batch| late_inner.lock().push(batch.clone()));
        }
    });

    source.push(1);
    assert!(late.lock().is_empty());

    source.push(2);
    assert_eq!(late.lock().len(), 1);
}

#[test]
fn disposed_subscription_stops_delivery() {
    let source = MutableSource::new(vec![0]);
    let count = Arc::new(Mutex::new(0));

    let count_clone = count.clone();
    let subscription = source.events().subscribe(move |_| *count_clone.lock() += 1);

    source.push(1);
    assert!(subscription.dispose());
    assert!(!subscription.dispose());
    source.push(2);

    assert_eq!(*count.lock(), 1);
    assert!(!subscription.is_active());
}

#[test]
fn batch_listing_is_readable() {
    let source = AutoDiffSource::new(
        vec![section("a", vec![1, 2])],
        AutoDiffConfig::with_item_equality(same_id),
    );
    let batch = source.set_sections(vec![section("a", vec![2, 3])]);

    assert_eq!(
        BatchDebug::new().format(&batch),
        "ChangeBatch (2 events):\n  delete items [0, 0]\n  insert items [0, 1]\n"
    );
}

#[test]
fn publishes_under_a_subscriber() {
    use tracing_subscriber::EnvFilter;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("horizon_sections=trace,horizon_sections_core=trace"))
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let source = MutableSource::new(vec![1]);
        source.push(2);
        source.move_item(0, 1).unwrap();
        assert_eq!(*source.items(), vec![2, 1]);
    });
}
