//! Integration tests for the sequencer's lifecycle rules and ledger persistence.

use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use refinery::store::transforms_path;
use refinery::{
    DeleteMode, EngineConfig, MemoryStore, NewTransformation, RefineryError, Sequencer,
    Transformation, TransformationStatus, TransformationStore, TransformationUpdate,
};

fn sequencer() -> Sequencer {
    Sequencer::in_memory(EngineConfig::default())
}

fn create(seq: &Sequencer, column: &str, expression: &str) -> Transformation {
    seq.create(NewTransformation::new("people", column, expression))
        .expect("create failed")
}

fn sequences(seq: &Sequencer, column: &str) -> Vec<(String, u32)> {
    seq.chain("people", column)
        .unwrap()
        .into_iter()
        .map(|t| (t.expression, t.sequence_number))
        .collect()
}

// =============================================================================
// Duplicate Invariant
// =============================================================================

#[test]
fn test_duplicate_uppercase_rejected_and_count_unchanged() {
    let seq = sequencer();
    create(&seq, "name", "UPPERCASE(name)");
    create(&seq, "name", "TRIM(name)");

    let err = seq
        .create(NewTransformation::new("people", "name", "UPPERCASE(name)"))
        .unwrap_err();
    match err {
        RefineryError::DuplicateFunctionOnColumn { column, function } => {
            assert_eq!(column, "name");
            assert_eq!(function, "UPPERCASE");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(seq.chain("people", "name").unwrap().len(), 2);
}

#[test]
fn test_same_function_on_other_column_allowed() {
    let seq = sequencer();
    create(&seq, "name", "UPPERCASE(name)");
    let city = create(&seq, "city", "UPPERCASE(city)");
    assert_eq!(city.sequence_number, 1);
}

#[test]
fn test_deleted_sibling_does_not_block() {
    let seq = sequencer();
    let first = create(&seq, "name", "UPPERCASE(name)");
    seq.delete(&first.id, DeleteMode::Soft).unwrap();
    let second = create(&seq, "name", "UPPERCASE(name)");
    assert_eq!(second.sequence_number, 1);
}

#[test]
fn test_concurrent_duplicate_creates_admit_one() {
    let seq = Arc::new(sequencer());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                seq.create(NewTransformation::new("people", "name", "TRIM(name)"))
                    .is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(seq.chain("people", "name").unwrap().len(), 1);
}

// =============================================================================
// Reorder
// =============================================================================

#[test]
fn test_reorder_renumbers_in_caller_order() {
    let seq = sequencer();
    let a = create(&seq, "name", "TRIM(name)");
    let b = create(&seq, "name", "UPPERCASE(name)");
    let c = create(&seq, "name", "LEFT(name, 3)");

    // Leave a gap so renumbering is observable.
    seq.delete(&b.id, DeleteMode::Soft).unwrap();
    let d = create(&seq, "name", "REVERSE(name)");
    assert_eq!(d.sequence_number, 4);

    let order = vec![d.id.clone(), a.id.clone(), c.id.clone()];
    let reordered = seq.reorder("people", "name", &order).unwrap();
    let ids: Vec<&str> = reordered.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![d.id.as_str(), a.id.as_str(), c.id.as_str()]);

    assert_eq!(
        sequences(&seq, "name"),
        vec![
            ("REVERSE(name)".to_string(), 1),
            ("TRIM(name)".to_string(), 2),
            ("LEFT(name, 3)".to_string(), 3),
        ]
    );
}

#[test]
fn test_reorder_incomplete_set_rejected() {
    let seq = sequencer();
    let a = create(&seq, "name", "TRIM(name)");
    let b = create(&seq, "name", "UPPERCASE(name)");

    let missing = seq.reorder("people", "name", &[a.id.clone()]);
    assert!(matches!(
        missing,
        Err(RefineryError::IncompleteReorderSet { expected: 2, received: 1, .. })
    ));

    let duplicated = seq.reorder("people", "name", &[a.id.clone(), a.id.clone()]);
    assert!(matches!(duplicated, Err(RefineryError::IncompleteReorderSet { .. })));

    let unknown = seq.reorder("people", "name", &[a.id.clone(), "tf_nope".to_string()]);
    assert!(matches!(unknown, Err(RefineryError::IncompleteReorderSet { .. })));

    // Nothing changed.
    assert_eq!(seq.store().get(&b.id).unwrap().unwrap().sequence_number, 2);
}

// =============================================================================
// Update / Delete
// =============================================================================

#[test]
fn test_update_status_and_sequence() {
    let seq = sequencer();
    let t = create(&seq, "name", "TRIM(name)");

    let applied = seq
        .update(&t.id, TransformationUpdate::new().with_status(TransformationStatus::Applied))
        .unwrap();
    assert_eq!(applied.status, TransformationStatus::Applied);
    assert!(applied.updated_at.is_some());

    let moved = seq.update(&t.id, TransformationUpdate::new().with_sequence(7)).unwrap();
    assert_eq!(moved.sequence_number, 7);
}

#[test]
fn test_update_rejects_sequence_taken_by_sibling() {
    let seq = sequencer();
    create(&seq, "name", "TRIM(name)");
    let b = create(&seq, "name", "UPPERCASE(name)");

    let result = seq.update(&b.id, TransformationUpdate::new().with_sequence(1));
    assert!(matches!(result, Err(RefineryError::InvalidUpdate(_))));
    assert_eq!(
        sequences(&seq, "name"),
        vec![("TRIM(name)".to_string(), 1), ("UPPERCASE(name)".to_string(), 2)]
    );

    // A draft may sit on a live number; activating it there is refused.
    let draft = seq
        .create(
            NewTransformation::new("people", "name", "REVERSE(name)")
                .with_status(TransformationStatus::Draft),
        )
        .unwrap();
    let parked = seq.update(&draft.id, TransformationUpdate::new().with_sequence(1)).unwrap();
    assert_eq!(parked.sequence_number, 1);
    let activate = TransformationUpdate::new()
        .with_status(TransformationStatus::Active)
        .with_sequence(2);
    assert!(matches!(
        seq.update(&draft.id, activate),
        Err(RefineryError::InvalidUpdate(_))
    ));
}

#[test]
fn test_unknown_ids_are_not_found() {
    let seq = sequencer();
    assert!(matches!(
        seq.update("tf_missing", TransformationUpdate::new().with_sequence(1)),
        Err(RefineryError::NotFound(_))
    ));
    assert!(matches!(
        seq.delete("tf_missing", DeleteMode::Soft),
        Err(RefineryError::NotFound(_))
    ));
}

#[test]
fn test_delete_does_not_renumber() {
    let seq = sequencer();
    create(&seq, "name", "TRIM(name)");
    let middle = create(&seq, "name", "UPPERCASE(name)");
    create(&seq, "name", "REVERSE(name)");

    seq.delete(&middle.id, DeleteMode::Hard).unwrap();
    let numbers: Vec<u32> = sequences(&seq, "name").into_iter().map(|(_, n)| n).collect();
    assert_eq!(numbers, vec![1, 3]);
}

// =============================================================================
// Cleanup
// =============================================================================

fn seeded_duplicates() -> Sequencer {
    let records = vec![
        Transformation::new("people", "name", "TRIM(name)", 5),
        Transformation::new("people", "name", "TRIM(name)", 2),
        Transformation::new("people", "name", "UPPERCASE(name)", 3),
        Transformation::new("people", "city", "TRIM(city)", 1),
        Transformation::new("people", "name", "TRIM(name)", 9).with_status(TransformationStatus::Draft),
    ];
    Sequencer::new(MemoryStore::from_records(records), EngineConfig::default())
}

#[test]
fn test_cleanup_keeps_lowest_sequence() {
    let seq = seeded_duplicates();
    assert_eq!(seq.cleanup("people").unwrap(), 1);

    let trims: Vec<u32> = seq
        .chain("people", "name")
        .unwrap()
        .into_iter()
        .filter(|t| t.function_name().as_deref() == Some("TRIM"))
        .map(|t| t.sequence_number)
        .collect();
    assert_eq!(trims, vec![2]);
    assert_eq!(seq.chain("people", "city").unwrap().len(), 1);
    // Drafts are not part of the chain and are left alone.
    assert_eq!(seq.list("people").unwrap().len(), 4);
}

#[test]
fn test_cleanup_is_idempotent() {
    let seq = seeded_duplicates();
    seq.cleanup("people").unwrap();
    let after_first = seq.list("people").unwrap();
    assert_eq!(seq.cleanup("people").unwrap(), 0);
    assert_eq!(seq.list("people").unwrap(), after_first);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_ledger_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = transforms_path(dir.path().join("people.csv"));

    let seq = sequencer();
    create(&seq, "name", "TRIM(name)");
    create(&seq, "name", "UPPERCASE(name)");
    seq.store().save_with_history(&path).unwrap();

    let restored = Sequencer::new(MemoryStore::load(&path).unwrap(), EngineConfig::default());
    assert_eq!(restored.list("people").unwrap(), seq.list("people").unwrap());

    // The duplicate rule still holds after reload.
    assert!(restored
        .create(NewTransformation::new("people", "name", "TRIM(name)"))
        .is_err());
}
