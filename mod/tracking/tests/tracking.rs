//! Integration tests for the tracking module: registration, scanning,
//! stock mutation and audit trails against an in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;

use casttrack_core::{ListParams, ServiceError};
use casttrack_sql::SqliteStore;
use tracking::{BatchOrder, Level, Operation, RegisterBatchInput, TrackingService, qr};

fn service() -> TrackingService {
    TrackingService::new(Box::new(SqliteStore::open_in_memory().unwrap())).unwrap()
}

fn gear_input(initial_stock: i64) -> RegisterBatchInput {
    RegisterBatchInput {
        product_name: "Gear".into(),
        company: "Acme".into(),
        level: Level::Raw,
        deadline: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        initial_stock,
    }
}

#[test]
fn register_then_get_roundtrip() {
    let svc = service();
    let batch = svc.register_batch(gear_input(50), Some("operator")).unwrap();

    let fetched = svc.get_batch(&batch.batch_id).unwrap();
    assert_eq!(fetched, batch);
    assert_eq!(fetched.stock_percent, 50);
    assert_eq!(fetched.status, "Pending");

    let parts: Vec<&str> = fetched.batch_id.split('-').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], "ACM");
    assert_eq!(parts[1], "GEA");
    assert_eq!(parts[2], chrono::Local::now().format("%y%m%d").to_string());
    assert_eq!(parts[3].len(), 4);
}

#[test]
fn register_validates_inputs() {
    let svc = service();

    let mut input = gear_input(50);
    input.product_name = String::new();
    assert!(matches!(
        svc.register_batch(input, None),
        Err(ServiceError::Validation(_))
    ));

    let mut input = gear_input(50);
    input.company = String::new();
    assert!(matches!(
        svc.register_batch(input, None),
        Err(ServiceError::Validation(_))
    ));

    assert!(matches!(
        svc.register_batch(gear_input(101), None),
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        svc.register_batch(gear_input(-1), None),
        Err(ServiceError::Validation(_))
    ));
}

#[test]
fn registration_appends_initial_audit_entry() {
    let svc = service();
    let batch = svc.register_batch(gear_input(40), Some("operator")).unwrap();

    let trail = svc.audit_for_batch(&batch.batch_id).unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].operation, Operation::InitialRegistration);
    assert_eq!(trail[0].previous_stock, 0);
    assert_eq!(trail[0].new_stock, 40);
    assert_eq!(trail[0].quantity_change, 40);
    assert_eq!(trail[0].actor.as_deref(), Some("operator"));
}

#[test]
fn unknown_batch_is_not_found() {
    let svc = service();
    assert!(matches!(
        svc.get_batch("ZZZ-ZZZ-000101-0000"),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        svc.apply_delta("ZZZ-ZZZ-000101-0000", 10, None),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn end_to_end_register_scan_update() {
    let svc = service();
    let batch = svc.register_batch(gear_input(50), Some("operator")).unwrap();

    // Label the batch, then recover the record from the label.
    let png = qr::encode(&batch.batch_id).unwrap();
    let scanned_id = qr::decode(&png).unwrap();
    assert_eq!(scanned_id, batch.batch_id);
    let scanned = svc.get_batch(&scanned_id).unwrap();
    assert_eq!(scanned.stock_percent, 50);

    let (updated, entry) = svc.apply_delta(&scanned_id, 20, Some("operator")).unwrap();
    assert_eq!(updated.stock_percent, 70);
    assert_eq!(entry.previous_stock, 50);
    assert_eq!(entry.new_stock, 70);
    assert_eq!(entry.quantity_change, 20);
    assert_eq!(entry.operation, Operation::StockUpdate);

    // 70 + 40 overflows the register: rejected, nothing changes.
    let err = svc.apply_delta(&scanned_id, 40, Some("operator")).unwrap_err();
    match err {
        ServiceError::OutOfRange { current, delta, result, .. } => {
            assert_eq!(current, 70);
            assert_eq!(delta, 40);
            assert_eq!(result, 110);
        }
        other => panic!("expected OutOfRange, got {:?}", other),
    }
    assert_eq!(svc.get_batch(&scanned_id).unwrap().stock_percent, 70);
    assert_eq!(svc.audit_for_batch(&scanned_id).unwrap().len(), 2);
}

#[test]
fn rejected_delta_is_idempotent() {
    let svc = service();
    let batch = svc.register_batch(gear_input(90), None).unwrap();

    for _ in 0..2 {
        assert!(matches!(
            svc.apply_delta(&batch.batch_id, 20, None),
            Err(ServiceError::OutOfRange { .. })
        ));
    }
    assert_eq!(svc.get_batch(&batch.batch_id).unwrap().stock_percent, 90);
    assert_eq!(svc.audit_for_batch(&batch.batch_id).unwrap().len(), 1);
}

#[test]
fn audit_chain_is_consistent() {
    let svc = service();
    let batch = svc.register_batch(gear_input(30), Some("a")).unwrap();
    svc.apply_delta(&batch.batch_id, 25, Some("a")).unwrap();
    svc.apply_delta(&batch.batch_id, -10, Some("b")).unwrap();
    svc.apply_delta(&batch.batch_id, 55, Some("a")).unwrap();

    // Newest first from the query; walk oldest to newest.
    let mut trail = svc.audit_for_batch(&batch.batch_id).unwrap();
    trail.reverse();

    assert_eq!(trail[0].operation, Operation::InitialRegistration);
    assert_eq!(trail[0].previous_stock, 0);
    for pair in trail.windows(2) {
        assert_eq!(pair[1].previous_stock, pair[0].new_stock);
        assert_eq!(
            pair[1].new_stock,
            pair[1].previous_stock + pair[1].quantity_change
        );
    }

    let current = svc.get_batch(&batch.batch_id).unwrap().stock_percent;
    assert_eq!(trail.last().unwrap().new_stock, current);

    let mutation_sum: i64 = trail
        .iter()
        .filter(|e| e.operation == Operation::StockUpdate)
        .map(|e| e.quantity_change)
        .sum();
    assert_eq!(mutation_sum, current - 30);
}

#[test]
fn concurrent_deltas_do_not_lose_updates() {
    let svc = Arc::new(service());
    let batch = svc.register_batch(gear_input(50), None).unwrap();
    let id = batch.batch_id.clone();

    std::thread::scope(|scope| {
        for delta in [10i64, 20] {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            scope.spawn(move || svc.apply_delta(&id, delta, Some("worker")).unwrap());
        }
    });

    assert_eq!(svc.get_batch(&id).unwrap().stock_percent, 80);

    let mut trail = svc.audit_for_batch(&id).unwrap();
    trail.reverse();
    assert_eq!(trail.len(), 3);
    // Whatever the interleaving, each update read the other's committed value.
    assert_eq!(trail[1].previous_stock, 50);
    assert_eq!(trail[2].previous_stock, trail[1].new_stock);
    assert_eq!(trail[2].new_stock, 80);
}

#[test]
fn audit_for_actor_filters_attribution() {
    let svc = service();
    let batch = svc.register_batch(gear_input(10), Some("alice")).unwrap();
    svc.apply_delta(&batch.batch_id, 5, Some("bob")).unwrap();
    svc.apply_delta(&batch.batch_id, 5, Some("alice")).unwrap();
    svc.apply_delta(&batch.batch_id, 5, None).unwrap();

    let alice = svc.audit_for_actor("alice").unwrap();
    assert_eq!(alice.len(), 2);
    assert!(alice.iter().all(|e| e.actor.as_deref() == Some("alice")));

    let bob = svc.audit_for_actor("bob").unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].quantity_change, 5);

    // Newest first.
    assert!(alice[0].log_id > alice[1].log_id);
}

#[test]
fn list_orders_by_deadline_and_recency() {
    let svc = service();
    let mut early = gear_input(10);
    early.product_name = "Axle".into();
    early.deadline = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let mut late = gear_input(10);
    late.product_name = "Wheel".into();
    late.deadline = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

    let early = svc.register_batch(early, None).unwrap();
    let late = svc.register_batch(late, None).unwrap();

    let by_deadline = svc
        .list_batches(BatchOrder::Deadline, &ListParams::default())
        .unwrap();
    assert_eq!(by_deadline.total, 2);
    assert_eq!(by_deadline.items[0].batch_id, early.batch_id);
    assert_eq!(by_deadline.items[1].batch_id, late.batch_id);

    let limited = svc
        .list_batches(BatchOrder::Deadline, &ListParams { limit: 1, offset: 0 })
        .unwrap();
    assert_eq!(limited.items.len(), 1);
    assert_eq!(limited.total, 2);

    let recent = svc
        .list_batches(BatchOrder::Recency, &ListParams::default())
        .unwrap();
    assert_eq!(recent.total, 2);
    assert_eq!(recent.items.len(), 2);
}

#[test]
fn csv_report_excludes_last_updated() {
    let svc = service();
    svc.register_batch(gear_input(50), None).unwrap();

    let csv = svc.batches_csv().unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("batch_id,product_name,company,level,deadline,stock_percent,status")
    );
    let row = lines.next().unwrap();
    assert!(row.contains("Gear"));
    assert!(row.contains("Acme"));
    assert!(row.contains("Raw"));
    assert!(row.contains(",50,"));
    assert!(!row.contains(':'), "timestamps must not leak into the report");
}

#[test]
fn opens_store_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = casttrack_core::StoreConfig {
        data_dir: Some(dir.path().to_path_buf()),
        sqlite_path: None,
    };
    let svc = TrackingService::open(&config).unwrap();
    let batch = svc.register_batch(gear_input(5), None).unwrap();
    assert_eq!(svc.get_batch(&batch.batch_id).unwrap().stock_percent, 5);
    assert!(dir.path().join("data.sqlite").exists());
}
