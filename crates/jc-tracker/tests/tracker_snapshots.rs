use chrono::{DateTime, Local, TimeZone};
use jc_tracker::workflows::tracker::{
    group_by, rank_specialists, Clock, GroupKey, InMemorySnapshotRepository, PeriodKey,
    ReportBook, SnapshotService, SnapshotServiceError, StatusVocabulary, TaskRecord, TaskStatus,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Advances one minute per call so every capture gets its own id.
struct MinuteClock {
    minute: AtomicU32,
}

impl MinuteClock {
    fn starting_at(minute: u32) -> Self {
        Self {
            minute: AtomicU32::new(minute),
        }
    }
}

impl Clock for MinuteClock {
    fn now(&self) -> DateTime<Local> {
        let minute = self.minute.fetch_add(1, Ordering::SeqCst);
        Local
            .with_ymd_and_hms(2025, 10, 20, 16, minute, 0)
            .single()
            .expect("valid timestamp")
    }
}

fn record(owner: &str, station: &str, status: TaskStatus) -> TaskRecord {
    TaskRecord {
        period: PeriodKey::new("2025_Q4"),
        week: "WK43".to_string(),
        station: station.to_string(),
        status,
        delivery_window: "Cycle 1".to_string(),
        business_type: "Grocery".to_string(),
        chain: "North".to_string(),
        owner: owner.to_string(),
        category: "Launch".to_string(),
        task_type: "Launch".to_string(),
        captured_at: Local::now(),
    }
}

#[test]
fn single_specialist_scenario_end_to_end() {
    let monday = vec![
        record("Alice", "S1", TaskStatus::Complete),
        record("Alice", "S2", TaskStatus::Blocked),
    ];
    let friday = vec![
        record("Alice", "S1", TaskStatus::Complete),
        record("Alice", "S2", TaskStatus::Complete),
    ];

    let vocabulary = StatusVocabulary::from_records(&monday);
    let pivot = group_by(&monday, GroupKey::Owner, &vocabulary);
    let alice = pivot.row(&["Alice"]).expect("alice row");
    assert_eq!(alice.total, 2);
    assert_eq!(pivot.count(&["Alice"], &TaskStatus::Complete), Some(1));
    assert_eq!(pivot.count(&["Alice"], &TaskStatus::Blocked), Some(1));

    let rankings = rank_specialists(&monday);
    assert_eq!(rankings.len(), 1);
    assert_eq!(
        (
            rankings[0].rank,
            rankings[0].specialist.as_str(),
            rankings[0].total_tasks,
            rankings[0].completed_bucket,
            rankings[0].completion_rate
        ),
        (1, "Alice", 2, 1, 50.0)
    );

    let service = SnapshotService::with_clock(
        Arc::new(InMemorySnapshotRepository::default()),
        MinuteClock::starting_at(0),
    );
    let before = service
        .create(monday, Some("Monday".to_string()))
        .expect("monday snapshot");
    let after = service
        .create(friday, Some("Friday".to_string()))
        .expect("friday snapshot");

    let comparison = service.compare(&before, &after).expect("comparison");
    assert_eq!(comparison.total_tasks_diff, 0);
    let complete = comparison
        .status_change(&TaskStatus::Complete)
        .expect("complete present");
    assert_eq!((complete.before, complete.after, complete.diff), (1, 2, 1));
    let blocked = comparison
        .status_change(&TaskStatus::Blocked)
        .expect("blocked present");
    assert_eq!((blocked.before, blocked.after, blocked.diff), (1, 0, -1));
    assert_eq!(comparison.before.description.as_deref(), Some("Monday"));
    assert_eq!(comparison.after.description.as_deref(), Some("Friday"));
}

#[test]
fn comparison_covers_the_union_of_both_sides() {
    let service = SnapshotService::with_clock(
        Arc::new(InMemorySnapshotRepository::default()),
        MinuteClock::starting_at(10),
    );
    let before = service
        .create(
            vec![
                record("Alice", "S1", TaskStatus::Blocked),
                record("Omar", "S2", TaskStatus::Unknown("On Hold".to_string())),
            ],
            None,
        )
        .expect("before snapshot");
    let after = service
        .create(
            vec![
                record("Alice", "S1", TaskStatus::Published),
                record("Lena", "S3", TaskStatus::InProgress),
                record("Lena", "S4", TaskStatus::InProgress),
            ],
            None,
        )
        .expect("after snapshot");

    let comparison = service.compare(&before, &after).expect("comparison");
    assert_eq!(comparison.total_tasks_diff, 1);
    assert_eq!(comparison.status_changes.len(), 4);
    assert_eq!(comparison.owner_status_changes.len(), 3 * 4);
    assert_eq!(
        comparison
            .owner_status_change("Omar", &TaskStatus::Unknown("On Hold".to_string()))
            .map(|delta| delta.diff),
        Some(-1)
    );
    assert_eq!(comparison.completed.after, 1);

    let owners: Vec<_> = comparison.owners.iter().map(|o| o.owner.as_str()).collect();
    assert_eq!(owners, ["Alice", "Lena", "Omar"]);
    let lena = &comparison.owners[1];
    assert_eq!(lena.in_progress_or_blocked.after, 2);
    assert_eq!(lena.statuses.len(), 1);

    let current = comparison.current.row(&["Lena"]).expect("lena current row");
    assert_eq!(current.total, 2);
    assert!(comparison.current.row(&["Omar"]).is_none());

    let reversed = service.compare(&after, &before).expect("reverse comparison");
    assert_eq!(reversed.total_tasks_diff, -1);
}

#[test]
fn comparing_unknown_ids_is_unavailable() {
    let service = SnapshotService::new(Arc::new(InMemorySnapshotRepository::default()));
    let id = service
        .create(vec![record("Alice", "S1", TaskStatus::Merged)], None)
        .expect("snapshot");
    let missing = jc_tracker::workflows::tracker::SnapshotId("20000101_0000".to_string());

    match service.compare(&id, &missing) {
        Err(SnapshotServiceError::Unavailable(err)) => assert_eq!(err.missing, vec![missing]),
        other => panic!("expected unavailable comparison, got {other:?}"),
    }
}

#[test]
fn report_book_tables_keep_pivot_totals_consistent() {
    let records = vec![
        record("Alice", "S1", TaskStatus::Complete),
        record("Alice", "S2", TaskStatus::Blocked),
        record("Bob", "S3", TaskStatus::Merged),
        record("Bob", "S4", TaskStatus::Unknown("Deferred".to_string())),
        record("Bob", "S5", TaskStatus::InProgress),
    ];
    let book = ReportBook::build(&records, &["WK43".to_string()]);

    for sheet in &book.sheets {
        for table in &sheet.tables {
            assert!(
                table.rows.iter().all(|row| row.len() == table.columns.len()),
                "{} / {} rows match the header width",
                sheet.name,
                table.title
            );
        }
    }

    let overview = book.sheet("Status Overview").expect("overview");
    let by_specialist = overview
        .table("Status Summary by Specialist")
        .expect("specialist summary");
    assert_eq!(by_specialist.rows[0][0], "Bob");
    for row in &by_specialist.rows {
        let total: usize = row[1].parse().expect("numeric total");
        let statuses: usize = row[2..]
            .iter()
            .map(|cell| cell.parse::<usize>().expect("numeric count"))
            .sum();
        assert_eq!(total, statuses);
    }

    let rankings = &book.sheet("Performance Rankings").expect("rankings").tables[0];
    assert_eq!(rankings.rows[0][1], "Bob");
    assert_eq!(rankings.rows[0][9], "33.3");
}
