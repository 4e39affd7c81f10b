pub mod domain;
pub mod export;
pub mod report;
pub mod snapshots;

pub use domain::{owners, retain_owners, PeriodKey, TaskRecord, TaskStatus};
pub use export::{records_csv_file_name, write_records_csv, RECORD_COLUMNS};
pub use report::{
    completion_rate, group_by, rank_specialists, status_counts, status_distribution,
    AggregateRow, AggregateView, GroupKey, NamedTable, RankingRow, ReportBook, ReportSheet,
    StatusCount, StatusVocabulary,
};
pub use snapshots::{
    Clock, ComparisonUnavailable, CountDelta, InMemorySnapshotRepository, Snapshot,
    SnapshotComparison, SnapshotError, SnapshotId, SnapshotMetrics, SnapshotRepository,
    SnapshotService, SnapshotServiceError, SystemClock,
};
