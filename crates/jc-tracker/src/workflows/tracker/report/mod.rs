mod aggregate;
mod book;
mod ranking;
mod vocabulary;

pub use aggregate::{
    completion_rate, group_by, status_counts, status_distribution, AggregateRow, AggregateView,
    GroupKey, StatusCount, TOTAL_LABEL,
};
pub use book::{NamedTable, ReportBook, ReportSheet, TotalPlacement};
pub use ranking::{rank_specialists, RankingRow, RANKING_COLUMNS};
pub use vocabulary::StatusVocabulary;
