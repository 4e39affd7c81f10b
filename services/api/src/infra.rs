use jc_tracker::config::SourceConfig;
use jc_tracker::error::AppError;
use jc_tracker::workflows::quip::{
    DirectorySource, DocumentSource, ImportOutcome, InlineSource, LoadedPeriods, QuipImportError,
    QuipImporter, WeekSelection,
};
use jc_tracker::workflows::tracker::{PeriodKey, SnapshotRepository, SnapshotService};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared by every tracker handler: how to read documents and where
/// snapshots live for this process.
pub(crate) struct TrackerContext<R> {
    pub(crate) importer: QuipImporter,
    pub(crate) source: Arc<dyn DocumentSource>,
    pub(crate) periods: Vec<PeriodKey>,
    pub(crate) snapshots: SnapshotService<R>,
}

impl<R> TrackerContext<R>
where
    R: SnapshotRepository,
{
    pub(crate) fn from_config(config: &SourceConfig, repository: Arc<R>) -> Result<Self, AppError> {
        Ok(Self {
            importer: QuipImporter::from_config(config)?,
            source: Arc::new(DirectorySource::new(config.documents_dir.clone())),
            periods: config.period_keys(),
            snapshots: SnapshotService::new(repository),
        })
    }

    /// Inline documents take the place of the configured source; with no
    /// periods requested every available one is read. Quarters read from the
    /// configured source must be among the configured ones.
    pub(crate) fn load(&self, selection: &DocumentSelection) -> Result<LoadedPeriods, AppError> {
        match &selection.documents {
            Some(documents) => {
                let inline = InlineSource::new(documents.clone());
                let periods = if selection.periods.is_empty() {
                    inline.periods()
                } else {
                    selection.periods.clone()
                };
                Ok(LoadedPeriods::fetch(&inline, &periods))
            }
            None => {
                let unknown: Vec<PeriodKey> = selection
                    .periods
                    .iter()
                    .filter(|period| !self.periods.contains(period))
                    .cloned()
                    .collect();
                if !unknown.is_empty() {
                    return Err(QuipImportError::UnknownPeriods { periods: unknown }.into());
                }

                let periods = if selection.periods.is_empty() {
                    &self.periods
                } else {
                    &selection.periods
                };
                Ok(LoadedPeriods::fetch(self.source.as_ref(), periods))
            }
        }
    }

    pub(crate) fn import(&self, request: &ImportRequest) -> Result<ImportOutcome, AppError> {
        let loaded = self.load(&request.source)?;
        let outcome = self
            .importer
            .run(&loaded, &request.week_selection(), &request.owners)?;
        Ok(outcome)
    }
}

/// Quarters to read, optionally with their markup supplied inline.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DocumentSelection {
    #[serde(default)]
    pub(crate) periods: Vec<PeriodKey>,
    #[serde(default)]
    pub(crate) documents: Option<BTreeMap<PeriodKey, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ImportRequest {
    #[serde(flatten)]
    pub(crate) source: DocumentSelection,
    #[serde(default)]
    pub(crate) weeks: Vec<String>,
    #[serde(default)]
    pub(crate) all_weeks: bool,
    #[serde(default)]
    pub(crate) owners: Vec<String>,
}

impl ImportRequest {
    pub(crate) fn week_selection(&self) -> WeekSelection {
        WeekSelection::from_args(self.weeks.clone(), self.all_weeks)
    }
}
