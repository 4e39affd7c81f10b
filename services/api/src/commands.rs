use clap::Args;
use jc_tracker::config::{AppConfig, SourceConfig};
use jc_tracker::error::AppError;
use jc_tracker::telemetry;
use jc_tracker::workflows::quip::{
    DirectorySource, ImportOutcome, LoadedPeriods, QuipImporter, WeekSelection,
};
use jc_tracker::workflows::tracker::{
    rank_specialists, records_csv_file_name, status_counts, write_records_csv, PeriodKey,
    ReportBook,
};
use serde_json::json;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub(crate) struct SelectionArgs {
    /// Quarter key to read, e.g. 2025_Q3 (repeatable; defaults to every configured quarter)
    #[arg(long = "period", value_name = "KEY")]
    pub(crate) periods: Vec<String>,
    /// Weekly table label, e.g. WK40 (repeatable; defaults to the latest week)
    #[arg(long = "week", value_name = "LABEL", conflicts_with = "all_weeks")]
    pub(crate) weeks: Vec<String>,
    /// Read every weekly table found in the selected quarters
    #[arg(long)]
    pub(crate) all_weeks: bool,
    /// Only keep tasks owned by this specialist (repeatable)
    #[arg(long = "owner", value_name = "NAME")]
    pub(crate) owners: Vec<String>,
    /// Directory holding `<period>.html` or `<period>.json` documents
    #[arg(long)]
    pub(crate) documents_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct TablesArgs {
    /// Quarter key to inspect (repeatable; defaults to every configured quarter)
    #[arg(long = "period", value_name = "KEY")]
    pub(crate) periods: Vec<String>,
    /// Directory holding `<period>.html` or `<period>.json` documents
    #[arg(long)]
    pub(crate) documents_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportArgs {
    #[command(flatten)]
    pub(crate) selection: SelectionArgs,
    /// Print the full report book as JSON
    #[arg(long)]
    pub(crate) json: bool,
    /// Also write every report table as CSV into this directory
    #[arg(long)]
    pub(crate) csv_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) selection: SelectionArgs,
    /// Output file (defaults to raw_data_<timestamp>.csv)
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

struct Session {
    source: SourceConfig,
    importer: QuipImporter,
    loaded: LoadedPeriods,
}

fn open_session(periods: &[String], documents_dir: Option<PathBuf>) -> Result<Session, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = documents_dir {
        config.source.documents_dir = dir;
    }
    telemetry::init(&config.telemetry)?;

    let importer = QuipImporter::from_config(&config.source)?;
    let periods: Vec<PeriodKey> = if periods.is_empty() {
        config.source.period_keys()
    } else {
        periods.iter().map(PeriodKey::new).collect()
    };
    let source = DirectorySource::new(config.source.documents_dir.clone());
    let loaded = LoadedPeriods::fetch(&source, &periods);

    Ok(Session {
        source: config.source,
        importer,
        loaded,
    })
}

fn import_selection(selection: SelectionArgs) -> Result<ImportOutcome, AppError> {
    let SelectionArgs {
        periods,
        weeks,
        all_weeks,
        owners,
        documents_dir,
    } = selection;

    let session = open_session(&periods, documents_dir)?;
    let outcome = session.importer.run(
        &session.loaded,
        &WeekSelection::from_args(weeks, all_weeks),
        &owners,
    )?;
    Ok(outcome)
}

pub(crate) fn run_tables(args: TablesArgs) -> Result<(), AppError> {
    let session = open_session(&args.periods, args.documents_dir)?;
    session.loaded.ensure_loaded()?;

    println!("Weekly tables");
    for period in session.importer.tables_by_period(&session.loaded) {
        let name = session
            .source
            .display_name(&period.period)
            .unwrap_or(period.period.as_str());
        if period.tables.is_empty() {
            println!("- {} ({}): no weekly tables", name, period.period);
        } else {
            println!("- {} ({}): {}", name, period.period, period.tables.join(", "));
        }
    }
    print_failures(&session.loaded);
    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        selection,
        json,
        csv_dir,
    } = args;

    let outcome = import_selection(selection)?;
    let book = ReportBook::build(&outcome.records, &outcome.weeks);

    if json {
        println!("{}", report_json(&outcome, &book)?);
    } else {
        render_report(&outcome);
    }

    if let Some(dir) = csv_dir {
        let written = write_book_tables(&book, &dir)?;
        eprintln!("Wrote {} report tables to {}", written, dir.display());
    }
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let outcome = import_selection(args.selection)?;
    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(records_csv_file_name(outcome.captured_at)));

    export_records(&outcome, &path)?;
    println!(
        "Wrote {} records from {} to {}",
        outcome.records.len(),
        outcome.weeks.join(", "),
        path.display()
    );
    Ok(())
}

fn report_json(outcome: &ImportOutcome, book: &ReportBook) -> Result<String, AppError> {
    let payload = json!({
        "weeks": outcome.weeks,
        "captured_at": outcome.captured_at,
        "total_records": outcome.records.len(),
        "dropped": outcome.dropped,
        "failures": outcome.failures,
        "book": book,
    });
    Ok(serde_json::to_string_pretty(&payload)?)
}

fn render_report(outcome: &ImportOutcome) {
    println!("JC tracker report");
    println!(
        "Weeks: {} | captured {}",
        outcome.weeks.join(", "),
        outcome.captured_at.format("%Y-%m-%d %H:%M")
    );
    println!(
        "Records: {} | dropped rows: {}",
        outcome.records.len(),
        outcome.dropped.total()
    );
    for failure in &outcome.failures {
        println!("Unavailable quarter {}: {}", failure.period, failure.message);
    }

    println!("\nStatus distribution");
    for entry in status_counts(&outcome.records) {
        println!("- {}: {}", entry.status, entry.count);
    }

    println!("\nPerformance rankings");
    for row in rank_specialists(&outcome.records) {
        println!(
            "{}. {}: {} tasks | {} completed | {} in progress | {} blocked | {:.1}% complete",
            row.rank,
            row.specialist,
            row.total_tasks,
            row.completed_bucket,
            row.in_progress,
            row.blocked,
            row.completion_rate
        );
    }
}

fn print_failures(loaded: &LoadedPeriods) {
    for failure in loaded.failures() {
        println!("Unavailable quarter {}: {}", failure.period, failure.message);
    }
}

fn export_records(outcome: &ImportOutcome, path: &Path) -> Result<(), AppError> {
    let file = File::create(path)?;
    write_records_csv(&outcome.records, BufWriter::new(file))?;
    Ok(())
}

fn write_book_tables(book: &ReportBook, dir: &Path) -> Result<usize, AppError> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;
    for sheet in &book.sheets {
        for (index, table) in sheet.tables.iter().enumerate() {
            let name = table_file_name(&sheet.name, index, &table.title);
            let file = File::create(dir.join(name))?;
            table.write_csv(BufWriter::new(file))?;
            written += 1;
        }
    }
    Ok(written)
}

/// The position within the sheet keeps names unique when titles slug alike.
fn table_file_name(sheet: &str, index: usize, title: &str) -> String {
    let slug = |text: &str| {
        text.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("_")
    };
    format!("{}__{:02}_{}.csv", slug(sheet), index + 1, slug(title))
}
