//! # GymTrack Usage Export
//!
//! Reads the usage log joined with members and equipment and writes it out
//! as a single XML document with each member's age and age bracket.
//!
//! ## Modules
//!
//! - `age`: Age and bracket derivation
//! - `query`: The joined usage query
//! - `xml`: Document rendering
//! - `error`: Export error type

pub mod age;
pub mod error;
pub mod query;
pub mod xml;

use chrono::NaiveDate;
use error::ExportError;
use sqlx::PgPool;
use std::path::{Path, PathBuf};

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "full_usage_data.xml";

/// What an export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub entries: usize,
    pub bytes: usize,
}

/// Exports the full usage log to `output`, computing ages as of `today`
pub async fn run_export(
    pool: &PgPool,
    output: &Path,
    today: NaiveDate,
) -> Result<ExportSummary, ExportError> {
    let rows = query::fetch_usage_rows(pool).await?;
    tracing::debug!(rows = rows.len(), "Fetched usage rows");

    let document = xml::render_usage_xml(&rows, today)?;
    write_file(output, &document).await?;

    Ok(ExportSummary {
        entries: rows.len(),
        bytes: document.len(),
    })
}

fn staging_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    output.with_file_name(format!(".{}.partial", name))
}

/// Writes `contents` to a sibling staging file, then renames it into place
///
/// Either the complete document ends up at `output` or `output` is left as
/// it was.
pub async fn write_file(output: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let staging = staging_path(output);
    let write_error = |source| ExportError::Write {
        path: output.to_path_buf(),
        source,
    };

    if let Err(e) = tokio::fs::write(&staging, contents).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(write_error(e));
    }

    if let Err(e) = tokio::fs::rename(&staging, output).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(write_error(e));
    }

    Ok(())
}
