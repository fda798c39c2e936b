use std::path::PathBuf;

/// Errors raised while exporting usage data
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The XML writer failed on its in-memory buffer
    #[error("XML rendering failed: {0}")]
    Render(#[from] std::io::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
