use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

use nutritrack_core::period::{ExportDocument, write_daily_csv};
use nutritrack_core::service::{ExportSink, Tracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExportFormat {
    Json,
    Csv,
}

/// Writes the export document to a file, or to stdout when no path is given.
pub(crate) struct ExportWriter {
    pub format: ExportFormat,
    pub path: Option<PathBuf>,
}

impl ExportWriter {
    fn write_to(&self, document: &ExportDocument, mut out: impl Write) -> Result<()> {
        match self.format {
            ExportFormat::Json => {
                serde_json::to_writer_pretty(&mut out, document)
                    .context("Failed to write export JSON")?;
                writeln!(out)?;
            }
            ExportFormat::Csv => write_daily_csv(&document.daily_summary, &mut out)?,
        }
        out.flush()?;
        Ok(())
    }
}

impl ExportSink for ExportWriter {
    fn deliver(&self, document: &ExportDocument) -> Result<()> {
        match self.path {
            Some(ref path) => {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                self.write_to(document, io::BufWriter::new(file))
            }
            None => self.write_to(document, io::stdout().lock()),
        }
    }
}

pub(crate) fn cmd_export(
    tracker: &mut Tracker,
    csv: bool,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let writer = ExportWriter {
        format: if csv { ExportFormat::Csv } else { ExportFormat::Json },
        path: output,
    };
    let document = tracker.export_to(&writer)?;

    // Stdout carries the export itself; only file exports get a status line.
    if let Some(ref path) = writer.path {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exported_at": document.exported_at,
                    "days": document.daily_summary.len(),
                    "path": path.display().to_string(),
                })
            );
        } else {
            println!(
                "Exported {} days to {}",
                document.daily_summary.len(),
                path.display()
            );
        }
    }
    Ok(())
}
