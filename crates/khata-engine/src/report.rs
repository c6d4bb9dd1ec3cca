//! # Report Snapshots
//!
//! Per-salesman report snapshots and the file-writing seam.
//!
//! ## Division of Labor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Report Pipeline                                   │
//! │                                                                         │
//! │  Engine.salesman_snapshot("asha")                                      │
//! │       │   joins ledger rows with live inventory rates                  │
//! │       ▼                                                                 │
//! │  SalesmanReport ─────────► ReportRenderer::render ──► document bytes   │
//! │   (owns no state,           (trait seam; a PDF                         │
//! │    pure data)                renderer plugs in here)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReportWriter::write                                                   │
//! │   {base}/{salesman_lowercased}/{month_name}/{YYYY-MM-DD}.{ext}         │
//! │   refuses to replace a file that appears to be open elsewhere          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The renderer has no feedback into the stores: it consumes a snapshot and
//! produces bytes, nothing else.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use khata_core::Money;

// =============================================================================
// Snapshot Types
// =============================================================================

/// One product row of a salesman report: the ledger row joined with the
/// live inventory rate at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLine {
    pub product_name: String,
    /// Cumulative units issued this period.
    pub issued_quantity: i64,
    /// Cumulative units returned this period.
    pub returned_quantity: i64,
    /// `issued − returned`, the quantity considered sold.
    pub sales_quantity: i64,
    /// Live unit price at snapshot time; zero when the product no longer
    /// exists in inventory.
    pub unit_price_paisa: i64,
    /// Payment as persisted on the ledger row.
    pub payment_paisa: i64,
}

impl ReportLine {
    /// Returns the rate as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paisa(self.unit_price_paisa)
    }

    /// Returns the payment as a Money type.
    #[inline]
    pub fn payment(&self) -> Money {
        Money::from_paisa(self.payment_paisa)
    }
}

/// A point-in-time snapshot of one salesman's ledger, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesmanReport {
    /// Salesman name in its stored casing.
    pub salesman_name: String,
    /// One line per product, ordered by product name.
    pub lines: Vec<ReportLine>,
    /// Sum of payments across all lines.
    pub total_payment_paisa: i64,
    /// Salesman-level expense, independent of any product.
    pub expense_paisa: i64,
}

impl SalesmanReport {
    /// Returns the total payment as a Money type.
    #[inline]
    pub fn total_payment(&self) -> Money {
        Money::from_paisa(self.total_payment_paisa)
    }

    /// Returns the expense as a Money type.
    #[inline]
    pub fn expense(&self) -> Money {
        Money::from_paisa(self.expense_paisa)
    }
}

// =============================================================================
// Report Error
// =============================================================================

/// Errors from report rendering and writing.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The target file exists and appears to be open for writing
    /// elsewhere. Best-effort check, not a hard lock.
    #[error("Report file appears to be open elsewhere: {}", .0.display())]
    FileBusy(PathBuf),

    /// The renderer failed to produce a document.
    #[error("Failed to render report: {0}")]
    Render(String),

    /// Filesystem failure while creating folders or writing the document.
    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Renderer Seam
// =============================================================================

/// Renders a snapshot into document bytes.
///
/// This is the boundary to the external report renderer: implementations
/// own no store state and receive everything they need in the snapshot.
/// The shipped [`PlainTextRenderer`] serves the CLI and tests; a PDF
/// renderer is a drop-in implementor with `extension() == "pdf"`.
pub trait ReportRenderer {
    /// File extension (without the dot) for documents this renderer emits.
    fn extension(&self) -> &'static str;

    /// Produces the document bytes for a snapshot.
    fn render(&self, report: &SalesmanReport) -> Result<Vec<u8>, ReportError>;
}

/// Tabular plain-text renderer.
pub struct PlainTextRenderer;

impl ReportRenderer for PlainTextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, report: &SalesmanReport) -> Result<Vec<u8>, ReportError> {
        let mut out = String::new();

        out.push_str(&format!("Salesman Details for {}\n", report.salesman_name));
        out.push_str(&format!("Total Payment: {}\n", report.total_payment()));
        out.push_str(&format!("Expense: {}\n\n", report.expense()));

        out.push_str(&format!(
            "{:<24} {:>8} {:>8} {:>8} {:>12} {:>14}\n",
            "Product", "Issued", "Returned", "Sales", "Rate", "Payment"
        ));

        for line in &report.lines {
            out.push_str(&format!(
                "{:<24} {:>8} {:>8} {:>8} {:>12} {:>14}\n",
                line.product_name,
                line.issued_quantity,
                line.returned_quantity,
                line.sales_quantity,
                line.unit_price().to_string(),
                line.payment().to_string(),
            ));
        }

        Ok(out.into_bytes())
    }
}

// =============================================================================
// Report Writer
// =============================================================================

/// Owns report path policy and the overwrite guard.
///
/// One document per salesman per reporting period: the month folder groups
/// a month's reports, the file name is the snapshot date, so re-running a
/// report on the same day replaces that day's document.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    base_dir: PathBuf,
}

impl ReportWriter {
    /// Creates a writer rooted at the given base directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        ReportWriter {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Computes the target path for a salesman at a given date:
    /// `{base}/{salesman_lowercased}/{month_name}/{YYYY-MM-DD}.{ext}`.
    pub fn report_path(&self, salesman: &str, extension: &str, at: DateTime<Utc>) -> PathBuf {
        self.base_dir
            .join(salesman.to_lowercase())
            .join(at.format("%B").to_string())
            .join(format!("{}.{}", at.format("%Y-%m-%d"), extension))
    }

    /// Renders and writes a snapshot, returning the path written.
    ///
    /// Refuses to replace an existing file that cannot be opened for
    /// appending (the best-effort signal that another program holds it
    /// open for writing).
    pub fn write(
        &self,
        renderer: &dyn ReportRenderer,
        report: &SalesmanReport,
    ) -> Result<PathBuf, ReportError> {
        let now = Utc::now();
        let path = self.report_path(&report.salesman_name, renderer.extension(), now);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        if path.exists() {
            OpenOptions::new()
                .append(true)
                .open(&path)
                .map_err(|_| ReportError::FileBusy(path.clone()))?;
        }

        let bytes = renderer.render(report)?;
        fs::write(&path, bytes)?;

        info!(salesman = %report.salesman_name, path = %path.display(), "Report written");

        Ok(path)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> SalesmanReport {
        SalesmanReport {
            salesman_name: "Asha".to_string(),
            lines: vec![ReportLine {
                product_name: "rice".to_string(),
                issued_quantity: 5,
                returned_quantity: 2,
                sales_quantity: 3,
                unit_price_paisa: 2000,
                payment_paisa: 6000,
            }],
            total_payment_paisa: 6000,
            expense_paisa: 1500,
        }
    }

    #[test]
    fn test_report_path_scheme() {
        let writer = ReportWriter::new("/tmp/reports");
        let at = DateTime::parse_from_rfc3339("2026-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let path = writer.report_path("Asha", "pdf", at);
        assert_eq!(
            path,
            PathBuf::from("/tmp/reports/asha/January/2026-01-15.pdf")
        );
    }

    #[test]
    fn test_plain_text_render_contents() {
        let report = sample_report();
        let bytes = PlainTextRenderer.render(&report).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("Salesman Details for Asha"));
        assert!(text.contains("Total Payment: Rs 60.00"));
        assert!(text.contains("Expense: Rs 15.00"));
        assert!(text.contains("rice"));
        assert!(text.contains("Rs 20.00"));
    }

    #[test]
    fn test_write_creates_folders_and_file() {
        let base = std::env::temp_dir().join(format!("khata-report-test-{}", std::process::id()));
        let writer = ReportWriter::new(&base);

        let path = writer.write(&PlainTextRenderer, &sample_report()).unwrap();
        assert!(path.exists());
        assert!(path.starts_with(base.join("asha")));

        // Writing again on the same day replaces the same file
        let again = writer.write(&PlainTextRenderer, &sample_report()).unwrap();
        assert_eq!(path, again);

        fs::remove_dir_all(&base).ok();
    }
}
