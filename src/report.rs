//! Text report for a [`Snapshot`]
//!
//! One `Label: value` line per snapshot field, always in the same order and
//! always all of them. Unavailable fields show a placeholder.

use crate::hardware::{FieldValue, Snapshot, SnapshotField};

/// Placeholder for fields that could not be read
pub const DEFAULT_PLACEHOLDER: &str = "N/A";

/// Renders snapshots as a fixed-layout text report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFormatter {
    placeholder: String,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl ReportFormatter {
    /// Use a custom placeholder. A blank one falls back to
    /// [`DEFAULT_PLACEHOLDER`] so unavailable lines never render empty.
    pub fn new(placeholder: &str) -> Self {
        let placeholder = placeholder.trim();
        if placeholder.is_empty() {
            Self::default()
        } else {
            Self {
                placeholder: placeholder.to_string(),
            }
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Render the report, one newline-terminated line per field
    pub fn render(&self, snapshot: &Snapshot) -> String {
        let width = label_width();
        let mut output = String::new();

        for field in SnapshotField::ALL {
            let label = format!("{}:", field.label());
            let value = match snapshot.get(field) {
                FieldValue::Text(text) => text.to_string(),
                FieldValue::Mebibytes(mib) => format!("{} MiB", mib),
                FieldValue::Unavailable(_) => self.placeholder.clone(),
            };
            output.push_str(&format!("{:<width$} {}\n", label, value, width = width + 1));
        }

        output
    }
}

/// Widest label, so values line up in one column
fn label_width() -> usize {
    SnapshotField::ALL
        .iter()
        .map(|field| field.label().len())
        .max()
        .unwrap_or(0)
}

/// Render with the default placeholder
pub fn format(snapshot: &Snapshot) -> String {
    ReportFormatter::default().render(snapshot)
}
