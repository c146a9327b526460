//! Flat CSV index of every case, fed to the ranking prompt so the model
//! can pick candidates without reading full case files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::CaseStore;

/// One row of `cases.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub case_id: String,
    pub status: String,
    pub nationalities: String,
    pub title: String,
    pub industries: String,
}

impl IndexRow {
    /// The line describing this case inside the ranking prompt.
    pub fn prompt_line(&self) -> String {
        format!(
            "- Case ID: {}, Status: {}, Title: {}, Industries: {}, Nationalities: {}",
            self.case_id, self.status, self.title, self.industries, self.nationalities
        )
    }
}

/// Read every case in the store into index rows.
pub fn build_index(store: &CaseStore) -> Result<Vec<IndexRow>> {
    let mut rows = Vec::new();
    for case_id in store.list()? {
        let case = store
            .load(&case_id)?
            .with_context(|| format!("case {case_id} disappeared while indexing"))?;
        rows.push(IndexRow {
            case_id,
            status: case.status,
            nationalities: case.party_nationalities.join(", "),
            title: case.title,
            industries: case.industries.join(", "),
        });
    }
    Ok(rows)
}

/// Write rows as CSV with a header line.
pub fn write_index(rows: &[IndexRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(rows = rows.len(), path = %path.display(), "wrote case index");
    Ok(())
}

/// Read an index written by [`write_index`].
pub fn read_index(path: &Path) -> Result<Vec<IndexRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open case index {}", path.display()))?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<IndexRow>, _>>()
        .with_context(|| format!("failed to parse case index {}", path.display()))?;
    info!(rows = rows.len(), path = %path.display(), "loaded case index");
    Ok(rows)
}

/// The `<CASES>` block of the ranking prompt.
pub fn cases_prompt(rows: &[IndexRow]) -> String {
    rows.iter()
        .map(IndexRow::prompt_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> IndexRow {
        IndexRow {
            case_id: id.to_string(),
            status: "Concluded".to_string(),
            nationalities: "Ecuador, United States".to_string(),
            title: "Burlington v. Ecuador".to_string(),
            industries: "Oil, Gas & Mining".to_string(),
        }
    }

    #[test]
    fn prompt_line_format() {
        assert_eq!(
            row("502").prompt_line(),
            "- Case ID: 502, Status: Concluded, Title: Burlington v. Ecuador, \
             Industries: Oil, Gas & Mining, Nationalities: Ecuador, United States"
        );
    }

    #[test]
    fn cases_prompt_joins_lines() {
        let prompt = cases_prompt(&[row("1"), row("2")]);
        assert_eq!(prompt.lines().count(), 2);
        assert!(prompt.starts_with("- Case ID: 1,"));
    }

    #[test]
    fn write_then_read_keeps_commas_inside_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.csv");
        write_index(&[row("1"), row("2")], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("case_id,status,nationalities,title,industries\n"));
        assert!(text.contains("\"Ecuador, United States\""));

        let rows = read_index(&path).unwrap();
        assert_eq!(rows, vec![row("1"), row("2")]);
    }

    #[test]
    fn read_missing_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_index(&dir.path().join("nope.csv")).is_err());
    }
}
