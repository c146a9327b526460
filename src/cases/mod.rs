//! Arbitration case records as shipped in the case dataset: one JSON file
//! per case, keyed by case id.

pub mod index;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// The fact pattern used when no query is given.
pub const SAMPLE_USER_QUERY: &str = "\
I’m working on a case representing Fenoscadia Limited, a mining company from Ticadia that was operating in Kronos under an 80-year concession to extract lindoro, a rare earth metal. In 2016, Kronos passed a decree that revoked Fenoscadia’s license and terminated the concession agreement, citing environmental concerns. The government had funded a study that suggested lindoro mining contaminated the Rhea River and caused health issues, although the study didn’t conclusively prove this.
Kronos is now filing an environmental counterclaim in the ongoing arbitration, seeking at least USD 150 million for environmental damage, health costs, and water purification.

Can you help me analyze how to challenge Kronos’s environmental counterclaim, especially in terms of jurisdiction, admissibility, and merits?
";

/// A separate or dissenting opinion attached to a decision.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Opinion {
    pub title: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<CaseDate>,
    #[serde(default)]
    pub content: String,
}

/// An award, order or decision issued in a case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Decision {
    pub title: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<CaseDate>,
    #[serde(default)]
    pub opinions: Vec<Opinion>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Case {
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub party_nationalities: Vec<String>,
    pub institution: String,
    #[serde(default)]
    pub rules_of_arbitration: Vec<String>,
    #[serde(default)]
    pub applicable_treaties: Vec<String>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
}

/// A decision date. Displays as `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct CaseDate(pub NaiveDateTime);

impl CaseDate {
    /// Parse an ISO-8601 date or date-time, with or without offset.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.naive_local()));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self(dt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            && let Some(dt) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(Self(dt));
        }
        bail!("invalid date: {s:?}")
    }
}

impl fmt::Display for CaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl From<CaseDate> for String {
    fn from(date: CaseDate) -> Self {
        date.to_string()
    }
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<CaseDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => CaseDate::parse(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Reads case files from a directory of `<case_id>.json`.
#[derive(Debug, Clone)]
pub struct CaseStore {
    dir: PathBuf,
}

impl CaseStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, case_id: &str) -> PathBuf {
        self.dir.join(format!("{case_id}.json"))
    }

    /// Load one case. `None` when there is no file for the id.
    pub fn load(&self, case_id: &str) -> Result<Option<Case>> {
        // Ids come from model output; keep them inside the case directory.
        if case_id.is_empty() || case_id.contains(['/', '\\']) || case_id.contains("..") {
            return Ok(None);
        }

        let path = self.path_for(case_id);
        if !path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let case: Case = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse case file {}", path.display()))?;
        Ok(Some(case))
    }

    /// Ids of every case in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read case directory {}", self.dir.display()))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        if ids.is_empty() {
            bail!("no JSON files found in {}", self.dir.display());
        }

        ids.sort();
        Ok(ids)
    }
}
