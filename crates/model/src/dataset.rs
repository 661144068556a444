//! Reader for the reference dataset the model was trained on.
//!
//! Only the two categorical columns matter here; every other column is
//! skipped. Fields follow the usual CSV quoting rules (`"Rice, paddy"`,
//! doubled quotes as escapes, line breaks inside quoted fields).

use crate::error::DatasetError;
use std::collections::BTreeSet;
use std::path::Path;

pub const REGION_COLUMN: &str = "Area";
pub const CROP_COLUMN: &str = "Item";

/// Distinct category labels observed in the reference dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceDataset {
    pub regions: BTreeSet<String>,
    pub crops: BTreeSet<String>,
    pub rows: usize,
    pub skipped_rows: usize,
}

impl ReferenceDataset {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::Missing {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::parse(&raw)?;
        log::debug!(
            "Read {} rows from {} ({} skipped)",
            dataset.rows,
            path.display(),
            dataset.skipped_rows
        );
        Ok(dataset)
    }

    pub fn parse(raw: &str) -> Result<Self, DatasetError> {
        let mut records = split_records(raw.trim_start_matches('\u{feff}'))?
            .into_iter()
            .filter(|(_, fields)| !is_blank(fields));

        let Some((_, header)) = records.next() else {
            return Ok(Self::default());
        };
        let region_idx = column_index(&header, REGION_COLUMN)?;
        let crop_idx = column_index(&header, CROP_COLUMN)?;

        let mut dataset = Self::default();
        for (_, fields) in records {
            let region = fields.get(region_idx).filter(|v| !v.is_empty());
            let crop = fields.get(crop_idx).filter(|v| !v.is_empty());
            match (region, crop) {
                (Some(region), Some(crop)) => {
                    dataset.regions.insert(region.clone());
                    dataset.crops.insert(crop.clone());
                    dataset.rows += 1;
                }
                _ => dataset.skipped_rows += 1,
            }
        }
        if dataset.skipped_rows > 0 {
            log::warn!(
                "Skipped {} reference rows without {REGION_COLUMN}/{CROP_COLUMN} labels",
                dataset.skipped_rows
            );
        }
        Ok(dataset)
    }
}

fn column_index(header: &[String], column: &'static str) -> Result<usize, DatasetError> {
    header
        .iter()
        .position(|name| name.trim() == column)
        .ok_or(DatasetError::MissingColumn { column })
}

fn is_blank(fields: &[String]) -> bool {
    matches!(fields, [only] if only.trim().is_empty())
}

/// Split the buffer into records tagged with their starting line.
/// Quoted fields may contain separators, doubled quotes and line breaks.
fn split_records(raw: &str) -> Result<Vec<(usize, Vec<String>)>, DatasetError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    current.push('\n');
                }
                other => current.push(other),
            }
            continue;
        }
        match ch {
            '"' if current.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut current)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut current));
                records.push((record_line, std::mem::take(&mut fields)));
                line += 1;
                record_line = line;
            }
            other => current.push(other),
        }
    }

    if in_quotes {
        return Err(DatasetError::Malformed {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
        records.push((record_line, fields));
    }
    Ok(records)
}
