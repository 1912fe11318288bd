use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use thiserror::Error;

use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

const TARGET_FIELD_INDEX: usize = FEATURE_COUNT;

/// One already-encoded row of the heart dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub features: FeatureVector,
    /// 1 if the patient has heart disease, 0 if not.
    pub target: Option<u8>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot open '{path}'")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row}: expected 13 feature columns and an optional target, found {found}")]
    Columns { row: usize, found: usize },
    #[error("row {row}: {column} is not a number: '{value}'")]
    Value {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: target must be 0 or 1, got '{value}'")]
    Target { row: usize, value: String },
}

fn to_target(row: usize, value: &str) -> Result<u8, ParseError> {
    match value.trim() {
        "0" | "0.0" => Ok(0),
        "1" | "1.0" => Ok(1),
        other => Err(ParseError::Target {
            row,
            value: other.to_string(),
        }),
    }
}

pub fn parse(file_path: impl AsRef<Path>) -> Result<Vec<Record>, ParseError> {
    let path = file_path.as_ref();
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.display().to_string(),
        source,
    })?;

    parse_reader(BufReader::new(file))
}

/// Reads a headered CSV whose first columns are the encoded features in model order,
/// optionally followed by the target.
pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<Record>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result?;

        if record.len() != FEATURE_COUNT && record.len() != FEATURE_COUNT + 1 {
            return Err(ParseError::Columns {
                row,
                found: record.len(),
            });
        }

        let mut features = [0.0; FEATURE_COUNT];
        for (slot, (column, value)) in features
            .iter_mut()
            .zip(FEATURE_NAMES.into_iter().zip(record.iter()))
        {
            *slot = value.parse::<f64>().map_err(|_| ParseError::Value {
                row,
                column,
                value: value.to_string(),
            })?;
        }

        let target = record
            .get(TARGET_FIELD_INDEX)
            .map(|value| to_target(row, value))
            .transpose()?;

        records.push(Record { features, target });
    }

    Ok(records)
}
