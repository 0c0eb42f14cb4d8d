// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;

use crate::error::ClutterError;

fn create_file<P: AsRef<Path>>(path: P) -> Result<File, ClutterError> {
    File::create(&path).map_err(|err| {
        ClutterError::TableWriteError(format!("{}: {}", path.as_ref().display(), err))
    })
}

fn write_table_delimited<P: AsRef<Path>>(
    df: &mut DataFrame,
    path: P,
    separator: u8,
) -> Result<(), ClutterError> {
    let mut output = create_file(&path)?;

    CsvWriter::new(&mut output)
        .include_header(true)
        .with_separator(separator)
        .finish(df)
        .map_err(|err| ClutterError::TableWriteError(err.to_string()))
}

fn write_table_pq<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<(), ClutterError> {
    let mut output = create_file(&path)?;

    ParquetWriter::new(&mut output)
        .finish(df)
        .map(|_| ())
        .map_err(|err| ClutterError::TableWriteError(err.to_string()))
}

/// Write a DataFrame to disk with a format inferred from the extension
///
/// # Arguments
///
/// * `df` - A DataFrame
/// * `path` - Output path ending in csv, tsv, txt, parquet, or pq
///
/// # Examples
///
/// ```no_run
/// use polars::prelude::*;
/// use clutter_core::io::write_table;
///
/// let column = vec![Column::new("iou".into(), [0.5, 0.75])];
/// let mut df: DataFrame = DataFrame::new(column).unwrap();
///
/// write_table(&mut df, "per_image.tsv").unwrap()
/// ```
pub fn write_table<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<(), ClutterError> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    match extension.as_deref() {
        Some("csv") => write_table_delimited(df, path, b','),
        Some("tsv") | Some("txt") => write_table_delimited(df, path, b'\t'),
        Some("parquet") | Some("pq") => write_table_pq(df, path),
        _ => Err(ClutterError::TableWriteError(
            "Provided table path has an invalid extension. Must be one of: csv, tsv, txt, parquet, or pq".to_string(),
        )),
    }
}

/// Write any serializable value as pretty-printed JSON
pub fn write_json<P: AsRef<Path>, T: Serialize>(value: &T, path: P) -> Result<(), ClutterError> {
    let output = create_file(&path)?;

    serde_json::to_writer_pretty(output, value)
        .map_err(|err| ClutterError::TableWriteError(err.to_string()))
}
