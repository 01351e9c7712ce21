//! CSV table reading and writing.

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use mosei_models::{columns, AnnotationRecord, ClipId};

use crate::error::{LabelError, LabelResult};

fn reader(path: &Path) -> LabelResult<csv::Reader<std::fs::File>> {
    Ok(ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)?)
}

fn column_index(headers: &StringRecord, path: &Path, column: &str) -> LabelResult<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| LabelError::missing_column(path, column))
}

/// Header row decoded lossily, for tables read as raw bytes.
fn lossy_headers(rdr: &mut csv::Reader<std::fs::File>) -> LabelResult<StringRecord> {
    Ok(rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect())
}

/// One field of a byte row; missing fields read as empty.
fn lossy_field(row: &ByteRecord, idx: usize) -> Cow<'_, str> {
    String::from_utf8_lossy(row.get(idx).unwrap_or_default())
}

/// Read a raw annotation export, keeping only the id and judgment columns.
///
/// Exports carry many unrelated columns and may have ragged rows; a field
/// past the end of a short row reads as empty. Rows are read as bytes so
/// free-text columns with invalid UTF-8 do not reject the table.
pub fn read_raw_annotations(path: impl AsRef<Path>) -> LabelResult<Vec<AnnotationRecord>> {
    let path = path.as_ref();
    let mut rdr = reader(path)?;
    let headers = lossy_headers(&mut rdr)?;

    let video_idx = column_index(&headers, path, columns::VIDEO_ID)?;
    let clip_idx = column_index(&headers, path, columns::CLIP)?;
    let sentiment_idx = column_index(&headers, path, columns::SENTIMENT)?;

    let mut records = Vec::new();
    for row in rdr.byte_records() {
        let row = row?;
        let field = |i: usize| lossy_field(&row, i).into_owned();
        records.push(AnnotationRecord::new(
            field(video_idx),
            field(clip_idx),
            field(sentiment_idx),
        ));
    }

    Ok(records)
}

/// Read the merged annotation table written by the merge stage.
pub fn read_merged_annotations(path: impl AsRef<Path>) -> LabelResult<Vec<AnnotationRecord>> {
    let path = path.as_ref();
    let mut rdr = reader(path)?;
    let headers = rdr.headers()?.clone();
    for column in columns::RAW_REQUIRED.iter().chain([&columns::MP4_FILENAME]) {
        column_index(&headers, path, column)?;
    }

    rdr.deserialize()
        .map(|row| row.map_err(LabelError::from))
        .collect()
}

/// Distinct `mp4_filename` values of a manifest table, in first-appearance order.
pub fn read_manifest(path: impl AsRef<Path>) -> LabelResult<Vec<ClipId>> {
    let path = path.as_ref();
    let mut rdr = reader(path)?;
    let headers = lossy_headers(&mut rdr)?;
    let idx = column_index(&headers, path, columns::MP4_FILENAME)?;

    let mut seen = HashSet::new();
    let mut clips = Vec::new();
    for row in rdr.byte_records() {
        let row = row?;
        let name = lossy_field(&row, idx);
        if !name.is_empty() && seen.insert(name.to_string()) {
            clips.push(ClipId::from(name.as_ref()));
        }
    }

    Ok(clips)
}

/// Write `rows` under an explicit header row.
///
/// The header is written even when `rows` is empty.
pub fn write_table<T: Serialize>(
    path: impl AsRef<Path>,
    headers: &[&str],
    rows: &[T],
) -> LabelResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    wtr.write_record(headers)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
