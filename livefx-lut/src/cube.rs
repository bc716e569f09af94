//! Parser for the Adobe/Resolve `.cube` 3D LUT text format.
//!
//! Only the subset needed for grading is handled: an optional `TITLE`,
//! `LUT_3D_SIZE 33` and the table body with the red axis varying fastest.
//! `DOMAIN_MIN`/`DOMAIN_MAX` lines are accepted and ignored since all our
//! tables use the unit domain.

use crate::{Lut3d, LUT_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing LUT_3D_SIZE line")]
    MissingSize,
    #[error("unsupported LUT_3D_SIZE {0}, only {LUT_SIZE} is supported")]
    UnsupportedSize(usize),
    #[error("1D LUTs are not supported")]
    Unsupported1d,
    #[error("line {0}: {1}")]
    Malformed(usize, String),
    #[error("expected {expected} table entries, found {found}")]
    WrongEntryCount { expected: usize, found: usize },
}

pub(crate) fn parse(text: &str) -> Result<Lut3d, Error> {
    let mut title = None;
    let mut size = None;
    let mut data = Vec::new();

    for (line_idx, raw_line) in text.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let first = fields.next().unwrap();
        match first {
            "TITLE" => {
                let rest = line["TITLE".len()..].trim().trim_matches('"');
                if !rest.is_empty() {
                    title = Some(rest.to_string());
                }
            }
            "LUT_3D_SIZE" => {
                let value: usize = fields
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| Error::Malformed(line_no, "bad LUT_3D_SIZE".into()))?;
                if value != LUT_SIZE {
                    return Err(Error::UnsupportedSize(value));
                }
                size = Some(value);
            }
            "LUT_1D_SIZE" => {
                return Err(Error::Unsupported1d);
            }
            "DOMAIN_MIN" | "DOMAIN_MAX" => {}
            _ => {
                let r: f32 = first
                    .parse()
                    .map_err(|_| Error::Malformed(line_no, format!("bad value {first:?}")))?;
                let g: f32 = fields
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| Error::Malformed(line_no, "missing green value".into()))?;
                let b: f32 = fields
                    .next()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| Error::Malformed(line_no, "missing blue value".into()))?;
                if fields.next().is_some() {
                    return Err(Error::Malformed(line_no, "trailing fields".into()));
                }
                data.push([r, g, b]);
            }
        }
    }

    if size.is_none() {
        return Err(Error::MissingSize);
    }
    let expected = LUT_SIZE * LUT_SIZE * LUT_SIZE;
    if data.len() != expected {
        return Err(Error::WrongEntryCount {
            expected,
            found: data.len(),
        });
    }

    Ok(Lut3d { title, data })
}
