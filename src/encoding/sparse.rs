//! sparse — line-oriented `label name:value ...` reader and writer.
//!
//! Purpose
//! -------
//! Load labeled examples from plain text into an [`EncodedDataset`] and
//! write a dataset back out in the same shape.
//!
//! Key behaviors
//! -------------
//! - Everything from `#` to end of line is a comment; blank lines (after
//!   comment stripping) are skipped.
//! - The first whitespace token is the label; each further token must split
//!   on `:` into exactly two parts, a feature name and an `f64` value.
//! - Non-finite values, malformed tokens, and unparsable names are errors
//!   carrying the 1-based line number.
//! - The target dataset's lock state decides whether unseen features are
//!   added (training data) or dropped (test data against a fixed vocabulary).
//!
//! Conventions
//! -----------
//! - Feature and label types only need `FromStr` to read and `Display` to
//!   write; `String` is the usual choice.
//! - The writer always emits an explicit `:value`, using `1` for binary data.
use std::{
    fmt::{Debug, Display},
    hash::Hash,
    io::{BufRead, Write},
    str::FromStr,
};

use crate::encoding::{
    dataset::EncodedDataset,
    datum::Datum,
    errors::{DataError, DataResult},
};

/// Parse one line into a datum, or `None` for blank/comment-only lines.
///
/// # Errors
/// - [`DataError::MalformedToken`] for tokens without exactly one `:`.
/// - [`DataError::InvalidValue`] for unparsable or non-finite values.
/// - [`DataError::InvalidToken`] when a label or name fails `FromStr`.
pub fn parse_sparse_line<F: FromStr, L: FromStr>(
    line: &str, line_number: usize,
) -> DataResult<Option<Datum<F, L>>> {
    let content = line.split('#').next().unwrap_or_default();
    let mut tokens = content.split_whitespace();
    let Some(label_token) = tokens.next() else { return Ok(None) };
    let label = label_token
        .parse::<L>()
        .map_err(|_| DataError::InvalidToken { line: line_number, token: label_token.to_string() })?;

    let mut features = Vec::new();
    for token in tokens {
        let parts: Vec<&str> = token.split(':').collect();
        let [name, value] = parts.as_slice() else {
            return Err(DataError::MalformedToken { line: line_number, token: token.to_string() });
        };
        let value: f64 = value
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| DataError::InvalidValue { line: line_number, token: token.to_string() })?;
        let name = name
            .parse::<F>()
            .map_err(|_| DataError::InvalidToken { line: line_number, token: token.to_string() })?;
        features.push((name, value));
    }
    Ok(Some(Datum::real_valued(features, label)))
}

/// Read every line of `reader` into `dataset`; returns the number of
/// examples added.
///
/// Errors raised while adding a parsed datum are wrapped in
/// [`DataError::Line`] so the offending line is always reported. Examples
/// read before the failing line stay in the dataset.
pub fn read_sparse<R, F, L>(reader: R, dataset: &mut EncodedDataset<F, L>) -> DataResult<usize>
where
    R: BufRead,
    F: FromStr + Eq + Hash + Clone + Debug,
    L: FromStr + Eq + Hash + Clone + Debug,
{
    let mut added = 0;
    for (i, line) in reader.lines().enumerate() {
        let line_number = i + 1;
        let line = line?;
        let Some(datum) = parse_sparse_line::<F, L>(&line, line_number)? else { continue };
        dataset
            .add(datum)
            .map_err(|e| DataError::Line { line: line_number, source: Box::new(e) })?;
        added += 1;
    }
    Ok(added)
}

/// Write `dataset` as one `label name:value ...` line per example.
pub fn write_sparse<W, F, L>(dataset: &EncodedDataset<F, L>, mut writer: W) -> DataResult<()>
where
    W: Write,
    F: Display + Eq + Hash + Clone,
    L: Display + Eq + Hash + Clone,
{
    for i in 0..dataset.len() {
        write!(writer, "{}", dataset.label_index().get(dataset.label(i)))?;
        for (id, value) in dataset.feature_values(i) {
            write!(writer, " {}:{}", dataset.feature_index().get(id), value)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
