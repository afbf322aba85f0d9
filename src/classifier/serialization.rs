//! Model persistence: a line-oriented text format and a versioned binary one.
//!
//! Text layout
//! -----------
//! ```text
//! 0=<label 0>
//! 1=<label 1>
//!
//! 0=<feature 0>
//!
//! <featureId> <labelId> <weight>
//!
//! <threshold count>
//! <threshold 0>
//! <threshold 1>
//! ```
//! Labels and features use their `Display`/`FromStr` forms; everything
//! after the first `=` is the entry, so entries may contain `=` but not line
//! breaks. Weights are written row-major (feature outer, label inner).
//! Weights and thresholds use the shorter of the plain and exponent `f64`
//! renderings; both parse back to the same value, so a round trip
//! reproduces every score exactly.
//!
//! Binary layout
//! -------------
//! A `bincode` [`FORMAT_VERSION`] `u32` followed by a `bincode` record
//! holding both index vectors, the flat weights and the thresholds. Loading
//! reads the version alone and rejects other versions before touching the
//! record.
use std::{
    fmt::Display,
    fs::File,
    hash::Hash,
    io::{BufRead, BufReader, BufWriter, Lines, Write},
    path::Path,
    str::FromStr,
};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    classifier::{
        errors::{ModelError, ModelResult},
        linear::LinearModel,
    },
    encoding::index::Index,
};

/// Version tag written into binary models.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SerializedModelRef<'a, F, L> {
    features: &'a [F],
    labels: &'a [L],
    weights: Vec<f64>,
    thresholds: Vec<f64>,
}

#[derive(Deserialize)]
struct SerializedModel<F, L> {
    features: Vec<F>,
    labels: Vec<L>,
    weights: Vec<f64>,
    thresholds: Vec<f64>,
}

impl<F, L> LinearModel<F, L>
where
    F: Eq + Hash + Clone + Display + FromStr,
    L: Eq + Hash + Clone + Display + FromStr,
{
    /// Write the text form to `writer`.
    ///
    /// # Errors
    /// - [`ModelError::UnrepresentableEntry`] if a label or feature renders
    ///   with a line break. Nothing is written in that case.
    /// - [`ModelError::Io`] on write failure.
    pub fn write_text<W: Write>(&self, mut writer: W) -> ModelResult<()> {
        let labels = render_entries(self.label_index.iter())?;
        let features = render_entries(self.feature_index.iter())?;

        for (id, label) in labels.iter().enumerate() {
            writeln!(writer, "{id}={label}")?;
        }
        writeln!(writer)?;
        for (id, feature) in features.iter().enumerate() {
            writeln!(writer, "{id}={feature}")?;
        }
        writeln!(writer)?;
        for ((f, c), w) in self.weights.indexed_iter() {
            writeln!(writer, "{f} {c} {}", render_number(w))?;
        }
        writeln!(writer)?;
        writeln!(writer, "{}", self.thresholds.len())?;
        for t in &self.thresholds {
            writeln!(writer, "{}", render_number(t))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Parse the text form from `reader`.
    ///
    /// Weight entries that are absent stay at 0. Trailing blank lines are
    /// accepted; any other trailing content is an error.
    ///
    /// # Errors
    /// - [`ModelError::Parse`] with the 1-based line of the first malformed
    ///   line (bad ids, unparsable entries or numbers, repeated weights).
    /// - [`ModelError::UnexpectedEof`] if the input stops mid-model.
    /// - [`ModelError::Data`] for repeated labels or features.
    pub fn read_text<R: BufRead>(reader: R) -> ModelResult<Self> {
        let mut cursor = LineCursor::new(reader);
        let labels: Vec<L> = cursor.read_entries("labels")?;
        let features: Vec<F> = cursor.read_entries("features")?;
        let shape = (features.len(), labels.len());

        let mut weights = Array2::zeros(shape);
        let mut seen = Array2::from_elem(shape, false);
        loop {
            let line = cursor.next_line("weights")?;
            if line.trim().is_empty() {
                break;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let &[f, c, w] = tokens.as_slice() else {
                return Err(cursor.error("expected `featureId labelId weight`"));
            };
            let f: usize = cursor.parse_number(f, "feature id")?;
            let c: usize = cursor.parse_number(c, "label id")?;
            let w: f64 = cursor.parse_number(w, "weight")?;
            if f >= shape.0 || c >= shape.1 {
                return Err(cursor.error(format!(
                    "weight entry ({f}, {c}) outside {}x{} model",
                    shape.0, shape.1
                )));
            }
            if seen[[f, c]] {
                return Err(cursor.error(format!("weight entry ({f}, {c}) repeated")));
            }
            seen[[f, c]] = true;
            weights[[f, c]] = w;
        }

        let count_line = cursor.next_line("thresholds")?;
        let count: usize = cursor.parse_number(count_line.trim(), "threshold count")?;
        let mut thresholds = Array1::zeros(count);
        for t in thresholds.iter_mut() {
            let line = cursor.next_line("thresholds")?;
            *t = cursor.parse_number(line.trim(), "threshold")?;
        }
        while let Some(line) = cursor.next()? {
            if !line.trim().is_empty() {
                return Err(cursor.error("unexpected content after thresholds"));
            }
        }

        let feature_index = Index::from_values(features)?;
        let label_index = Index::from_values(labels)?;
        LinearModel::new(feature_index, label_index, weights, thresholds)
    }

    pub fn save_text<P: AsRef<Path>>(&self, path: P) -> ModelResult<()> {
        self.write_text(BufWriter::new(File::create(path)?))
    }

    pub fn load_text<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        Self::read_text(BufReader::new(File::open(path)?))
    }
}

impl<F, L> LinearModel<F, L>
where
    F: Eq + Hash + Clone + Serialize + DeserializeOwned,
    L: Eq + Hash + Clone + Serialize + DeserializeOwned,
{
    pub fn to_bytes(&self) -> ModelResult<Vec<u8>> {
        let record = SerializedModelRef {
            features: self.feature_index.as_slice(),
            labels: self.label_index.as_slice(),
            weights: self.to_flat().to_vec(),
            thresholds: self.thresholds.to_vec(),
        };
        let mut bytes = bincode::serialize(&FORMAT_VERSION)?;
        bincode::serialize_into(&mut bytes, &record)?;
        Ok(bytes)
    }

    /// # Errors
    /// - [`ModelError::Binary`] for undecodable bytes.
    /// - [`ModelError::UnsupportedVersion`] for another format version.
    /// - Shape and index errors if the record is inconsistent.
    pub fn from_bytes(bytes: &[u8]) -> ModelResult<Self> {
        let mut reader = bytes;
        let version: u32 = bincode::deserialize_from(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion { found: version, supported: FORMAT_VERSION });
        }
        let record: SerializedModel<F, L> = bincode::deserialize_from(reader)?;
        let feature_index = Index::from_values(record.features)?;
        let label_index = Index::from_values(record.labels)?;
        let mut model =
            LinearModel::from_flat(feature_index, label_index, &Array1::from(record.weights))?;
        model.set_thresholds(Array1::from(record.thresholds))?;
        Ok(model)
    }

    pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> ModelResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load_binary<P: AsRef<Path>>(path: P) -> ModelResult<Self> {
        Self::from_bytes(&std::fs::read(path)?)
    }
}

/// Shorter of `{x}` and `{x:e}`; both are exact `f64` renderings.
fn render_number(x: &f64) -> String {
    let plain = x.to_string();
    let exp = format!("{x:e}");
    if exp.len() < plain.len() { exp } else { plain }
}

fn render_entries<'a, T: Display + 'a>(
    entries: impl Iterator<Item = &'a T>,
) -> ModelResult<Vec<String>> {
    entries
        .map(|entry| {
            let rendered = entry.to_string();
            if rendered.contains(['\n', '\r']) {
                Err(ModelError::UnrepresentableEntry { entry: rendered })
            } else {
                Ok(rendered)
            }
        })
        .collect()
}

/// Line reader that remembers the 1-based number of the last line read.
struct LineCursor<R> {
    lines: Lines<R>,
    number: usize,
}

impl<R: BufRead> LineCursor<R> {
    fn new(reader: R) -> Self {
        Self { lines: reader.lines(), number: 0 }
    }

    fn next(&mut self) -> ModelResult<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(line) => {
                self.number += 1;
                Ok(Some(line?))
            }
        }
    }

    fn next_line(&mut self, section: &'static str) -> ModelResult<String> {
        self.next()?.ok_or(ModelError::UnexpectedEof { section })
    }

    fn error(&self, reason: impl Into<String>) -> ModelError {
        ModelError::Parse { line: self.number, reason: reason.into() }
    }

    fn parse_number<T: FromStr>(&self, raw: &str, what: &str) -> ModelResult<T> {
        raw.parse().map_err(|_| self.error(format!("cannot parse {what} from {raw:?}")))
    }

    /// `id=entry` lines up to the next blank line; ids must count up from 0.
    fn read_entries<T: FromStr>(&mut self, section: &'static str) -> ModelResult<Vec<T>> {
        let mut entries = Vec::new();
        loop {
            let line = self.next_line(section)?;
            if line.trim().is_empty() {
                return Ok(entries);
            }
            let Some((id, raw)) = line.split_once('=') else {
                return Err(self.error(format!("expected `id=entry` in {section}")));
            };
            let id: usize = self.parse_number(id, "id")?;
            if id != entries.len() {
                return Err(self.error(format!("expected id {}, found {id}", entries.len())));
            }
            let entry = raw
                .parse()
                .map_err(|_| self.error(format!("cannot parse {section} entry {raw:?}")))?;
            entries.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::linear::test_support::{feats, weather_model};
    use ndarray::array;
    use std::io::Cursor;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact text layout and lossless text/binary round trips via files.
    // - Line-numbered parse errors and truncated inputs.
    // - Rejection of unrepresentable entries and foreign binary versions.
    // -------------------------------------------------------------------------

    fn model_text(model: &LinearModel<String, String>) -> String {
        let mut buf = Vec::new();
        model.write_text(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // The writer emits labels, features, row-major weights and thresholds,
    // separated by blank lines.
    fn text_layout() {
        let text = model_text(&weather_model());
        let expected = "0=stay\n1=go\n\n0=rain\n1=sun\n2=wind\n\n\
                        0 0 1.5\n0 1 -1\n1 0 -0.5\n1 1 2\n2 0 0.25\n2 1 0\n\n\
                        2\n0\n0.1\n";
        assert_eq!(text, expected);
    }

    #[test]
    // Purpose
    // -------
    // Text and binary files reload to models with identical scores.
    //
    // Given
    // -----
    // - Weights that need full precision (1/3, 1e-300, −2.5e17).
    //
    // Expect
    // ------
    // - Bitwise-equal weights, thresholds and `score_of`.
    fn file_round_trips_are_lossless() {
        // Arrange
        let mut model = weather_model();
        model
            .set_weights(array![[1.0 / 3.0, 1e-300], [-2.5e17, 0.1 + 0.2], [f64::MIN_POSITIVE, -7.0]])
            .unwrap();
        model.set_thresholds(array![-1.0 / 7.0, 42.0]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join("model.txt");
        let bin_path = dir.path().join("model.bin");

        // Act
        model.save_text(&text_path).unwrap();
        model.save_binary(&bin_path).unwrap();
        let from_text: LinearModel<String, String> = LinearModel::load_text(&text_path).unwrap();
        let from_bin: LinearModel<String, String> = LinearModel::load_binary(&bin_path).unwrap();

        // Assert
        let d = feats(&[("rain", 0.3), ("sun", 1.0), ("wind", 2.0)]);
        for loaded in [&from_text, &from_bin] {
            assert_eq!(loaded, &model);
            for label in model.labels() {
                assert_eq!(
                    loaded.score_of(&d, label).unwrap().to_bits(),
                    model.score_of(&d, label).unwrap().to_bits()
                );
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Non-string entry types go through Display / FromStr, and entries may
    // contain '='.
    fn text_round_trip_with_other_entry_types() {
        let features = Index::from_values(vec![7u32, 3, 11]).unwrap();
        let labels = Index::from_values(vec!["x=1".to_string(), "y".to_string()]).unwrap();
        let model =
            LinearModel::from_flat(features, labels, &array![0.5, -0.5, 1.0, 2.0, 0.0, -3.0])
                .unwrap();
        let mut buf = Vec::new();
        model.write_text(&mut buf).unwrap();
        let loaded: LinearModel<u32, String> = LinearModel::read_text(Cursor::new(buf)).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    // Purpose
    // -------
    // Malformed lines are reported with their 1-based line number.
    //
    // Given
    // -----
    // - A weight line with a non-numeric weight on line 5.
    // - A label id out of sequence on line 2.
    // - A weight entry outside the matrix on line 5.
    fn parse_errors_carry_line_numbers() {
        let bad_weight = "0=a\n1=b\n\n0=f\n0 0 abc\n\n2\n0\n0\n";
        let err = LinearModel::<String, String>::read_text(Cursor::new(bad_weight)).unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 5, .. }), "got {err:?}");

        let bad_id = "0=a\n5=b\n\n";
        let err = LinearModel::<String, String>::read_text(Cursor::new(bad_id)).unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 2, .. }), "got {err:?}");

        let outside = "0=a\n1=b\n\n0=f\n3 0 1.0\n\n2\n0\n0\n";
        let err = LinearModel::<String, String>::read_text(Cursor::new(outside)).unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 5, .. }), "got {err:?}");
    }

    #[test]
    // Purpose
    // -------
    // Inputs that stop early report the section being read; a weight line
    // right after the features (no blank separator) is a features parse
    // error; content after the thresholds is rejected.
    fn truncated_and_trailing_input() {
        let missing_separator = "0=a\n1=b\n\n0=f\n0 0 1\n\n2\n0.5\n";
        assert!(matches!(
            LinearModel::<String, String>::read_text(Cursor::new(missing_separator)).unwrap_err(),
            ModelError::Parse { line: 5, .. }
        ));
        let truncated = "0=a\n1=b\n\n0=f\n\n0 0 1\n\n2\n0.5\n";
        assert_eq!(
            LinearModel::<String, String>::read_text(Cursor::new(truncated)).unwrap_err(),
            ModelError::UnexpectedEof { section: "thresholds" }
        );
        assert_eq!(
            LinearModel::<String, String>::read_text(Cursor::new("0=a\n")).unwrap_err(),
            ModelError::UnexpectedEof { section: "labels" }
        );
        let trailing = "0=a\n1=b\n\n0=f\n\n\n2\n0\n0\n\nextra\n";
        assert!(matches!(
            LinearModel::<String, String>::read_text(Cursor::new(trailing)).unwrap_err(),
            ModelError::Parse { line: 11, .. }
        ));
    }

    #[test]
    // Purpose
    // -------
    // Extreme magnitudes are written in exponent form and reload bitwise;
    // ordinary values keep the plain form.
    //
    // Given
    // -----
    // - Weights 1e-300 and −2.5e17, threshold 1e300.
    //
    // Expect
    // ------
    // - Weight lines `0 0 1e-300` and `0 1 -2.5e17`, threshold line `1e300`.
    // - Every line stays short and the reloaded values are bitwise equal.
    fn extreme_weights_use_exponent_form() {
        // Arrange
        let mut model = weather_model();
        let mut weights = model.weights().clone();
        weights[[0, 0]] = 1e-300;
        weights[[0, 1]] = -2.5e17;
        model.set_weights(weights).unwrap();
        model.set_thresholds(array![1e300, 0.1]).unwrap();

        // Act
        let text = model_text(&model);
        let reloaded = LinearModel::<String, String>::read_text(Cursor::new(text.as_str())).unwrap();

        // Assert
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"0 0 1e-300"), "{text}");
        assert!(lines.contains(&"0 1 -2.5e17"), "{text}");
        assert!(lines.contains(&"1e300"), "{text}");
        assert!(lines.contains(&"1 0 -0.5"), "{text}");
        assert!(lines.iter().all(|l| l.len() < 24), "{text}");
        assert_eq!(reloaded.weights()[[0, 0]].to_bits(), 1e-300_f64.to_bits());
        assert_eq!(reloaded.weights()[[0, 1]].to_bits(), (-2.5e17_f64).to_bits());
        assert_eq!(reloaded.thresholds()[0].to_bits(), 1e300_f64.to_bits());
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let text = "0=a\n1=a\n\n\n\n2\n0\n0\n";
        assert!(matches!(
            LinearModel::<String, String>::read_text(Cursor::new(text)).unwrap_err(),
            ModelError::Data(_)
        ));
    }

    #[test]
    // Purpose
    // -------
    // Entries with line breaks cannot be written and nothing is emitted.
    fn line_breaks_are_unrepresentable() {
        let features = Index::from_values(vec!["multi\nline".to_string()]).unwrap();
        let labels = Index::from_values(vec!["a".to_string(), "b".to_string()]).unwrap();
        let model = LinearModel::from_flat(features, labels, &array![1.0, 2.0]).unwrap();
        let mut buf = Vec::new();
        let err = model.write_text(&mut buf).unwrap_err();
        assert_eq!(err, ModelError::UnrepresentableEntry { entry: "multi\nline".into() });
        assert!(buf.is_empty());
    }

    #[test]
    fn foreign_binary_versions_are_rejected() {
        let record = SerializedModelRef::<String, String> {
            features: &[],
            labels: &["a".to_string()],
            weights: vec![],
            thresholds: vec![0.0],
        };
        let mut bytes = bincode::serialize(&(FORMAT_VERSION + 1)).unwrap();
        bincode::serialize_into(&mut bytes, &record).unwrap();
        let current = weather_model().to_bytes().unwrap();
        assert_eq!(current[..4], FORMAT_VERSION.to_le_bytes());
        assert_eq!(
            LinearModel::<String, String>::from_bytes(&bytes).unwrap_err(),
            ModelError::UnsupportedVersion { found: FORMAT_VERSION + 1, supported: FORMAT_VERSION }
        );
        assert!(matches!(
            LinearModel::<String, String>::from_bytes(&[1, 2]).unwrap_err(),
            ModelError::Binary { .. }
        ));
    }
}
