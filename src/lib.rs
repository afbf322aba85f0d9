//! rust_maxent — maximum-entropy (multiclass log-linear) classifiers with
//! Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes training and inference to Python via the `_rust_maxent`
//! extension module. When the `python-bindings` feature is enabled, this
//! module defines the Python-facing classes and the `classifier` submodule
//! used by the `rust_maxent` package.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules as the public crate surface:
//!   `encoding` (indexes, datums, encoded datasets, sparse text I/O),
//!   `optimization` (objective, priors, L-BFGS and SGD) and `classifier`
//!   (linear models, introspection, serialization, trainer).
//! - Define `#[pyclass]` wrappers and the `#[pymodule]` initializer for the
//!   `_rust_maxent` Python extension.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input validation, and error mapping.
//! - Python-side models use `String` features and labels.
//!
//! Conventions
//! -----------
//! - Errors from core Rust code are propagated as rich error types
//!   internally and converted to `PyErr` values at the PyO3 boundary.
//! - Probability vectors returned to Python follow the order of
//!   `MaxentClassifier.classes`, i.e. first-seen label order.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use rust_maxent::{
//!     classifier::{options::TrainerOptions, trainer::Trainer},
//!     encoding::{dataset::EncodedDataset, datum::Datum},
//! };
//!
//! let mut data = EncodedDataset::new_binary();
//! data.add(Datum::binary(vec!["sunny", "warm"], "go")).unwrap();
//! data.add(Datum::binary(vec!["rainy", "cold"], "stay")).unwrap();
//! let trained = Trainer::new(TrainerOptions::new()).train(&data).unwrap();
//! let label = trained.model.class_of(&[("sunny", 1.0)]);
//! ```
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   end-to-end pipeline test under `tests/`.

pub mod classifier;
pub mod encoding;
pub mod optimization;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    classifier::{
        introspection::TopFeatureQuery, linear::LinearModel, options::TrainerOptions,
        trainer::Trainer,
    },
    optimization::loglik_optimizer::OptimOutcome,
    utils::{PyRows, build_dataset, build_trainer_options, extract_f64_array},
};

/// MaxentClassifier — Python-facing maximum-entropy classifier.
///
/// Purpose
/// -------
/// Train and apply a [`LinearModel`] over string features and labels from
/// Python, forwarding all computation to [`Trainer`] and the model.
///
/// Parameters
/// ----------
/// Constructed from Python via `MaxentClassifier(prior='quadratic',
/// sigma=1.0, ...)`; every keyword maps onto [`TrainerOptions`] and the
/// optimizer options (see `utils::build_trainer_options`).
///
/// Notes
/// -----
/// - `fit` uses fallback training, so `fallback_sigmas` are honored.
/// - Inference methods raise `ValueError` before `fit` or `load`.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_maxent.classifier")]
pub struct MaxentClassifier {
    options: TrainerOptions,
    model: Option<LinearModel<String, String>>,
    outcome: Option<OptimOutcome>,
}

#[cfg(feature = "python-bindings")]
impl MaxentClassifier {
    fn fitted(&self) -> PyResult<&LinearModel<String, String>> {
        self.model.as_ref().ok_or_else(|| {
            PyValueError::new_err("model is not fitted; call fit() or load() first")
        })
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MaxentClassifier {
    #[new]
    #[pyo3(
        signature = (
            prior = None,
            sigma = None,
            epsilon = None,
            mode = None,
            method = None,
            tol_grad = None,
            tol_cost = None,
            max_iter = None,
            line_searcher = None,
            lbfgs_mem = None,
            verbose = None,
            epochs = None,
            batch_size = None,
            gain = None,
            decay = None,
            sampling = None,
            seed = None,
            fallback_sigmas = None,
        ),
        text_signature = "(prior='quadratic', sigma=1.0, epsilon=None, mode='standard', \
                          method='lbfgs', tol_grad=None, tol_cost=None, max_iter=None, \
                          line_searcher=None, lbfgs_mem=None, verbose=False, epochs=None, \
                          batch_size=None, gain=None, decay=None, sampling=None, seed=None, \
                          fallback_sigmas=None)"
    )]
    pub fn new(
        prior: Option<&str>, sigma: Option<f64>, epsilon: Option<f64>, mode: Option<&str>,
        method: Option<&str>, tol_grad: Option<f64>, tol_cost: Option<f64>,
        max_iter: Option<usize>, line_searcher: Option<&str>, lbfgs_mem: Option<usize>,
        verbose: Option<bool>, epochs: Option<usize>, batch_size: Option<usize>,
        gain: Option<f64>, decay: Option<f64>, sampling: Option<&str>, seed: Option<u64>,
        fallback_sigmas: Option<Vec<f64>>,
    ) -> PyResult<Self> {
        let options = build_trainer_options(
            prior,
            sigma,
            epsilon,
            mode,
            method,
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            verbose,
            epochs,
            batch_size,
            gain,
            decay,
            sampling,
            seed,
            fallback_sigmas,
        )?;
        Ok(MaxentClassifier { options, model: None, outcome: None })
    }

    #[pyo3(
        signature = (features, labels, sample_weight = None),
        text_signature = "(self, features, labels, /, sample_weight=None)"
    )]
    pub fn fit<'py>(
        &mut self, py: Python<'py>, features: PyRows, labels: Vec<String>,
        sample_weight: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<()> {
        let dataset = build_dataset(features, labels)?;
        let mut options = self.options.clone();
        if let Some(raw) = sample_weight {
            let weights = extract_f64_array(py, raw)?;
            let slice = weights.as_slice().map_err(|_| {
                PyValueError::new_err("sample_weight must be a 1-D contiguous float64 array")
            })?;
            options = options.with_example_weights(slice.to_vec());
        }
        let trained = Trainer::new(options).train_with_fallback(&dataset)?;
        self.model = Some(trained.model);
        self.outcome = Some(trained.outcome);
        Ok(())
    }

    pub fn predict(&self, features: PyRows) -> PyResult<Vec<String>> {
        let model = self.fitted()?;
        Ok(features.iter().map(|row| model.class_of(row).clone()).collect())
    }

    pub fn predict_proba(&self, features: PyRows) -> PyResult<Vec<Vec<f64>>> {
        let model = self.fitted()?;
        Ok(features
            .iter()
            .map(|row| model.probabilities_of(row).into_iter().map(|(_, p)| p).collect())
            .collect())
    }

    pub fn score(&self, features: PyRows, labels: Vec<String>) -> PyResult<f64> {
        let model = self.fitted()?;
        Ok(model.accuracy(&build_dataset(features, labels)?))
    }

    #[pyo3(signature = (limit = None, label = None))]
    pub fn top_features(
        &self, limit: Option<usize>, label: Option<String>,
    ) -> PyResult<Vec<(String, String, f64)>> {
        let model = self.fitted()?;
        let query =
            TopFeatureQuery { labels: label.map(|l| vec![l]), limit, ..Default::default() };
        Ok(model
            .top_features(&query)
            .into_iter()
            .map(|e| (e.feature.clone(), e.label.clone(), e.weight))
            .collect())
    }

    #[pyo3(signature = (path, binary = None))]
    pub fn save(&self, path: &str, binary: Option<bool>) -> PyResult<()> {
        let model = self.fitted()?;
        if binary.unwrap_or(false) { model.save_binary(path)? } else { model.save_text(path)? }
        Ok(())
    }

    #[staticmethod]
    #[pyo3(signature = (path, binary = None))]
    pub fn load(path: &str, binary: Option<bool>) -> PyResult<Self> {
        let model = if binary.unwrap_or(false) {
            LinearModel::load_binary(path)?
        } else {
            LinearModel::load_text(path)?
        };
        Ok(MaxentClassifier { options: TrainerOptions::default(), model: Some(model), outcome: None })
    }

    #[getter]
    pub fn classes(&self) -> PyResult<Vec<String>> {
        Ok(self.fitted()?.labels().to_vec())
    }

    #[getter]
    pub fn results(&self) -> PyResult<MaxentOptimOutcome> {
        match &self.outcome {
            Some(outcome) => Ok(MaxentOptimOutcome { inner: outcome.clone() }),
            None => Err(PyValueError::new_err("no training results; the model was not fitted here")),
        }
    }
}

/// MaxentOptimOutcome — optimizer diagnostics of a `fit` call.
///
/// Notes
/// -----
/// - This type is part of the Python FFI surface; Rust code should prefer
///   using [`OptimOutcome`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_maxent.classifier")]
pub struct MaxentOptimOutcome {
    pub inner: OptimOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl MaxentOptimOutcome {
    #[getter]
    pub fn x_hat(&self) -> Vec<f64> {
        self.inner.x_hat.to_vec()
    }

    #[getter]
    pub fn value(&self) -> f64 {
        self.inner.value
    }

    #[getter]
    pub fn converged(&self) -> bool {
        self.inner.converged
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.status.clone()
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    pub fn grad_norm(&self) -> Option<f64> {
        self.inner.grad_norm
    }

    #[getter]
    pub fn fn_evals(&self) -> Vec<(String, u64)> {
        self.inner.fn_evals.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}

/// Initialize the `_rust_maxent` Python extension module.
///
/// Registers the `classifier` submodule and adds it to `sys.modules` so that
/// `import rust_maxent.classifier` works with dot notation.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_maxent<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let classifier_mod = PyModule::new(_py, "classifier")?;
    classifier(_py, m, &classifier_mod)?;

    _py.import("sys")?.getattr("modules")?.set_item("rust_maxent.classifier", classifier_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn classifier<'py>(
    _py: Python, rust_maxent: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<MaxentClassifier>()?;
    m.add_class::<MaxentOptimOutcome>()?;
    rust_maxent.add_submodule(m)?;
    Ok(())
}
