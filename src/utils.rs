#[cfg(feature = "python-bindings")]
use std::str::FromStr;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    classifier::options::{TrainerOptions, TrainingMethod},
    encoding::{dataset::EncodedDataset, datum::Datum},
    optimization::{
        loglik_optimizer::{
            LineSearcher, MLEOptions, SamplingMethod, SgdOptions, Tolerances,
        },
        objective::ObjectiveMode,
        prior::PriorKind,
    },
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

/// Python rows: one list of `(feature, value)` pairs per example.
#[cfg(feature = "python-bindings")]
pub type PyRows = Vec<Vec<(String, f64)>>;

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Encode Python rows and labels into a fresh real-valued dataset.
#[cfg(feature = "python-bindings")]
pub fn build_dataset(
    features: PyRows, labels: Vec<String>,
) -> PyResult<EncodedDataset<String, String>> {
    if features.len() != labels.len() {
        return Err(PyValueError::new_err(format!(
            "features has {} rows but labels has {} entries",
            features.len(),
            labels.len()
        )));
    }
    let mut dataset = EncodedDataset::new_real_valued();
    for (row, label) in features.into_iter().zip(labels) {
        dataset.add(Datum::real_valued(row, label))?;
    }
    Ok(dataset)
}

/// Trainer options from the keyword arguments of `MaxentClassifier(...)`.
///
/// `method="sgd"` reads the SGD keywords; otherwise the L-BFGS ones apply.
#[cfg(feature = "python-bindings")]
pub fn build_trainer_options(
    prior: Option<&str>, sigma: Option<f64>, epsilon: Option<f64>, mode: Option<&str>,
    method: Option<&str>, tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: Option<bool>,
    epochs: Option<usize>, batch_size: Option<usize>, gain: Option<f64>, decay: Option<f64>,
    sampling: Option<&str>, seed: Option<u64>, fallback_sigmas: Option<Vec<f64>>,
) -> PyResult<TrainerOptions> {
    let kind = match prior {
        Some(name) => PriorKind::from_str(name)?,
        None => PriorKind::Quadratic,
    };
    let mut options = TrainerOptions::new().with_prior(kind, sigma.unwrap_or(1.0))?;
    if let Some(epsilon) = epsilon {
        options = options.with_epsilon(epsilon)?;
    }
    if let Some(mode) = mode {
        options = options.with_mode(ObjectiveMode::from_str(mode)?);
    }

    let method = match method.map(TrainingMethod::from_str).transpose()? {
        Some(TrainingMethod::Sgd(_)) => TrainingMethod::Sgd(extract_sgd_opts(
            epochs, batch_size, gain, decay, sampling, seed, tol_grad,
        )?),
        _ => TrainingMethod::Lbfgs(extract_mle_opts(
            tol_grad,
            tol_cost,
            max_iter,
            line_searcher,
            lbfgs_mem,
            verbose,
        )?),
    };
    options = options.with_method(method);

    if let Some(sigmas) = fallback_sigmas {
        options = options.with_fallback_sigmas(sigmas)?;
    }
    Ok(options)
}

#[cfg(feature = "python-bindings")]
fn extract_mle_opts(
    tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    line_searcher: Option<&str>, lbfgs_mem: Option<usize>, verbose: Option<bool>,
) -> PyResult<MLEOptions> {
    let defaults = MLEOptions::default();
    let tols = if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        defaults.tols
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter)?
    };
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name)?,
        None => defaults.line_searcher,
    };
    Ok(MLEOptions::new(tols, ls, verbose.unwrap_or(false), lbfgs_mem)?)
}

#[cfg(feature = "python-bindings")]
fn extract_sgd_opts(
    epochs: Option<usize>, batch_size: Option<usize>, gain: Option<f64>, decay: Option<f64>,
    sampling: Option<&str>, seed: Option<u64>, tol_grad: Option<f64>,
) -> PyResult<SgdOptions> {
    let defaults = SgdOptions::default();
    let sampling = match sampling {
        Some(name) => SamplingMethod::from_str(name)?,
        None => defaults.sampling,
    };
    Ok(SgdOptions::new(
        epochs.unwrap_or(defaults.epochs),
        batch_size.unwrap_or(defaults.batch_size),
        gain.unwrap_or(defaults.gain),
        decay.unwrap_or(defaults.decay),
        sampling,
        seed.unwrap_or(defaults.seed),
        tol_grad.or(defaults.tol_grad),
    )?)
}
