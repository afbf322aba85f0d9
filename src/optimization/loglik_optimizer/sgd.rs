//! loglik_optimizer::sgd — mini-batch stochastic gradient descent.
//!
//! Purpose
//! -------
//! Drive a [`StochasticDiffFunction`] with plain SGD: each epoch walks a
//! sequence of mini-batches produced by [`BatchSampler`] and calls the
//! objective's in-place update with a decaying gain.
//!
//! Key behaviors
//! -------------
//! - Gain schedule `gain / (1 + decay · epoch)`.
//! - Batches are ordered, reshuffled every epoch, or drawn with
//!   replacement; all randomness comes from one seeded `StdRng`, so a run
//!   is reproducible from its [`SgdOptions`].
//! - Optional early stop when the full-gradient norm drops below
//!   `tol_grad` (checked once per epoch).
//! - Results are reported through the same [`OptimOutcome`] as L-BFGS.
//!
//! Invariants & assumptions
//! ------------------------
//! - `epochs > 0`, `batch_size > 0`, `gain` finite and positive, `decay`
//!   finite and non-negative; enforced by [`SgdOptions::new`].
//! - A batch size larger than the dataset is clamped to the dataset size.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        FnEvalMap, OptimOutcome, Theta, traits::StochasticDiffFunction,
        validation::verify_tol_grad,
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::str::FromStr;

/// How mini-batches are formed each epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMethod {
    /// Consecutive slices of the dataset in stored order.
    Ordered,
    /// A fresh permutation every epoch, then consecutive slices.
    Shuffled,
    /// `⌈n / batch⌉` batches of uniform draws with replacement.
    WithReplacement,
}

impl FromStr for SamplingMethod {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ordered" => Ok(SamplingMethod::Ordered),
            "shuffled" | "shuffle" => Ok(SamplingMethod::Shuffled),
            "withreplacement" | "with-replacement" | "replacement" => {
                Ok(SamplingMethod::WithReplacement)
            }
            _ => Err(OptError::InvalidSamplingMethod { name: s.to_string() }),
        }
    }
}

/// Seeded generator of mini-batches over `0..len`.
#[derive(Debug, Clone)]
pub struct BatchSampler {
    len: usize,
    batch_size: usize,
    method: SamplingMethod,
    order: Vec<usize>,
    rng: StdRng,
}

impl BatchSampler {
    /// # Errors
    /// - [`OptError::EmptyBatch`] when `len == 0`.
    /// - [`OptError::InvalidSgdOption`] when `batch_size == 0`.
    pub fn new(len: usize, batch_size: usize, method: SamplingMethod, seed: u64) -> OptResult<Self> {
        if len == 0 {
            return Err(OptError::EmptyBatch);
        }
        if batch_size == 0 {
            return Err(OptError::InvalidSgdOption {
                name: "batch_size",
                value: 0.0,
                reason: "Batch size must be positive.",
            });
        }
        Ok(Self {
            len,
            batch_size: batch_size.min(len),
            method,
            order: (0..len).collect(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Batches for one pass over the data.
    pub fn epoch(&mut self) -> Vec<Vec<usize>> {
        match self.method {
            SamplingMethod::Ordered => {
                self.order.chunks(self.batch_size).map(<[usize]>::to_vec).collect()
            }
            SamplingMethod::Shuffled => {
                self.order.shuffle(&mut self.rng);
                self.order.chunks(self.batch_size).map(<[usize]>::to_vec).collect()
            }
            SamplingMethod::WithReplacement => {
                let batches = self.len.div_ceil(self.batch_size);
                (0..batches)
                    .map(|_| {
                        (0..self.batch_size)
                            .map(|_| self.rng.gen_range(0..self.len))
                            .collect::<Vec<usize>>()
                    })
                    .collect()
            }
        }
    }
}

/// Validated SGD configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SgdOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub gain: f64,
    pub decay: f64,
    pub sampling: SamplingMethod,
    pub seed: u64,
    pub tol_grad: Option<f64>,
}

impl SgdOptions {
    /// # Errors
    /// [`OptError::InvalidSgdOption`] naming the offending field, or
    /// [`OptError::InvalidTolGrad`] for a bad gradient tolerance.
    pub fn new(
        epochs: usize, batch_size: usize, gain: f64, decay: f64, sampling: SamplingMethod,
        seed: u64, tol_grad: Option<f64>,
    ) -> OptResult<Self> {
        if epochs == 0 {
            return Err(OptError::InvalidSgdOption {
                name: "epochs",
                value: 0.0,
                reason: "At least one epoch is required.",
            });
        }
        if batch_size == 0 {
            return Err(OptError::InvalidSgdOption {
                name: "batch_size",
                value: 0.0,
                reason: "Batch size must be positive.",
            });
        }
        if !gain.is_finite() || gain <= 0.0 {
            return Err(OptError::InvalidSgdOption {
                name: "gain",
                value: gain,
                reason: "Gain must be finite and positive.",
            });
        }
        if !decay.is_finite() || decay < 0.0 {
            return Err(OptError::InvalidSgdOption {
                name: "decay",
                value: decay,
                reason: "Decay must be finite and non-negative.",
            });
        }
        verify_tol_grad(tol_grad)?;
        Ok(Self { epochs, batch_size, gain, decay, sampling, seed, tol_grad })
    }

    /// Gain used during `epoch` (0-based).
    pub fn gain_at(&self, epoch: usize) -> f64 {
        self.gain / (1.0 + self.decay * epoch as f64)
    }
}

impl Default for SgdOptions {
    fn default() -> Self {
        Self {
            epochs: 20,
            batch_size: 16,
            gain: 0.1,
            decay: 0.1,
            sampling: SamplingMethod::Shuffled,
            seed: 0,
            tol_grad: None,
        }
    }
}

/// Run mini-batch SGD from `x0`.
///
/// The returned [`OptimOutcome`] carries the full-data value and gradient
/// norm at the final point. `iterations` counts epochs; `fn_evals` holds
/// `batch_update_count` and `gradient_count` (full evaluations).
///
/// # Errors
/// - Propagates `f.check`, sampler construction and objective errors.
/// - `NonFiniteCost` if an epoch's accumulated batch value is not finite.
pub fn run_sgd<F: StochasticDiffFunction>(
    f: &F, x0: Theta, opts: &SgdOptions,
) -> OptResult<OptimOutcome> {
    f.check(&x0)?;
    let mut sampler = BatchSampler::new(f.data_len(), opts.batch_size, opts.sampling, opts.seed)?;
    let mut x = x0;
    let mut updates = 0u64;
    let mut full_evals = 0u64;
    let mut epochs_run = 0u64;
    let mut converged = false;

    for epoch in 0..opts.epochs {
        let gain = opts.gain_at(epoch);
        let mut epoch_value = 0.0;
        for batch in sampler.epoch() {
            epoch_value += f.stochastic_update(&mut x, &batch, gain)?;
            updates += 1;
        }
        epochs_run += 1;
        if !epoch_value.is_finite() {
            return Err(OptError::NonFiniteCost { value: epoch_value });
        }
        log::debug!("SGD epoch {epoch}: summed batch value {epoch_value:.6}, gain {gain:.4e}");

        if let Some(tol) = opts.tol_grad {
            let grad = f.gradient(&x)?;
            full_evals += 1;
            if grad.l2_norm() < tol {
                converged = true;
                break;
            }
        }
    }

    let (value, grad) = f.value_and_gradient(&x)?;
    full_evals += 1;
    let mut fn_evals = FnEvalMap::new();
    fn_evals.insert("batch_update_count".to_string(), updates);
    fn_evals.insert("gradient_count".to_string(), full_evals);
    let reason = if converged {
        TerminationReason::SolverConverged
    } else {
        TerminationReason::MaxItersReached
    };
    OptimOutcome::new(
        Some(x),
        value,
        TerminationStatus::Terminated(reason),
        epochs_run,
        fn_evals,
        Some(grad),
    )
}
