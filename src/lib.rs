//! # Stock Forecaster
//!
//! Runs [`price_forecast`] training and forecasting off the calling thread.
//!
//! A job reports exactly once through a [`JobHandle`], as a [`JobOutcome`].
//! Dropping the handle detaches the worker and its outcome is discarded.
//!
//! ## Example
//!
//! ```no_run
//! use price_forecast::{DataLoader, ModelConfig};
//! use stock_forecaster::{ForecastJob, JobOutcome, ModelSlot};
//!
//! let frame = DataLoader::from_csv("prices.csv").unwrap();
//! let slot = ModelSlot::new();
//!
//! match ForecastJob::spawn(frame, ModelConfig::default()).wait() {
//!     JobOutcome::Completed(run) => {
//!         slot.set(run.artifacts.clone());
//!         println!("{} forecast rows", run.forecast.len());
//!     }
//!     JobOutcome::Failed(err) => eprintln!("{:?}: {}", err.kind(), err),
//! }
//! ```

use price_forecast::{
    train_artifacts, ForecastError, ForecastResult, ModelConfig, TimeSeriesFrame, TrainedArtifacts,
};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::{debug, info, warn};

/// Artifacts and forecast produced by a successful job
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub artifacts: Arc<TrainedArtifacts>,
    pub forecast: ForecastResult,
}

/// What a job reports when it finishes
#[derive(Debug)]
pub enum JobOutcome {
    Completed(ForecastRun),
    Failed(ForecastError),
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed(_))
    }

    /// Convert into a `Result`, for callers that want `?`
    pub fn into_result(self) -> Result<ForecastRun, ForecastError> {
        match self {
            JobOutcome::Completed(run) => Ok(run),
            JobOutcome::Failed(err) => Err(err),
        }
    }
}

/// Spawns train/forecast work on worker threads
pub struct ForecastJob;

impl ForecastJob {
    /// Train on `frame` with `config`, then forecast `config.forecast_period`
    /// steps past its end.
    pub fn spawn(frame: TimeSeriesFrame, config: ModelConfig) -> JobHandle {
        info!(
            rows = frame.len(),
            epochs = config.epochs,
            forecast_period = config.forecast_period,
            "spawning training job"
        );
        Self::run(move || {
            let artifacts = Arc::new(train_artifacts(&frame, &config)?);
            let forecast = artifacts.forecast(&frame, config.forecast_period)?;
            Ok(ForecastRun {
                artifacts,
                forecast,
            })
        })
    }

    /// Forecast with already trained artifacts; nothing is refit.
    pub fn spawn_forecast(
        artifacts: Arc<TrainedArtifacts>,
        frame: TimeSeriesFrame,
        forecast_period: usize,
    ) -> JobHandle {
        info!(rows = frame.len(), forecast_period, "spawning forecast job");
        Self::run(move || {
            let forecast = artifacts.forecast(&frame, forecast_period)?;
            Ok(ForecastRun {
                artifacts,
                forecast,
            })
        })
    }

    fn run<F>(work: F) -> JobHandle
    where
        F: FnOnce() -> Result<ForecastRun, ForecastError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let outcome = match work() {
                Ok(run) => {
                    info!(rows = run.forecast.len(), "job completed");
                    JobOutcome::Completed(run)
                }
                Err(err) => {
                    warn!(kind = ?err.kind(), error = %err, "job failed");
                    JobOutcome::Failed(err)
                }
            };
            if sender.send(outcome).is_err() {
                debug!("job handle dropped, discarding outcome");
            }
        });

        JobHandle {
            receiver,
            outcome: None,
            reported: false,
        }
    }
}

/// Receiving end of a spawned job
pub struct JobHandle {
    receiver: Receiver<JobOutcome>,
    outcome: Option<JobOutcome>,
    reported: bool,
}

impl JobHandle {
    /// Block until the job reports
    pub fn wait(mut self) -> JobOutcome {
        if let Some(outcome) = self.outcome.take() {
            return outcome;
        }
        self.receiver.recv().unwrap_or_else(|_| worker_vanished())
    }

    /// Take the outcome if the job has finished, without blocking.
    ///
    /// Returns `Some` at most once.
    pub fn try_outcome(&mut self) -> Option<JobOutcome> {
        self.poll();
        self.outcome.take()
    }

    /// True once the job has reported, whether or not the outcome was taken
    pub fn is_finished(&mut self) -> bool {
        self.poll();
        self.reported
    }

    fn poll(&mut self) {
        if self.reported {
            return;
        }
        match self.receiver.try_recv() {
            Ok(outcome) => self.outcome = Some(outcome),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => self.outcome = Some(worker_vanished()),
        }
        self.reported = true;
    }
}

// The worker panicked before sending.
fn worker_vanished() -> JobOutcome {
    JobOutcome::Failed(ForecastError::ComputationError(
        "Worker stopped without reporting an outcome".to_string(),
    ))
}

/// Holds the most recently trained artifacts.
///
/// Readers get a cheap `Arc` clone, so forecasts may keep using an artifact
/// set after it has been replaced or cleared.
#[derive(Debug, Default)]
pub struct ModelSlot {
    current: Mutex<Option<Arc<TrainedArtifacts>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `artifacts`, returning the previous ones
    pub fn set(&self, artifacts: Arc<TrainedArtifacts>) -> Option<Arc<TrainedArtifacts>> {
        self.lock().replace(artifacts)
    }

    pub fn get(&self) -> Option<Arc<TrainedArtifacts>> {
        self.lock().clone()
    }

    /// Forget the stored artifacts, e.g. when new data is loaded
    pub fn clear(&self) -> Option<Arc<TrainedArtifacts>> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<TrainedArtifacts>>> {
        // a poisoned slot still holds a complete value
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
