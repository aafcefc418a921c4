//! Lazily trained predictor with single-flight initialization.
//!
//! The owner creates one [`ModelService`] per process and hands `Arc` clones to request
//! handlers.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock};

use tracing::{error, info};

use crate::config::PredictorConfig;
use crate::dataset::load_dataset;
use crate::error::{InitError, ServiceError};
use crate::predictor::Predictor;

/// Lifecycle of the shared predictor.
#[derive(Debug, Clone)]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Ready(Arc<Predictor>),
    /// Sticky until the process restarts.
    Failed(Arc<InitError>),
}

/// Payload-free view of [`ServiceState`] for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl ServiceState {
    pub fn status(&self) -> ServiceStatus {
        match self {
            Self::Uninitialized => ServiceStatus::Uninitialized,
            Self::Initializing => ServiceStatus::Initializing,
            Self::Ready(_) => ServiceStatus::Ready,
            Self::Failed(_) => ServiceStatus::Failed,
        }
    }
}

/// Produces a trained predictor. Called at most once per [`ModelService`].
pub trait PredictorLoader: Send + Sync {
    fn load(&self) -> Result<Predictor, InitError>;
}

impl<F> PredictorLoader for F
where
    F: Fn() -> Result<Predictor, InitError> + Send + Sync,
{
    fn load(&self) -> Result<Predictor, InitError> {
        self()
    }
}

/// Loads the configured CSV and trains on it.
#[derive(Debug, Clone)]
pub struct DatasetPredictorLoader {
    config: PredictorConfig,
}

impl DatasetPredictorLoader {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }
}

impl PredictorLoader for DatasetPredictorLoader {
    fn load(&self) -> Result<Predictor, InitError> {
        let dataset = &self.config.dataset;
        let table = load_dataset(&dataset.path, &dataset.label_column, dataset.min_samples)?;
        Predictor::train(table, &self.config.training)
    }
}

/// Owner of the one training attempt and its published outcome.
pub struct ModelService {
    state: Mutex<ServiceState>,
    /// Set once alongside `Ready`; read without taking `state`.
    published: OnceLock<Arc<Predictor>>,
    ready: Condvar,
    loader: Box<dyn PredictorLoader>,
    training_runs: AtomicUsize,
}

impl std::fmt::Debug for ModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelService")
            .field("status", &self.status())
            .field("training_runs", &self.training_runs())
            .finish_non_exhaustive()
    }
}

impl ModelService {
    pub fn new(loader: impl PredictorLoader + 'static) -> Self {
        Self {
            state: Mutex::new(ServiceState::Uninitialized),
            published: OnceLock::new(),
            ready: Condvar::new(),
            loader: Box::new(loader),
            training_runs: AtomicUsize::new(0),
        }
    }

    /// Service backed by the dataset named in `config`.
    pub fn from_config(config: PredictorConfig) -> Self {
        Self::new(DatasetPredictorLoader::new(config))
    }

    /// Snapshot of the current lifecycle state.
    pub fn state(&self) -> Result<ServiceState, ServiceError> {
        Ok(self.lock_state()?.clone())
    }

    /// Current status; a poisoned lock reads as `Failed`.
    pub fn status(&self) -> ServiceStatus {
        self.state()
            .map(|state| state.status())
            .unwrap_or(ServiceStatus::Failed)
    }

    /// Number of loader invocations so far. Never exceeds 1.
    pub fn training_runs(&self) -> usize {
        self.training_runs.load(Ordering::SeqCst)
    }

    /// Return the shared predictor, training it first if nobody has yet.
    ///
    /// Concurrent callers during initialization block until the single attempt finishes and
    /// all observe its outcome. A failed attempt is returned to every later caller. Once ready,
    /// the predictor is returned without locking.
    pub fn get_predictor(&self) -> Result<Arc<Predictor>, ServiceError> {
        if let Some(predictor) = self.published.get() {
            return Ok(Arc::clone(predictor));
        }
        let mut state = self.lock_state()?;
        loop {
            match &*state {
                ServiceState::Ready(predictor) => return Ok(Arc::clone(predictor)),
                ServiceState::Failed(err) => return Err(ServiceError::Unavailable(Arc::clone(err))),
                ServiceState::Initializing => {
                    state = self.ready.wait(state).map_err(|_| ServiceError::Poisoned)?;
                }
                ServiceState::Uninitialized => break,
            }
        }
        *state = ServiceState::Initializing;
        drop(state);
        info!("Model service initializing");

        let outcome = self.run_loader();

        let mut state = self.lock_state()?;
        let result = match outcome {
            Ok(predictor) => {
                let predictor = Arc::new(predictor);
                info!(
                    "Model service ready: {} classes, {} features, schema v{} {}",
                    predictor.classes().len(),
                    predictor.schema().len(),
                    predictor.schema().version(),
                    predictor.schema_fingerprint()
                );
                *state = ServiceState::Ready(Arc::clone(&predictor));
                let _ = self.published.set(Arc::clone(&predictor));
                Ok(predictor)
            }
            Err(err) => {
                error!("Model initialization failed: {err}");
                let err = Arc::new(err);
                *state = ServiceState::Failed(Arc::clone(&err));
                Err(ServiceError::Unavailable(err))
            }
        };
        drop(state);
        self.ready.notify_all();
        result
    }

    fn run_loader(&self) -> Result<Predictor, InitError> {
        self.training_runs.fetch_add(1, Ordering::SeqCst);
        catch_unwind(AssertUnwindSafe(|| self.loader.load())).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(InitError::Panicked(message))
        })
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ServiceState>, ServiceError> {
        self.state.lock().map_err(|_| ServiceError::Poisoned)
    }
}
