use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use log::{debug, error, info, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinError;

use super::{ClassifyRejection, SessionState};
use crate::classifier::{Classifier, ModelLoadError, Prediction, PredictionError};

/// Blocking closure that materialises the classifier on a worker thread.
pub type Loader = Box<dyn FnOnce() -> Result<Classifier, ModelLoadError> + Send + 'static>;

type Notifier = Arc<dyn Fn() + Send + Sync>;

const DEFAULT_TOP_K: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(k) => k,
    None => unreachable!(),
};

/// Completion messages posted by background workers.
enum TaskEvent {
    ModelLoaded(Result<Classifier, ModelLoadError>),
    Classified {
        request: u64,
        result: Result<Prediction, PredictionError>,
    },
}

pub struct SessionControllerBuilder {
    runtime: Handle,
    top_k: NonZeroUsize,
    notifier: Option<Notifier>,
}

impl SessionControllerBuilder {
    /// Number of classes requested per classification (default 5)
    pub fn top_k(mut self, top_k: NonZeroUsize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Called from worker threads after each completion is queued, so the
    /// display loop can wake up and call [`SessionController::pump`].
    pub fn on_update(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notifier = Some(Arc::new(notify));
        self
    }

    /// Creates the controller and immediately schedules the model load.
    pub fn start<F>(self, loader: F) -> SessionController
    where
        F: FnOnce() -> Result<Classifier, ModelLoadError> + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut controller = SessionController {
            runtime: self.runtime,
            top_k: self.top_k,
            notifier: self.notifier,
            state: SessionState::Idle,
            classifier: OnceLock::new(),
            image_path: None,
            prediction: None,
            load_error: None,
            classify_error: None,
            next_request: 0,
            in_flight: None,
            revision: 0,
            events_tx,
            events_rx,
        };
        controller.begin_loading(Box::new(loader));
        controller
    }
}

/// Owns the session state machine. Lives on the display thread; all blocking
/// work runs on tokio's blocking pool and reports back through a channel.
///
/// At most one classification is in flight: further requests are rejected
/// with [`ClassifyRejection::Busy`] until it completes.
pub struct SessionController {
    runtime: Handle,
    top_k: usize,
    notifier: Option<Notifier>,
    state: SessionState,
    classifier: OnceLock<Arc<Classifier>>,
    image_path: Option<PathBuf>,
    prediction: Option<Prediction>,
    load_error: Option<ModelLoadError>,
    classify_error: Option<PredictionError>,
    next_request: u64,
    in_flight: Option<u64>,
    revision: u64,
    events_tx: mpsc::UnboundedSender<TaskEvent>,
    events_rx: mpsc::UnboundedReceiver<TaskEvent>,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("top_k", &self.top_k)
            .field("image_path", &self.image_path)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    pub fn builder(runtime: Handle) -> SessionControllerBuilder {
        SessionControllerBuilder {
            runtime,
            top_k: DEFAULT_TOP_K,
            notifier: None,
        }
    }

    fn begin_loading(&mut self, loader: Loader) {
        debug_assert_eq!(self.state, SessionState::Idle);
        self.state = SessionState::LoadingModel;
        info!("Loading model in the background...");

        self.spawn_worker(loader, |joined| {
            TaskEvent::ModelLoaded(
                joined.unwrap_or_else(|e| Err(ModelLoadError::Worker(e.to_string()))),
            )
        });
    }

    /// Records the image the next classification will use. Clears results
    /// shown for a previous image unless a classification is still running.
    pub fn select_image(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!("Selected image {:?}", path);
        self.image_path = Some(path);

        match self.state {
            SessionState::ResultsReady | SessionState::ClassificationFailed => {
                self.state = SessionState::ModelReady;
                self.prediction = None;
                self.classify_error = None;
            }
            _ => {}
        }
    }

    /// Starts classifying the selected image on a background worker.
    ///
    /// Returns the request id, or why nothing was started. Rejections leave
    /// the state untouched.
    pub fn request_classification(&mut self) -> Result<u64, ClassifyRejection> {
        let path = self.image_path.clone().ok_or(ClassifyRejection::NoImageSelected)?;
        let classifier = self
            .classifier
            .get()
            .map(Arc::clone)
            .ok_or(ClassifyRejection::ModelNotReady)?;
        if self.state == SessionState::Classifying {
            return Err(ClassifyRejection::Busy);
        }

        let request = self.next_request;
        self.next_request += 1;
        self.in_flight = Some(request);
        self.state = SessionState::Classifying;
        self.prediction = None;
        self.classify_error = None;
        info!("Classifying {:?} (request {})", path, request);

        let top_k = self.top_k.get();
        self.spawn_worker(
            move || classifier.predict(&path, top_k),
            move |joined| TaskEvent::Classified {
                request,
                result: joined.unwrap_or_else(|e| Err(PredictionError::Worker(e.to_string()))),
            },
        );
        Ok(request)
    }

    /// Applies every completion queued so far. Call once per display frame.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Waits for the next completion and applies it.
    pub async fn settle(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: TaskEvent) {
        self.revision += 1;
        match event {
            TaskEvent::ModelLoaded(Ok(classifier)) => {
                if self.classifier.set(Arc::new(classifier)).is_err() {
                    warn!("Ignoring a second loaded model");
                    return;
                }
                info!("Model loaded successfully");
                self.state = SessionState::ModelReady;
            }
            TaskEvent::ModelLoaded(Err(e)) => {
                error!("Model loading failed: {}", e);
                self.load_error = Some(e);
                self.state = SessionState::ModelFailed;
            }
            TaskEvent::Classified { request, result } => {
                if self.in_flight == Some(request) {
                    self.in_flight = None;
                }
                match result {
                    Ok(prediction) => {
                        info!("Classification {} complete", request);
                        self.prediction = Some(prediction);
                        self.state = SessionState::ResultsReady;
                    }
                    Err(e) => {
                        error!("Classification {} failed: {}", request, e);
                        self.classify_error = Some(e);
                        self.state = SessionState::ClassificationFailed;
                    }
                }
            }
        }
    }

    fn spawn_worker<T, W, M>(&self, work: W, into_event: M)
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        M: FnOnce(Result<T, JoinError>) -> TaskEvent + Send + 'static,
    {
        let events = self.events_tx.clone();
        let notifier = self.notifier.clone();
        let worker = self.runtime.spawn_blocking(work);

        self.runtime.spawn(async move {
            let event = into_event(worker.await);
            if events.send(event).is_ok() {
                if let Some(notify) = notifier {
                    notify();
                }
            }
        });
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once the model has loaded; never reverts.
    pub fn is_ready(&self) -> bool {
        self.classifier.get().is_some()
    }

    /// Whether the classify action should be enabled.
    pub fn can_classify(&self) -> bool {
        self.is_ready() && self.image_path.is_some() && self.state != SessionState::Classifying
    }

    pub fn classifier(&self) -> Option<&Arc<Classifier>> {
        self.classifier.get()
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn load_error(&self) -> Option<&ModelLoadError> {
        self.load_error.as_ref()
    }

    pub fn classify_error(&self) -> Option<&PredictionError> {
        self.classify_error.as_ref()
    }

    /// Count of background completions applied so far. Lets a display notice
    /// repeated outcomes that leave the state unchanged.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn top_k(&self) -> NonZeroUsize {
        self.top_k
    }
}
