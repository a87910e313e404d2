//! Stateful front end of the splitter: one operation state and one archive slot.
//!
//! ```text
//!            run()              ok
//!  Idle ───────────▶ Processing ───▶ Success ──┐
//!   ▲                    │                     │ run() clears the old archive
//!   │ reset()            └──────▶ Failure ─────┤
//!   └──────────────────────────────────────────┘
//! ```
//!
//! A session is what a UI holds on to. It never runs two splits at once: a
//! second [`SplitSession::run`] while one is processing is rejected, and so is
//! [`SplitSession::reset`].
//!
//! Input that is not a PDF goes straight from `Idle` to `Failure`. If the
//! future returned by `run` is dropped before it finishes, the session lands
//! in `Failure` with [`MSG_UNEXPECTED`] instead of staying in `Processing`.

use crate::archive::ArchiveBlob;
use crate::config::SplitConfig;
use crate::error::{SplitError, MSG_UNEXPECTED};
use crate::output::{labelled_success_message, SplitOutput};
use crate::pipeline::input::SplitInput;
use crate::progress::{FanOut, ProgressCallback, SplitProgressCallback};
use crate::split::split;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Shown while the document is being parsed.
pub const MSG_LOADING: &str = "Loading PDF…";

/// Progress line for 1-indexed `page_num`.
pub fn page_progress_message(page_num: usize, total_pages: usize) -> String {
    format!("Processing page {} of {}…", page_num, total_pages)
}

/// Where a session currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OperationState {
    /// Waiting for a file.
    Idle,
    /// A run is in flight; `message` describes the current step.
    Processing { message: String },
    /// The archive is ready for download.
    Success {
        page_count: usize,
        format_label: String,
    },
    /// The last run failed; `message` is the user-facing reason.
    Failure { message: String },
}

impl OperationState {
    /// Text a UI shows for this state. Empty when idle.
    pub fn message(&self) -> String {
        match self {
            OperationState::Idle => String::new(),
            OperationState::Processing { message } | OperationState::Failure { message } => {
                message.clone()
            }
            OperationState::Success {
                page_count,
                format_label,
            } => labelled_success_message(*page_count, format_label),
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, OperationState::Processing { .. })
    }
}

struct Inner {
    state: OperationState,
    output: Option<SplitOutput>,
    /// Bumped at the start of every run.
    run_id: u64,
}

/// Holds the state of one user's split workflow.
///
/// Cheap to share: wrap it in an `Arc` and call it from any task.
pub struct SplitSession {
    inner: Arc<Mutex<Inner>>,
}

impl Default for SplitSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SplitSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("SplitSession")
            .field("state", &inner.state)
            .field("archive", &inner.output.as_ref().map(|o| &o.archive))
            .finish()
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // A panicking observer must not brick the session.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SplitSession {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: OperationState::Idle,
                output: None,
                run_id: 0,
            })),
        }
    }

    /// Current state.
    pub fn state(&self) -> OperationState {
        lock(&self.inner).state.clone()
    }

    /// Split `input` and move to `Success` or `Failure`.
    ///
    /// Any archive from an earlier run is discarded as soon as the run starts.
    /// Split failures are reported through the returned state, not as `Err`.
    ///
    /// # Errors
    /// [`SplitError::RunInProgress`] if this session is already processing;
    /// the running split is left untouched.
    pub async fn run(
        &self,
        input: SplitInput,
        config: &SplitConfig,
    ) -> Result<OperationState, SplitError> {
        let run_id = match self.start_run(&input)? {
            RunStart::Rejected(state) => return Ok(state),
            RunStart::Started(run_id) => run_id,
        };
        let mut guard = RunGuard {
            inner: &self.inner,
            run_id,
            armed: true,
        };

        let config = self.observed_config(config, run_id);
        let result = split(input, &config).await;

        let state = {
            let mut inner = lock(&self.inner);
            let state = match result {
                Ok(output) => {
                    let state = OperationState::Success {
                        page_count: output.stats.total_pages,
                        format_label: output.stats.mode.label().to_string(),
                    };
                    inner.output = Some(output);
                    state
                }
                Err(e) => OperationState::Failure {
                    message: e.user_message(),
                },
            };
            inner.state = state.clone();
            state
        };
        guard.armed = false;

        debug!("Session state: {:?}", state);
        Ok(state)
    }

    /// Claim the session for a run of `input`.
    ///
    /// Input that fails validation moves the session to `Failure` right away
    /// and never enters `Processing`.
    fn start_run(&self, input: &SplitInput) -> Result<RunStart, SplitError> {
        let mut inner = lock(&self.inner);
        if inner.state.is_processing() {
            warn!("Rejected run of '{}': session busy", input.name);
            return Err(SplitError::RunInProgress);
        }
        inner.output = None;

        if let Err(e) = input.validate() {
            debug!("Rejected '{}' before loading: {}", input.name, e);
            inner.state = OperationState::Failure {
                message: e.user_message(),
            };
            return Ok(RunStart::Rejected(inner.state.clone()));
        }

        inner.run_id += 1;
        inner.state = OperationState::Processing {
            message: MSG_LOADING.to_string(),
        };
        Ok(RunStart::Started(inner.run_id))
    }

    /// The finished archive, available only in `Success`.
    pub fn download(&self) -> Option<ArchiveBlob> {
        let inner = lock(&self.inner);
        match inner.state {
            OperationState::Success { .. } => inner.output.as_ref().map(|o| o.archive.clone()),
            _ => None,
        }
    }

    /// Full result of the last successful run, available only in `Success`.
    pub fn output(&self) -> Option<SplitOutput> {
        let inner = lock(&self.inner);
        match inner.state {
            OperationState::Success { .. } => inner.output.clone(),
            _ => None,
        }
    }

    /// Drop the archive and return to `Idle`.
    ///
    /// # Errors
    /// [`SplitError::RunInProgress`] while processing.
    pub fn reset(&self) -> Result<(), SplitError> {
        let mut inner = lock(&self.inner);
        if inner.state.is_processing() {
            return Err(SplitError::RunInProgress);
        }
        inner.output = None;
        inner.state = OperationState::Idle;
        Ok(())
    }

    /// The caller's config with the session's own observer added in front.
    fn observed_config(&self, config: &SplitConfig, run_id: u64) -> SplitConfig {
        let mut observers: Vec<ProgressCallback> = vec![Arc::new(StateUpdater {
            inner: Arc::clone(&self.inner),
            run_id,
        })];
        if let Some(cb) = &config.progress_callback {
            observers.push(Arc::clone(cb));
        }

        let mut config = config.clone();
        config.progress_callback = Some(Arc::new(FanOut(observers)));
        config
    }
}

enum RunStart {
    /// Processing began under this run id.
    Started(u64),
    /// The input was refused; the session is already in this state.
    Rejected(OperationState),
}

/// Moves the session out of `Processing` if its run is abandoned.
struct RunGuard<'a> {
    inner: &'a Mutex<Inner>,
    run_id: u64,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.run_id == self.run_id && inner.state.is_processing() {
            warn!("Split run {} ended without a result", self.run_id);
            inner.output = None;
            inner.state = OperationState::Failure {
                message: MSG_UNEXPECTED.to_string(),
            };
        }
    }
}

/// Keeps the `Processing` message in step with the pipeline.
struct StateUpdater {
    inner: Arc<Mutex<Inner>>,
    run_id: u64,
}

impl SplitProgressCallback for StateUpdater {
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let mut inner = lock(&self.inner);
        if inner.run_id == self.run_id && inner.state.is_processing() {
            inner.state = OperationState::Processing {
                message: page_progress_message(page_num, total_pages),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputMode;
    use crate::document::SourceDocument;
    use crate::error::PageError;
    use crate::pipeline::extract::{LopdfExtractor, PageExtractor};
    use crate::pipeline::fixtures::create_test_pdf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn state_messages() {
        assert_eq!(OperationState::Idle.message(), "");
        assert_eq!(
            OperationState::Success {
                page_count: 4,
                format_label: "PNG".into()
            }
            .message(),
            "Successfully split into 4 individual PNG files."
        );
        assert_eq!(page_progress_message(2, 5), "Processing page 2 of 5…");
    }

    #[test]
    fn state_serialises_with_tag() {
        let json = serde_json::to_value(OperationState::Failure {
            message: "nope".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "failure");
        assert_eq!(json["message"], "nope");
    }

    #[tokio::test]
    async fn success_then_download_then_reset() {
        let session = SplitSession::new();
        assert_eq!(session.state(), OperationState::Idle);
        assert!(session.download().is_none());

        let state = session
            .run(
                SplitInput::new("report.pdf", create_test_pdf(3)),
                &SplitConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            state.message(),
            "Successfully split into 3 individual PDF files."
        );

        let blob = session.download().expect("archive after success");
        assert_eq!(blob.name(), "report.zip");
        assert_eq!(blob.entries().len(), 3);

        session.reset().unwrap();
        assert_eq!(session.state(), OperationState::Idle);
        assert!(session.download().is_none());
    }

    #[tokio::test]
    async fn failure_carries_user_message() {
        let session = SplitSession::new();
        let state = session
            .run(SplitInput::new("notes.txt", b"hello".to_vec()), &SplitConfig::default())
            .await
            .unwrap();
        assert_eq!(
            state,
            OperationState::Failure {
                message: "Please select a PDF file.".into()
            }
        );
        assert!(session.download().is_none());
    }

    #[tokio::test]
    async fn new_run_discards_previous_archive() {
        let session = SplitSession::new();
        session
            .run(
                SplitInput::new("first.pdf", create_test_pdf(2)),
                &SplitConfig::default(),
            )
            .await
            .unwrap();
        assert!(session.download().is_some());

        let state = session
            .run(
                SplitInput::new("second.pdf", create_test_pdf(1)),
                &SplitConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            state.message(),
            "The PDF has only one page. No splitting is needed."
        );
        assert!(session.download().is_none());
    }

    #[tokio::test]
    async fn caller_callback_still_receives_events() {
        #[derive(Default)]
        struct Count(AtomicUsize);
        impl SplitProgressCallback for Count {
            fn on_page_complete(&self, _: usize, _: usize, _: usize) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let count = Arc::new(Count::default());
        let config = SplitConfig::builder()
            .mode(OutputMode::Pdf)
            .progress_callback(count.clone())
            .build()
            .unwrap();

        SplitSession::new()
            .run(SplitInput::new("four.pdf", create_test_pdf(4)), &config)
            .await
            .unwrap();
        assert_eq!(count.0.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn reset_is_rejected_while_processing() {
        let session = SplitSession::new();
        lock(&session.inner).state = OperationState::Processing {
            message: MSG_LOADING.into(),
        };
        assert!(matches!(session.reset(), Err(SplitError::RunInProgress)));
    }

    #[tokio::test]
    async fn run_is_rejected_while_processing() {
        let session = SplitSession::new();
        lock(&session.inner).state = OperationState::Processing {
            message: page_progress_message(1, 3),
        };
        let err = session
            .run(
                SplitInput::new("other.pdf", create_test_pdf(2)),
                &SplitConfig::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SplitError::RunInProgress));
        assert_eq!(session.state().message(), "Processing page 1 of 3…");
    }

    #[test]
    fn non_pdf_fails_without_processing() {
        let session = SplitSession::new();
        let start = session
            .start_run(&SplitInput::new("notes.txt", b"hello".to_vec()))
            .unwrap();
        assert!(matches!(start, RunStart::Rejected(_)));
        assert_eq!(
            session.state(),
            OperationState::Failure {
                message: "Please select a PDF file.".into()
            }
        );
    }

    #[test]
    fn valid_input_enters_loading() {
        let session = SplitSession::new();
        let start = session
            .start_run(&SplitInput::new("report.pdf", create_test_pdf(2)))
            .unwrap();
        assert!(matches!(start, RunStart::Started(1)));
        assert_eq!(session.state().message(), MSG_LOADING);
    }

    struct SlowExtractor;

    impl PageExtractor for SlowExtractor {
        fn extract(&self, doc: &SourceDocument, page_index: usize) -> Result<Vec<u8>, PageError> {
            std::thread::sleep(std::time::Duration::from_millis(200));
            LopdfExtractor.extract(doc, page_index)
        }
    }

    #[tokio::test]
    async fn abandoned_run_leaves_session_usable() {
        let session = SplitSession::new();
        let slow = SplitConfig::builder()
            .extractor(Arc::new(SlowExtractor))
            .build()
            .unwrap();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            session.run(SplitInput::new("slow.pdf", create_test_pdf(3)), &slow),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(
            session.state(),
            OperationState::Failure {
                message: MSG_UNEXPECTED.into()
            }
        );
        assert!(session.download().is_none());

        session.reset().unwrap();
        let state = session
            .run(
                SplitInput::new("next.pdf", create_test_pdf(2)),
                &SplitConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            state.message(),
            "Successfully split into 2 individual PDF files."
        );
        assert!(session.download().is_some());
    }
}
