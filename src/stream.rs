//! Event-streaming API: observe a split as it happens.
//!
//! [`split`](crate::split::split) reports progress through a callback.
//! [`split_with_events`] turns those callbacks into a `Stream` of
//! [`SplitEvent`]s, which is easier to forward to a UI, a websocket or a log
//! than a trait object. The split itself runs on a spawned task; its final
//! result comes back through the returned `JoinHandle`.
//!
//! Events arrive in pipeline order: `Started`, then `PageStarted` /
//! `PageCompleted` pairs in ascending page order, then exactly one terminal
//! event (`Completed` or `Failed`). The stream ends after the terminal event.

use crate::config::SplitConfig;
use crate::error::SplitError;
use crate::output::SplitOutput;
use crate::pipeline::input::SplitInput;
use crate::progress::{FanOut, ProgressCallback, SplitProgressCallback};
use crate::split::split;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

/// A boxed stream of split events.
pub type SplitEventStream = BoxStream<'static, SplitEvent>;

/// One observable step of a split run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SplitEvent {
    Started {
        total_pages: usize,
    },
    PageStarted {
        page_num: usize,
        total_pages: usize,
    },
    PageCompleted {
        page_num: usize,
        total_pages: usize,
        bytes: usize,
    },
    PageFailed {
        page_num: usize,
        total_pages: usize,
        error: String,
    },
    Completed {
        total_pages: usize,
        archive_bytes: usize,
    },
    /// The run failed. `message` is what a user should see.
    Failed {
        message: String,
    },
}

impl SplitEvent {
    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SplitEvent::Completed { .. } | SplitEvent::Failed { .. })
    }
}

/// Progress callback that forwards every event into a channel.
///
/// Sending never blocks; events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<SplitEvent>,
}

impl ChannelProgress {
    pub fn new(tx: mpsc::UnboundedSender<SplitEvent>) -> Self {
        Self { tx }
    }

    /// A callback plus the stream its events come out of.
    pub fn channel() -> (Self, SplitEventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), UnboundedReceiverStream::new(rx).boxed())
    }

    fn send(&self, event: SplitEvent) {
        if self.tx.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }
}

impl SplitProgressCallback for ChannelProgress {
    fn on_split_start(&self, total_pages: usize) {
        self.send(SplitEvent::Started { total_pages });
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.send(SplitEvent::PageStarted {
            page_num,
            total_pages,
        });
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
        self.send(SplitEvent::PageCompleted {
            page_num,
            total_pages,
            bytes,
        });
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.send(SplitEvent::PageFailed {
            page_num,
            total_pages,
            error: error.to_string(),
        });
    }

    fn on_split_complete(&self, total_pages: usize, archive_bytes: usize) {
        self.send(SplitEvent::Completed {
            total_pages,
            archive_bytes,
        });
    }
}

/// Spawn a split of `input` and stream its events.
///
/// Any progress callback already in `config` keeps receiving events too.
/// Must be called from within a Tokio runtime.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfsplit::{split_with_events, SplitConfig, SplitInput};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let input = SplitInput::from_path("report.pdf").await?;
/// let (mut events, handle) = split_with_events(input, &SplitConfig::default());
/// while let Some(event) = events.next().await {
///     println!("{}", serde_json::to_string(&event)?);
/// }
/// let output = handle.await??;
/// println!("{}", output.success_message());
/// # Ok(())
/// # }
/// ```
pub fn split_with_events(
    input: SplitInput,
    config: &SplitConfig,
) -> (SplitEventStream, JoinHandle<Result<SplitOutput, SplitError>>) {
    let (progress, events) = ChannelProgress::channel();
    let terminal = progress.clone();

    let mut observers: Vec<ProgressCallback> = vec![Arc::new(progress)];
    if let Some(cb) = &config.progress_callback {
        observers.push(Arc::clone(cb));
    }
    let mut config = config.clone();
    config.progress_callback = Some(Arc::new(FanOut(observers)));

    let handle = tokio::spawn(async move {
        let result = split(input, &config).await;
        if let Err(ref e) = result {
            terminal.send(SplitEvent::Failed {
                message: e.user_message(),
            });
        }
        result
    });

    (events, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fixtures::create_test_pdf;

    #[test]
    fn event_json_is_tagged() {
        let json = serde_json::to_value(SplitEvent::PageCompleted {
            page_num: 2,
            total_pages: 3,
            bytes: 10,
        })
        .unwrap();
        assert_eq!(json["event"], "page_completed");
        assert_eq!(json["page_num"], 2);
    }

    #[test]
    fn terminal_events() {
        assert!(SplitEvent::Failed {
            message: "x".into()
        }
        .is_terminal());
        assert!(!SplitEvent::Started { total_pages: 2 }.is_terminal());
    }

    #[tokio::test]
    async fn events_follow_page_order() {
        let (events, handle) = split_with_events(
            SplitInput::new("three.pdf", create_test_pdf(3)),
            &SplitConfig::default(),
        );
        let events: Vec<SplitEvent> = events.collect().await;
        let output = handle.await.unwrap().unwrap();

        assert_eq!(events.first(), Some(&SplitEvent::Started { total_pages: 3 }));
        let started: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                SplitEvent::PageStarted { page_num, .. } => Some(*page_num),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![1, 2, 3]);
        assert_eq!(
            events.last(),
            Some(&SplitEvent::Completed {
                total_pages: 3,
                archive_bytes: output.archive.len()
            })
        );
    }

    #[tokio::test]
    async fn failure_ends_with_failed_event() {
        let (events, handle) = split_with_events(
            SplitInput::new("single.pdf", create_test_pdf(1)),
            &SplitConfig::default(),
        );
        let events: Vec<SplitEvent> = events.collect().await;
        assert!(handle.await.unwrap().is_err());
        assert_eq!(
            events,
            vec![SplitEvent::Failed {
                message: "The PDF has only one page. No splitting is needed.".into()
            }]
        );
    }
}
