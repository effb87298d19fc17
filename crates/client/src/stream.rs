//! Incremental streaming: poll a job whose output is a growing list of
//! chunk URLs and hand each new chunk to the caller as soon as a snapshot
//! reveals it.
//!
//! [`ChunkStream`] is lazy. A status request is only issued when the
//! consumer asks for the next element and nothing is buffered, so the
//! caller can start on one chunk while the job keeps producing the next.
//! Chunks are tracked by count: an element is emitted once, in order,
//! and never again.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{BoxStream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use casablanca_core::error::PredictError;
use casablanca_core::metrics::extract_metrics;
use casablanca_core::snapshot::JobState;
use casablanca_core::types::Metrics;

use crate::api::{CasablancaApi, JobHandle};
use crate::poll::{cancellable, log_progress, remote_failure, wait_interval};

/// One element of a [`ChunkStream`].
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A newly available chunk, with its position in the job's output.
    Chunk { index: usize, url: String },
    /// The job succeeded; always the last element.
    Completed { metrics: Metrics },
}

/// Lazy, finite, non-restartable sequence of chunk events.
///
/// Ends after [`StreamEvent::Completed`], or after yielding a single
/// error. Dropping the stream stops polling; the remote job is left as is.
pub struct ChunkStream {
    handle: JobHandle,
    inner: BoxStream<'static, Result<StreamEvent, PredictError>>,
}

impl ChunkStream {
    pub(crate) fn new(
        api: CasablancaApi,
        handle: JobHandle,
        verbose: bool,
        cancel: CancellationToken,
    ) -> Self {
        let state = StreamState {
            interval: api.config().stream_poll_interval,
            api,
            handle: handle.clone(),
            cancel,
            verbose,
            emitted: 0,
            attempt: 0,
            pending: VecDeque::new(),
            finished: false,
        };

        let inner = futures::stream::unfold(state, |mut state| async move {
            let item = state.next_event().await;
            item.map(|item| (item, state))
        })
        .boxed();

        Self { handle, inner }
    }

    /// Handle of the job being streamed.
    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }
}

impl Stream for ChunkStream {
    type Item = Result<StreamEvent, PredictError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for ChunkStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStream")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

struct StreamState {
    api: CasablancaApi,
    handle: JobHandle,
    interval: Duration,
    cancel: CancellationToken,
    verbose: bool,
    /// Number of chunks already queued for the consumer.
    emitted: usize,
    attempt: u32,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

impl StreamState {
    async fn next_event(&mut self) -> Option<Result<StreamEvent, PredictError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            if let Err(e) = self.poll_once().await {
                self.finished = true;
                self.pending.clear();
                return Some(Err(e));
            }
        }
    }

    /// Fetch one snapshot and queue whatever it reveals.
    async fn poll_once(&mut self) -> Result<(), PredictError> {
        if self.attempt > 0 {
            wait_interval(self.interval, &self.cancel).await?;
        }
        self.attempt += 1;

        let snapshot = cancellable(&self.cancel, self.api.status(&self.handle)).await?;

        if snapshot.state == JobState::Failed {
            tracing::warn!(handle = %self.handle, attempt = self.attempt, "Streaming job failed");
            return Err(remote_failure(&snapshot));
        }

        let chunks = snapshot.output.chunks();
        for (index, url) in chunks.iter().enumerate().skip(self.emitted) {
            tracing::debug!(handle = %self.handle, index, "New chunk available");
            self.pending.push_back(StreamEvent::Chunk {
                index,
                url: url.clone(),
            });
        }
        self.emitted = self.emitted.max(chunks.len());

        match &snapshot.state {
            JobState::Succeeded => {
                tracing::info!(
                    handle = %self.handle,
                    chunks = self.emitted,
                    "Streaming job succeeded",
                );
                self.pending.push_back(StreamEvent::Completed {
                    metrics: extract_metrics(snapshot.metrics.as_ref()),
                });
                self.finished = true;
            }
            JobState::Running(state) => {
                log_progress(self.verbose, &self.handle, self.attempt, state);
            }
            JobState::Failed => {}
        }

        Ok(())
    }
}
