//! Background batch generation with progress events and cancellation.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::pipeline::Pipeline;
use crate::source::MismatchResolver;
use crate::types::{GeneratedPresentation, SongRequest};
use crate::{Error, Result};

/// Shared flag asking a running batch to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress notifications sent by the worker, in order.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    ItemStarted {
        index: usize,
        total: usize,
        request: SongRequest,
    },
    ItemCompleted {
        index: usize,
        generated: GeneratedPresentation,
    },
    ItemFailed {
        index: usize,
        request: SongRequest,
        error: String,
    },
    /// Percentage of items processed so far.
    Progress { percent: u8 },
    /// The batch stopped early after `completed` items.
    Canceled { completed: usize },
    Finished(BatchSummary),
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub completed: Vec<GeneratedPresentation>,
    pub failed: Vec<(SongRequest, String)>,
    pub canceled: bool,
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done * 100 / total).min(100) as u8
}

/// Process requests one after another, reporting through `emit`.
///
/// A failing item is reported and the batch moves on. Cancellation is
/// checked before and after each item.
pub fn run_batch(
    pipeline: &Pipeline,
    requests: &[SongRequest],
    resolver: &mut dyn MismatchResolver,
    cancel: &CancelToken,
    mut emit: impl FnMut(BatchEvent),
) -> BatchSummary {
    let total = requests.len();
    let mut summary = BatchSummary::default();

    for (index, request) in requests.iter().enumerate() {
        if cancel.is_canceled() {
            summary.canceled = true;
            break;
        }

        emit(BatchEvent::ItemStarted {
            index,
            total,
            request: request.clone(),
        });

        match pipeline.generate(request, resolver) {
            Ok(generated) => {
                summary.completed.push(generated.clone());
                emit(BatchEvent::ItemCompleted { index, generated });
            }
            Err(e) => {
                log::warn!("Batch item {} '{}' failed: {}", index + 1, request.title, e);
                summary.failed.push((request.clone(), e.to_string()));
                emit(BatchEvent::ItemFailed {
                    index,
                    request: request.clone(),
                    error: e.to_string(),
                });
            }
        }

        emit(BatchEvent::Progress {
            percent: percent(index + 1, total),
        });

        if cancel.is_canceled() {
            summary.canceled = index + 1 < total;
            break;
        }
    }

    if summary.canceled {
        emit(BatchEvent::Canceled {
            completed: summary.completed.len(),
        });
    }
    emit(BatchEvent::Finished(summary.clone()));
    summary
}

/// A batch running on its own thread.
pub struct BatchWorker {
    events: Receiver<BatchEvent>,
    cancel: CancelToken,
    handle: JoinHandle<BatchSummary>,
}

impl BatchWorker {
    /// Start processing `requests` in the background.
    pub fn spawn<R>(pipeline: Pipeline, requests: Vec<SongRequest>, mut resolver: R) -> Result<Self>
    where
        R: MismatchResolver + Send + 'static,
    {
        let (tx, events) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = thread::Builder::new()
            .name("batch-worker".to_string())
            .spawn(move || {
                log::debug!("Batch worker started with {} items", requests.len());
                run_batch(&pipeline, &requests, &mut resolver, &token, |event| {
                    // The receiver may be gone; the summary is still returned by join.
                    let _ = tx.send(event);
                })
            })?;

        Ok(Self {
            events,
            cancel,
            handle,
        })
    }

    /// Events in the order they happened. The channel closes when the batch ends.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker to finish.
    pub fn join(self) -> Result<BatchSummary> {
        self.handle
            .join()
            .map_err(|_| Error::from(io::Error::other("batch worker panicked")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::pipeline::tests::{amazing_grace, FixedSource, RecordingEncoder};
    use crate::source::{AcceptMismatches, LyricsLibrary, MismatchWarning};
    use std::fs;
    use tempfile::TempDir;

    fn library_pipeline(dir: &TempDir) -> Pipeline {
        let lyrics = dir.path().join("lyrics");
        fs::create_dir(&lyrics).unwrap();
        fs::write(lyrics.join("Amazing Grace - John Newton.txt"), "Amazing grace").unwrap();
        fs::write(lyrics.join("Holy Holy Holy - Reginald Heber.txt"), "Holy holy").unwrap();

        Pipeline::new(
            GenerationConfig::new().with_output_dir(dir.path().join("out")),
            RecordingEncoder::default(),
        )
        .with_source(LyricsLibrary::new(lyrics))
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let pipeline = library_pipeline(&dir);
        let requests = vec![
            SongRequest::new("Amazing Grace", "John Newton"),
            SongRequest::new("Unknown Song", "Nobody"),
            SongRequest::new("Holy Holy Holy", "Reginald Heber"),
        ];

        let mut events = Vec::new();
        let summary = run_batch(
            &pipeline,
            &requests,
            &mut AcceptMismatches,
            &CancelToken::new(),
            |e| events.push(e),
        );

        assert_eq!(summary.completed.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0.title, "Unknown Song");
        assert!(!summary.canceled);

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                BatchEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![33, 66, 100]);
        assert!(matches!(events.last(), Some(BatchEvent::Finished(_))));
    }

    #[test]
    fn test_cancel_after_current_item() {
        let dir = TempDir::new().unwrap();
        let pipeline = library_pipeline(&dir);
        let requests = vec![
            SongRequest::new("Amazing Grace", "John Newton"),
            SongRequest::new("Holy Holy Holy", "Reginald Heber"),
        ];
        let cancel = CancelToken::new();

        let mut events = Vec::new();
        let summary = run_batch(&pipeline, &requests, &mut AcceptMismatches, &cancel, |e| {
            if matches!(e, BatchEvent::ItemStarted { .. }) {
                cancel.cancel();
            }
            events.push(e);
        });

        assert!(summary.canceled);
        assert_eq!(summary.completed.len(), 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, BatchEvent::Canceled { completed: 1 })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, BatchEvent::ItemStarted { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_cancel_on_first_failure() {
        let dir = TempDir::new().unwrap();
        let pipeline = library_pipeline(&dir);
        let requests = vec![
            SongRequest::new("Unknown Song", "Nobody"),
            SongRequest::new("Amazing Grace", "John Newton"),
            SongRequest::new("Holy Holy Holy", "Reginald Heber"),
        ];
        let cancel = CancelToken::new();

        let summary = run_batch(&pipeline, &requests, &mut AcceptMismatches, &cancel, |e| {
            if matches!(e, BatchEvent::ItemFailed { .. }) {
                cancel.cancel();
            }
        });

        assert!(summary.canceled);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.completed.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_worker_thread_reports_events() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            GenerationConfig::new().with_output_dir(dir.path()),
            RecordingEncoder::default(),
        )
        .with_source(FixedSource(amazing_grace()));

        let mut asked = Vec::new();
        let resolver = move |warning: &MismatchWarning| {
            asked.push(warning.found_title.clone());
            false
        };

        let worker = BatchWorker::spawn(
            pipeline,
            vec![
                SongRequest::new("Amazing Grace", "John Newton"),
                SongRequest::new("amazing grace", "newton"),
            ],
            resolver,
        )
        .unwrap();

        let events: Vec<BatchEvent> = worker.events().iter().collect();
        let summary = worker.join().unwrap();

        assert_eq!(summary.completed.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(summary.failed[0].1.contains("Amazing Grace"));
        assert!(matches!(
            events.first(),
            Some(BatchEvent::ItemStarted { index: 0, total: 2, .. })
        ));
        assert!(matches!(events.last(), Some(BatchEvent::Finished(_))));
    }

    #[test]
    fn test_empty_batch_finishes() {
        let dir = TempDir::new().unwrap();
        let pipeline = library_pipeline(&dir);
        let mut events = Vec::new();
        let summary = run_batch(&pipeline, &[], &mut AcceptMismatches, &CancelToken::new(), |e| {
            events.push(e)
        });
        assert!(summary.completed.is_empty());
        assert_eq!(events.len(), 1);
    }
}
