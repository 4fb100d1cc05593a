//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn StudyProgressCallback>`] via
//! [`crate::config::StudyConfigBuilder::progress_callback`] to be told when
//! extraction and generation start and finish. The CLI uses this to drive a
//! spinner; a web front-end could forward the same events to a socket.
//!
//! # Example
//!
//! ```rust
//! use studymate::{StudyProgressCallback, StudyConfig, TaskKind};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     calls: AtomicUsize,
//! }
//!
//! impl StudyProgressCallback for CountingCallback {
//!     fn on_generation_complete(&self, kind: TaskKind, raw_len: usize) {
//!         self.calls.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{kind} done ({raw_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { calls: AtomicUsize::new(0) });
//!
//! let config = StudyConfig::builder()
//!     .progress_callback(counter as Arc<dyn StudyProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::task::TaskKind;
use std::sync::Arc;

/// Called by [`crate::study::StudyMate`] around its slow steps.
///
/// All methods default to no-ops so callers only override what they care
/// about. Implementations must be `Send + Sync`; independent sessions may
/// share one callback.
pub trait StudyProgressCallback: Send + Sync {
    /// Called before the text of an upload is extracted.
    ///
    /// # Arguments
    /// * `file_name`  — name of the uploaded file
    /// * `byte_len`   — size of the upload
    fn on_extraction_start(&self, file_name: &str, byte_len: usize) {
        let _ = (file_name, byte_len);
    }

    /// Called after extraction, whatever the outcome.
    ///
    /// # Arguments
    /// * `file_name`  — name of the uploaded file
    /// * `text_chars` — characters of text extracted (0 on failure)
    fn on_extraction_complete(&self, file_name: &str, text_chars: usize) {
        let _ = (file_name, text_chars);
    }

    /// Called just before the generation request is sent.
    fn on_generation_start(&self, kind: TaskKind) {
        let _ = kind;
    }

    /// Called when a response was received and parsed.
    ///
    /// # Arguments
    /// * `kind`    — task that produced the response
    /// * `raw_len` — byte length of the raw model text
    fn on_generation_complete(&self, kind: TaskKind, raw_len: usize) {
        let _ = (kind, raw_len);
    }

    /// Called when generation or parsing failed.
    fn on_generation_error(&self, kind: TaskKind, error: &str) {
        let _ = (kind, error);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl StudyProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::StudyConfig`].
pub type ProgressCallback = Arc<dyn StudyProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        extractions: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: Mutex<Vec<(TaskKind, String)>>,
    }

    impl StudyProgressCallback for TrackingCallback {
        fn on_extraction_complete(&self, _file_name: &str, _text_chars: usize) {
            self.extractions.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_start(&self, _kind: TaskKind) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_complete(&self, _kind: TaskKind, _raw_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_error(&self, kind: TaskKind, error: &str) {
            self.errors.lock().unwrap().push((kind, error.to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start("a.pdf", 10);
        cb.on_extraction_complete("a.pdf", 0);
        cb.on_generation_start(TaskKind::Quiz);
        cb.on_generation_complete(TaskKind::Quiz, 42);
        cb.on_generation_error(TaskKind::Summary, "timeout");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_extraction_start("a.pdf", 100);
        tracker.on_extraction_complete("a.pdf", 80);
        tracker.on_generation_start(TaskKind::Quiz);
        tracker.on_generation_complete(TaskKind::Quiz, 300);
        tracker.on_generation_start(TaskKind::Summary);
        tracker.on_generation_error(TaskKind::Summary, "remote error");

        assert_eq!(tracker.extractions.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(
            tracker.errors.lock().unwrap().as_slice(),
            &[(TaskKind::Summary, "remote error".to_string())]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_generation_start(TaskKind::Chat);
        cb.on_generation_complete(TaskKind::Chat, 12);
    }
}
