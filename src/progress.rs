//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline classifies the document and works through pages.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a WebSocket, a database record, or a
//! terminal progress bar — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` so one
//! config (and therefore one callback) can be shared across concurrent
//! extractions of independent documents.

use std::sync::Arc;

/// Called by the extraction pipeline as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Within a single extraction the pipeline is
/// strictly sequential, so events for one document arrive in order; a
/// shared callback may still see interleaved events from concurrent
/// documents and must synchronise its own state.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after classification, before any extraction work.
    ///
    /// # Arguments
    /// * `total_pages`   — page count (0 if the document failed to open)
    /// * `is_text_based` — the classifier's verdict
    fn on_classified(&self, total_pages: usize, is_text_based: bool) {
        let _ = (total_pages, is_text_based);
    }

    /// Called just before a page enters the rasterise→OCR→structure
    /// sequence (image path only).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page (or the whole document, on the direct path)
    /// has been structured.
    ///
    /// # Arguments
    /// * `questions` — questions this unit contributed
    fn on_unit_complete(&self, page_num: usize, total_pages: usize, questions: usize) {
        let _ = (page_num, total_pages, questions);
    }

    /// Called when a page is skipped for insufficient OCR signal.
    fn on_page_skipped(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once after the run, with the final question count.
    fn on_complete(&self, total_questions: usize) {
        let _ = total_questions;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        final_count: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_unit_complete(&self, _page_num: usize, _total_pages: usize, _questions: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_skipped(&self, _page_num: usize, _total_pages: usize) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_complete(&self, total_questions: usize) {
            self.final_count.store(total_questions, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_classified(5, true);
        cb.on_page_start(1, 5);
        cb.on_unit_complete(1, 5, 3);
        cb.on_page_skipped(2, 5);
        cb.on_complete(3);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            skips: AtomicUsize::new(0),
            final_count: AtomicUsize::new(0),
        };

        tracker.on_classified(3, false);
        tracker.on_page_start(1, 3);
        tracker.on_unit_complete(1, 3, 2);
        tracker.on_page_start(2, 3);
        tracker.on_page_skipped(2, 3);
        tracker.on_page_start(3, 3);
        tracker.on_unit_complete(3, 3, 1);
        tracker.on_complete(3);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ExtractionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_classified(10, true);
        cb.on_unit_complete(1, 10, 4);
    }
}
