use std::sync::Arc;

use parking_lot::Mutex;

use super::{UploadError, UploadObserver};

#[derive(Default)]
struct ProgressState {
    last: Option<f64>,
    closed: bool,
}

/// Forwards progress to the observer, clamped to [0, 1] and never decreasing / 进度上报
#[derive(Clone)]
pub struct ProgressTracker {
    observer: Arc<dyn UploadObserver>,
    state: Arc<Mutex<ProgressState>>,
}

impl ProgressTracker {
    fn new(observer: Arc<dyn UploadObserver>) -> Self {
        Self {
            observer,
            state: Arc::new(Mutex::new(ProgressState::default())),
        }
    }

    pub fn report(&self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        {
            let mut state = self.state.lock();
            if state.closed || state.last.is_some_and(|last| fraction <= last) {
                return;
            }
            state.last = Some(fraction);
        }
        self.observer.on_progress(fraction);
    }

    /// Report bytes sent out of `total` / 按字节上报
    pub fn report_bytes(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        self.report(sent as f64 / total as f64);
    }

    /// The request finished (successfully or not) / 请求完成
    pub fn complete(&self) {
        self.report(1.0);
    }

    pub fn last(&self) -> Option<f64> {
        self.state.lock().last
    }

    fn close(&self) {
        self.state.lock().closed = true;
    }
}

/// One upload invocation / 单次上传会话
///
/// Created by `start` (emits `on_start`) and consumed by `finish` (emits the
/// single terminal callback), so neither can happen twice.
pub struct UploadSession {
    observer: Arc<dyn UploadObserver>,
    tracker: ProgressTracker,
}

impl UploadSession {
    pub fn start(observer: Arc<dyn UploadObserver>) -> Self {
        observer.on_start();
        let tracker = ProgressTracker::new(observer.clone());
        Self { observer, tracker }
    }

    pub fn tracker(&self) -> ProgressTracker {
        self.tracker.clone()
    }

    pub fn finish(self, result: Result<String, UploadError>) -> Result<String, UploadError> {
        // late progress from a body still draining must not follow the terminal callback
        self.tracker.close();
        match &result {
            Ok(url) => self.observer.on_completed(url),
            Err(e) => self.observer.on_failed(&e.to_string()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadEvent;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<UploadEvent>) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        events
    }

    #[test]
    fn test_progress_is_clamped_and_non_decreasing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = UploadSession::start(Arc::new(tx));
        let tracker = session.tracker();

        tracker.report(0.0);
        tracker.report(0.5);
        tracker.report(0.25);
        tracker.report(f64::NAN);
        tracker.report_bytes(3, 4);
        tracker.report(7.0);
        tracker.complete();

        assert_eq!(
            drain(&mut rx),
            vec![
                UploadEvent::Started,
                UploadEvent::Progress(0.0),
                UploadEvent::Progress(0.5),
                UploadEvent::Progress(0.75),
                UploadEvent::Progress(1.0),
            ]
        );
        assert_eq!(tracker.last(), Some(1.0));
    }

    #[test]
    fn test_finish_emits_single_terminal() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = UploadSession::start(Arc::new(tx));
        let tracker = session.tracker();
        let result = session.finish(Err(UploadError::provider("Access Denied")));
        tracker.report(0.9);

        assert!(result.is_err());
        assert_eq!(
            drain(&mut rx),
            vec![UploadEvent::Started, UploadEvent::Failed("Access Denied".to_string())]
        );
    }

    #[test]
    fn test_finish_success() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = UploadSession::start(Arc::new(tx));
        let url = session.finish(Ok("https://x/y.png".to_string())).unwrap();
        assert_eq!(url, "https://x/y.png");
        assert_eq!(
            drain(&mut rx),
            vec![UploadEvent::Started, UploadEvent::Completed(url)]
        );
    }
}
