use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

pub const PROGRESS_CAPTIONS: [&str; 6] = [
    "Locking identity landmarks...",
    "Preserving unique features...",
    "Setting studio lighting...",
    "Calibrating indoor environment...",
    "Refining silk textures...",
    "Finalizing 8K raw portrait...",
];

pub type SharedCaption = Arc<Mutex<Option<String>>>;

/// Rotates the progress caption while a generation is in flight. Dropping the ticker
/// aborts the task and clears the caption.
pub struct CaptionTicker {
    task_handle: Option<JoinHandle<()>>,
    caption: SharedCaption,
}

impl CaptionTicker {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
            debug!("Progress caption ticker stopped");
        }
        *self.caption.lock() = None;
    }
}

impl Drop for CaptionTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn start_caption_ticker(caption: SharedCaption, period: Duration) -> CaptionTicker {
    let shared = caption.clone();
    let task_handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut index = 0usize;
        loop {
            ticker.tick().await;
            let next = PROGRESS_CAPTIONS[index % PROGRESS_CAPTIONS.len()];
            *shared.lock() = Some(next.to_string());
            index = index.wrapping_add(1);
        }
    });

    CaptionTicker {
        task_handle: Some(task_handle),
        caption,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn captions_rotate_and_wrap() {
        let caption: SharedCaption = Arc::new(Mutex::new(None));
        let ticker = start_caption_ticker(caption.clone(), Duration::from_millis(2500));
        settle().await;
        assert_eq!(*caption.lock(), None);

        let mut seen = Vec::new();
        for _ in 0..PROGRESS_CAPTIONS.len() + 1 {
            tokio::time::advance(Duration::from_millis(2500)).await;
            settle().await;
            seen.push(caption.lock().clone().unwrap());
        }
        assert_eq!(seen[0], PROGRESS_CAPTIONS[0]);
        assert_eq!(seen[5], PROGRESS_CAPTIONS[5]);
        assert_eq!(seen[6], PROGRESS_CAPTIONS[0]);
        ticker.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_ticker_freezes_the_caption() {
        let caption: SharedCaption = Arc::new(Mutex::new(None));
        let ticker = start_caption_ticker(caption.clone(), Duration::from_millis(2500));
        settle().await;
        tokio::time::advance(Duration::from_millis(2500)).await;
        settle().await;
        assert!(caption.lock().is_some());

        drop(ticker);
        assert_eq!(*caption.lock(), None);
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(*caption.lock(), None);
    }
}
