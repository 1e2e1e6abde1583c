use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, Sleep};

/// Silence-debounced turn segmentation
///
/// Final transcript fragments pile up until nothing new has arrived for
/// `delay`; then the whole pile is flushed as one turn. There is a single
/// timer slot: every fragment replaces the armed timer.
#[derive(Debug)]
pub struct TurnSegmenter {
    delay: Duration,
    fragments: Vec<String>,
    timer: Option<Pin<Box<Sleep>>>,
}

impl TurnSegmenter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fragments: Vec::new(),
            timer: None,
        }
    }

    /// Buffer a final fragment and restart the silence timer
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
        self.timer = Some(Box::pin(sleep(self.delay)));
    }

    /// Resolves when the armed timer expires; never resolves when disarmed
    ///
    /// Cancel safe: dropping the future leaves the timer armed.
    pub async fn expired(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.await;
                self.timer = None;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Take the buffered fragments as one space-joined turn
    pub fn flush(&mut self) -> Option<String> {
        if self.fragments.is_empty() {
            return None;
        }
        let turn = self.fragments.join(" ");
        self.fragments.clear();
        Some(turn)
    }

    /// Disarm the timer; buffered fragments stay
    pub fn cancel(&mut self) {
        self.timer = None;
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn pending(&self) -> usize {
        self.fragments.len()
    }
}
