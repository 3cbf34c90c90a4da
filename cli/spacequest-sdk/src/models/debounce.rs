//! Cancellable, restartable scheduled callbacks.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period after the last search keystroke.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Runs a callback once a quiet period has elapsed since the last
/// [`Debouncer::schedule`] call.
///
/// Every call to `schedule` aborts the callback scheduled before it, so in a
/// burst of calls only the last callback runs. Dropping the debouncer aborts
/// the pending callback.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Run `callback` after the window, unless rescheduled or cancelled first.
    pub fn schedule<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let window = self.window;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            callback();
        }));
    }

    /// Abort the pending callback. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            },
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn FnOnce() + Send>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let calls = calls.clone();
            move |value: &str| {
                let calls = calls.clone();
                let value = value.to_string();
                Box::new(move || calls.lock().unwrap().push(value)) as Box<dyn FnOnce() + Send>
            }
        };
        (calls, make)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_after_the_window() {
        let (calls, make) = recorder();
        let debouncer = Debouncer::default();

        debouncer.schedule(make("Luke"));
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(calls.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["Luke".to_string()]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_of_a_burst_runs() {
        let (calls, make) = recorder();
        let debouncer = Debouncer::default();

        debouncer.schedule(make("L"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(make("Lu"));
        tokio::time::sleep(Duration::from_millis(299)).await;
        debouncer.schedule(make("Luke"));
        tokio::time::sleep(Duration::from_millis(301)).await;

        assert_eq!(*calls.lock().unwrap(), vec!["Luke".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_callback() {
        let (calls, make) = recorder();
        let debouncer = Debouncer::default();

        debouncer.schedule(make("Luke"));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_prevents_the_callback() {
        let (calls, make) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50));

        debouncer.schedule(make("Luke"));
        drop(debouncer);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(calls.lock().unwrap().is_empty());
    }
}
