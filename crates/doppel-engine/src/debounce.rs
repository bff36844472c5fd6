//! Keyed, restartable one-shot timers.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::trace;

struct Timer {
    generation: u64,
    cancel: CancellationToken,
}

/// At most one pending timer per key. Scheduling again replaces the old
/// timer and cancels it; only the newest one can fire.
pub struct Debouncer<K> {
    timers: Arc<DashMap<K, Timer>>,
    generation: AtomicU64,
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            timers: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Run `task` after `delay` unless rescheduled or cancelled first.
    pub fn schedule<F, Fut>(&self, key: K, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let replaced = self.timers.insert(
            key.clone(),
            Timer {
                generation,
                cancel: cancel.clone(),
            },
        );
        if let Some(prev) = replaced {
            prev.cancel.cancel();
            trace!(generation, "debounce timer restarted");
        }

        let timers = Arc::clone(&self.timers);
        let _ = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    // A newer timer may have replaced ours right as we woke.
                    let fired = timers
                        .remove_if(&key, |_, t| t.generation == generation)
                        .is_some();
                    if fired {
                        task().await;
                    }
                }
            }
        });
    }

    /// Cancel the pending timer for `key`. Returns whether one was pending;
    /// cancelling a fired or already-cancelled timer is a no-op.
    pub fn cancel(&self, key: &K) -> bool {
        match self.timers.remove(key) {
            Some((_, timer)) => {
                timer.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        self.timers.retain(|_, timer| {
            timer.cancel.cancel();
            false
        });
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.timers.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{sleep, Instant};

    fn bump(count: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let count = Arc::clone(count);
        move || {
            let _ = count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let debouncer = Debouncer::new();
        let count = Arc::new(AtomicUsize::new(0));

        debouncer.schedule("s", Duration::from_millis(1500), bump(&count));
        assert!(debouncer.is_pending(&"s"));

        sleep(Duration::from_millis(1499)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending(&"s"));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_restarts_from_zero() {
        let debouncer = Debouncer::new();
        let fired: Arc<parking_lot::Mutex<Vec<Instant>>> = Arc::default();
        let start = Instant::now();

        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            debouncer.schedule("s", Duration::from_millis(1500), move || async move {
                fired.lock().push(Instant::now());
            });
            sleep(Duration::from_millis(500)).await;
        }
        sleep(Duration::from_secs(5)).await;

        let fired = fired.lock();
        assert_eq!(fired.len(), 1);
        assert!(fired[0] - start >= Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let debouncer = Debouncer::new();
        let count = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(1u32, Duration::from_millis(100), bump(&count));
        assert!(debouncer.cancel(&1));
        assert!(!debouncer.cancel(&1));

        sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        debouncer.schedule(1u32, Duration::from_millis(100), bump(&count));
        sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        // already fired
        assert!(!debouncer.cancel(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let debouncer = Debouncer::new();
        let count = Arc::new(AtomicUsize::new(0));

        debouncer.schedule("a", Duration::from_millis(100), bump(&count));
        debouncer.schedule("b", Duration::from_millis(100), bump(&count));
        debouncer.cancel_all();
        debouncer.schedule("b", Duration::from_millis(100), bump(&count));

        sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
