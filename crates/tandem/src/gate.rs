//! Scoped isolation of blocking native work from the async caller.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use crate::error::{EngineError, Result};

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// # ConcurrencyGate
///
/// Brackets every call that waits on native translation work.
///
/// While inside the gate the calling task gives up its executor thread:
/// blocking engine calls run on Tokio's blocking pool via
/// [`run_blocking`](Self::run_blocking), and pool futures are awaited with
/// [`run`](Self::run) instead of being polled in a busy loop. Other tasks on
/// the same runtime keep making progress for the whole duration.
///
/// Every entry is tracked by a [`GateGuard`] that is released on every exit
/// path, including engine errors and panics, so
/// [`drained`](Self::drained) can wait until no native work is outstanding.
#[derive(Clone, Default)]
pub struct ConcurrencyGate {
    in_flight: Arc<InFlight>,
}

/// Marks one unit of native work in progress; released on drop.
pub struct GateGuard {
    in_flight: Arc<InFlight>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        if self.in_flight.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.in_flight.idle.notify_waiters();
        }
    }
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the gate. The returned guard leaves it when dropped.
    pub fn enter(&self) -> GateGuard {
        self.in_flight.count.fetch_add(1, Ordering::SeqCst);
        GateGuard {
            in_flight: self.in_flight.clone(),
        }
    }

    /// Awaits `future` while holding the gate.
    pub async fn run<F: Future>(&self, future: F) -> F::Output {
        let _guard = self.enter();
        future.await
    }

    /// Runs the blocking closure `work` off the async executor.
    ///
    /// The gate is held until `work` returns or unwinds. A panic inside
    /// `work` is reported as an engine error.
    pub async fn run_blocking<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.enter();
        let joined = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            work()
        })
        .await;
        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(EngineError::new("blocking translation task panicked").into()),
            Err(e) => Err(EngineError::new(format!("blocking translation task failed: {e}")).into()),
        }
    }

    /// Number of callers currently inside the gate.
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Resolves once no caller is inside the gate.
    pub async fn drained(&self) {
        loop {
            let notified = self.in_flight.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tokio::time;
    use crate::error::TranslateError;

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let gate = ConcurrencyGate::new();
        {
            let _a = gate.enter();
            let _b = gate.enter();
            assert_eq!(gate.in_flight(), 2);
        }
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_run_blocking_releases_on_error() {
        let gate = ConcurrencyGate::new();
        let result: Result<()> = gate
            .run_blocking(|| Err(EngineError::new("device lost").into()))
            .await;

        assert!(matches!(result, Err(TranslateError::Engine(_))));
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_run_blocking_maps_panic_to_engine_error() {
        let gate = ConcurrencyGate::new();
        let result: Result<()> = gate.run_blocking(|| panic!("native crash")).await;

        assert!(matches!(result, Err(TranslateError::Engine(_))));
        assert_eq!(gate.in_flight(), 0);
    }

    // A single-threaded runtime still runs other tasks while blocking work is in the gate.
    #[tokio::test(flavor = "current_thread")]
    async fn test_blocking_work_does_not_starve_other_tasks() {
        let gate = ConcurrencyGate::new();
        let ticked = Arc::new(AtomicBool::new(false));
        let ticked_clone = ticked.clone();

        let ticker = tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            ticked_clone.store(true, Ordering::SeqCst);
        });

        let observed = gate
            .run_blocking({
                let ticked = ticked.clone();
                move || {
                    std::thread::sleep(Duration::from_millis(100));
                    Ok(ticked.load(Ordering::SeqCst))
                }
            })
            .await
            .unwrap();

        ticker.await.unwrap();
        assert!(observed, "other task should have run while blocking work was in flight");
    }

    #[tokio::test]
    async fn test_drained_waits_for_outstanding_work() {
        let gate = ConcurrencyGate::new();
        let guard = gate.enter();

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.drained().await }
        });

        time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }
}
