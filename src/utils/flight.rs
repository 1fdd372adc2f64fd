//! Per-key request coalescing.
//!
//! [`SingleFlight`] ensures at most one in-flight computation per key.
//! Callers that arrive while a computation is running wait for it and receive
//! a clone of its output. If the running caller is cancelled, a waiting
//! caller takes over.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

#[derive(Debug)]
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, broadcast::Sender<T>>>,
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<T>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of keys with a computation in progress
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    /// Run `f` for `key`, or join the computation already running for it.
    pub async fn run<F, Fut>(&self, key: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        loop {
            let mut waiter = {
                let mut calls = self.lock();
                match calls.get(key) {
                    Some(tx) => tx.subscribe(),
                    None => {
                        let (tx, _) = broadcast::channel(1);
                        calls.insert(key.to_string(), tx);
                        break;
                    }
                }
            };

            tracing::debug!("Joining in-flight search: {}", key);
            match waiter.recv().await {
                Ok(value) => return value,
                // The running caller was dropped before finishing
                Err(_) => continue,
            }
        }

        let flight = Flight {
            owner: self,
            key,
            done: false,
        };
        let value = f().await;
        flight.finish(value.clone());
        value
    }
}

/// Removes the key when the owning caller finishes or is dropped.
struct Flight<'a, T: Clone> {
    owner: &'a SingleFlight<T>,
    key: &'a str,
    done: bool,
}

impl<T: Clone> Flight<'_, T> {
    fn finish(mut self, value: T) {
        self.done = true;
        if let Some(tx) = self.owner.lock().remove(self.key) {
            // No receivers is fine
            let _ = tx.send(value);
        }
    }
}

impl<T: Clone> Drop for Flight<'_, T> {
    fn drop(&mut self) {
        if !self.done {
            self.owner.lock().remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let flights = Arc::new(SingleFlight::<u32>::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let flights = flights.clone();
            let runs = runs.clone();
            handles.push(tokio::spawn(async move {
                flights
                    .run("k", || async {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        7
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 7);
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let flights = SingleFlight::<&'static str>::new();

        let (a, b) = tokio::join!(
            flights.run("a", || async { "first" }),
            flights.run("b", || async { "second" }),
        );

        assert_eq!((a, b), ("first", "second"));
    }

    #[tokio::test]
    async fn test_sequential_calls_rerun() {
        let flights = SingleFlight::<usize>::new();
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            flights
                .run("k", || async { runs.fetch_add(1, Ordering::SeqCst) })
                .await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_waiter_takes_over_when_owner_cancelled() {
        let flights = Arc::new(SingleFlight::<u32>::new());

        let owner = {
            let flights = flights.clone();
            tokio::spawn(async move {
                flights
                    .run("k", || async {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        1
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(flights.in_flight(), 1);

        let waiter = {
            let flights = flights.clone();
            tokio::spawn(async move { flights.run("k", || async { 2 }).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        owner.abort();
        assert_eq!(waiter.await.unwrap(), 2);
        assert_eq!(flights.in_flight(), 0);
    }
}
