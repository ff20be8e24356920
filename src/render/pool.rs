use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use voxmap_common::{MapError, Result};

/// Number of jobs running at once.
pub const POOL_SIZE: usize = 3;

/// Runs blocking jobs on tokio's blocking threads, never more than `size` at
/// a time.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    size: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        WorkerPool::new(POOL_SIZE)
    }
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        WorkerPool {
            semaphore: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Submits every job and waits for all of them. Results keep the order of
    /// `jobs`. A job that panics fails the whole call.
    pub async fn run_all<T, F>(&self, jobs: Vec<F>) -> Result<Vec<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let tasks = jobs.into_iter().map(|job| {
            let semaphore = Arc::clone(&self.semaphore);
            async move {
                let permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| MapError::invariant("worker pool is closed"))?;
                tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    job()
                })
                .await
                .map_err(|err| MapError::invariant(format!("worker task failed: {}", err)))
            }
        });

        join_all(tasks).await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_results_keep_submission_order() {
        let pool = WorkerPool::default();
        let jobs: Vec<_> = (0..8).map(|i| move || i * i).collect();
        let results = tokio_test::block_on(pool.run_all(jobs)).unwrap();
        assert_eq!(results, vec![0, 1, 4, 9, 16, 25, 36, 49]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrency_is_bounded() {
        let pool = WorkerPool::default();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..12)
            .map(|_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();
        pool.run_all(jobs).await.unwrap();

        let peak = peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= POOL_SIZE, "peak {}", peak);
    }

    #[tokio::test]
    async fn test_panicking_job_is_an_invariant_violation() {
        let pool = WorkerPool::new(2);
        let jobs: Vec<Box<dyn FnOnce() -> u8 + Send>> = vec![
            Box::new(|| 1),
            Box::new(|| panic!("boom")),
        ];
        assert_matches!(
            pool.run_all(jobs).await,
            Err(MapError::InvariantViolation(_))
        );
    }
}
