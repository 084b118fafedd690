use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use super::*;

/// Bounded pool for CPU-bound per-item work. Results always come back in
/// input order.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: NonZeroUsize,
}

impl WorkerPool {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self { workers }
    }

    pub fn from_available_parallelism() -> Self {
        Self::new(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    pub fn map<T, R, F>(&self, items: &[T], work: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let worker_count = self.workers.get().min(items.len());
        if worker_count <= 1 {
            return Ok(items.iter().map(work).collect());
        }

        let next_index = AtomicUsize::new(0);
        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(items.len()).collect();

        std::thread::scope(|scope| -> Result<()> {
            let (sender, receiver) = mpsc::channel::<(usize, R)>();

            for worker in 0..worker_count {
                let sender = sender.clone();
                let next_index = &next_index;
                let work = &work;
                std::thread::Builder::new()
                    .name(format!("cis-parse-{worker}"))
                    .spawn_scoped(scope, move || {
                        loop {
                            let index = next_index.fetch_add(1, Ordering::Relaxed);
                            let Some(item) = items.get(index) else {
                                break;
                            };
                            if sender.send((index, work(item))).is_err() {
                                break;
                            }
                        }
                    })
                    .with_context(|| format!("failed to spawn parser worker {worker}"))?;
            }
            drop(sender);

            for (index, result) in receiver {
                slots[index] = Some(result);
            }
            Ok(())
        })?;

        slots
            .into_iter()
            .collect::<Option<Vec<R>>>()
            .context("parser worker exited before finishing its items")
    }
}
