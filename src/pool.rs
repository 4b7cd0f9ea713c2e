//! A fixed-size pool of comparison workers. The HTTP layer submits jobs and
//! awaits the result; decode and compare run on dedicated OS threads so
//! CPU-bound work stays off the actix runtime.

use crate::compare::{self, CompareError, Method};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// One comparison to run on a worker thread
#[derive(Debug)]
pub struct CompareJob {
    pub image1: String,
    pub image2: String,
    pub method: Method,
}

struct Job {
    task: CompareJob,
    reply: oneshot::Sender<Result<f64, CompareError>>,
}

/// The worker pool. Created once at process start; the submission queue is
/// unbounded, so a saturated pool queues rather than rejects.
pub struct WorkerPool {
    tx: mpsc::UnboundedSender<Job>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..size)
            .map(|id| {
                let rx = Arc::clone(&rx);
                thread::spawn(move || worker_loop(id, rx))
            })
            .collect();

        info!("started worker pool with {size} workers");
        WorkerPool { tx, workers }
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue a comparison and wait for its result. A dropped reply means the
    /// worker died mid-job; surfaced as an error, never a panic.
    pub async fn submit(&self, task: CompareJob) -> Result<f64, CompareError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Job { task, reply })
            .map_err(|_| CompareError::PoolClosed)?;
        rx.await.map_err(|_| CompareError::PoolClosed)?
    }

    /// Close the queue and join the workers
    pub fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

fn worker_loop(id: usize, rx: Arc<Mutex<mpsc::UnboundedReceiver<Job>>>) {
    debug!("worker {id} up");
    loop {
        // Hold the lock only while waiting for the next job; peers block on
        // the lock, not on this worker's computation
        let job = {
            let mut rx = match rx.lock() {
                Ok(rx) => rx,
                Err(_) => break,
            };
            match rx.blocking_recv() {
                Some(job) => job,
                None => break,
            }
        };

        let result = compare::compare(&job.task.image1, &job.task.image2, job.task.method);
        debug!("worker {id} finished a comparison");

        // The submitter may have gone away; nothing to do then
        let _ = job.reply.send(result);
    }
    debug!("worker {id} down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Luma};
    use std::io::Cursor;
    use std::sync::Arc;

    fn gray_b64(value: u8) -> String {
        let img = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(20, 20, Luma([value])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        general_purpose::STANDARD.encode(&buf)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn submits_and_receives_result() {
        let pool = WorkerPool::new(2);
        let img = gray_b64(42);
        let s = pool
            .submit(CompareJob {
                image1: img.clone(),
                image2: img,
                method: Method::Pixel,
            })
            .await
            .unwrap();
        assert!((s - 100.0).abs() < 1e-9);
        pool.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_jobs_do_not_cross_contaminate() {
        let pool = Arc::new(WorkerPool::new(10));
        let black = gray_b64(0);

        // Each job compares black against a distinct gray level; the expected
        // scores are all different, so a mixed-up result is detectable
        let handles: Vec<_> = (0..10u64)
            .map(|i| {
                let pool = Arc::clone(&pool);
                let black = black.clone();
                tokio::spawn(async move {
                    let other = gray_b64((i * 20) as u8);
                    let s = pool
                        .submit(CompareJob {
                            image1: black,
                            image2: other,
                            method: Method::Pixel,
                        })
                        .await
                        .unwrap();
                    (i, s)
                })
            })
            .collect();

        for handle in handles {
            let (i, s) = handle.await.unwrap();
            let expected = (1.0 - (i * 20) as f64 / 255.0) * 100.0;
            assert!((s - expected).abs() < 1e-9, "job {i}: {s} vs {expected}");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn errors_propagate_from_workers() {
        let pool = WorkerPool::new(1);
        let err = pool
            .submit(CompareJob {
                image1: "@@".into(),
                image2: gray_b64(0),
                method: Method::Pixel,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::Base64(_)));
        pool.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_joins_workers() {
        let pool = WorkerPool::new(4);
        assert_eq!(pool.workers(), 4);
        // returns only after every worker thread has exited
        pool.shutdown();
    }
}
