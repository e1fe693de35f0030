//! Request processor: a small worker pool used for background work such as
//! decoding a descriptor off the caller's thread or running remote
//! toolchain discovery. Tasks run in submission order when the pool has one
//! worker; with more workers only completion is guaranteed.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    jobs: VecDeque<Job>,
    shutdown: bool,
}

struct Queue {
    state: Mutex<QueueState>,
    available: Condvar,
}

fn lock_state(queue: &Queue) -> MutexGuard<'_, QueueState> {
    queue.state.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct RequestProcessor {
    queue: Arc<Queue>,
    workers: Vec<JoinHandle<()>>,
}

impl RequestProcessor {
    pub fn new() -> Self {
        Self::with_workers(num_cpus::get())
    }

    pub fn with_workers(count: usize) -> Self {
        let queue = Arc::new(Queue {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
        });
        let workers = (0..count.max(1))
            .map(|index| {
                let queue = Arc::clone(&queue);
                std::thread::Builder::new()
                    .name(format!("request-processor-{}", index))
                    .spawn(move || worker_loop(&queue))
                    .unwrap_or_else(|e| panic!("failed to spawn worker thread: {}", e))
            })
            .collect();
        Self { queue, workers }
    }

    /// Queues a task and hands back a handle for its result.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let slot = Arc::new(TaskSlot {
            result: Mutex::new(None),
            done: Condvar::new(),
        });
        let worker_slot = Arc::clone(&slot);
        let job: Job = Box::new(move || {
            let value = task();
            let mut result = worker_slot
                .result
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *result = Some(value);
            worker_slot.done.notify_all();
        });
        {
            let mut state = lock_state(&self.queue);
            state.jobs.push_back(job);
        }
        self.queue.available.notify_one();
        TaskHandle { slot }
    }
}

impl Default for RequestProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RequestProcessor {
    fn drop(&mut self) {
        {
            let mut state = lock_state(&self.queue);
            state.shutdown = true;
        }
        self.queue.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(queue: &Queue) {
    loop {
        let job = {
            let mut state = lock_state(queue);
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                if state.shutdown {
                    return;
                }
                state = queue
                    .available
                    .wait(state)
                    .unwrap_or_else(|e| e.into_inner());
            }
        };
        job();
    }
}

struct TaskSlot<T> {
    result: Mutex<Option<T>>,
    done: Condvar,
}

pub struct TaskHandle<T> {
    slot: Arc<TaskSlot<T>>,
}

impl<T> TaskHandle<T> {
    /// Whether the task has finished. Does not consume the result.
    pub fn poll(&self) -> bool {
        self.slot
            .result
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Blocks until the task finishes and takes its result.
    pub fn wait(self) -> T {
        let mut result = self
            .slot
            .result
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(value) = result.take() {
                return value;
            }
            result = self
                .slot
                .done
                .wait(result)
                .unwrap_or_else(|e| e.into_inner());
        }
    }
}
