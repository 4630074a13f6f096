/// Box Pool / Allocator - Exclusive Sandbox Leasing
///
/// **Core Responsibility:**
/// Own the set of isolation-box ids and hand each one to at most one
/// submission at a time.
///
/// **Allocation discipline:**
/// A semaphore provides capacity backpressure (wait or fail fast, per
/// configuration); a mutex-guarded free list provides the ids. Two
/// concurrent `acquire()` calls can never observe the same id while
/// either lease is alive.
///
/// **Cleanup guarantee:**
/// `BoxLease::release()` is the normal path. If a lease is dropped
/// without it - early error return, panic, caller cancellation - the
/// `Drop` impl spawns the same cleanup, so a box is always returned
/// exactly once.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::isolate::Isolate;

/// Id free list plus capacity gate. Shared between the pool and every
/// outstanding lease.
#[derive(Debug)]
pub(crate) struct Slots {
    free: Mutex<Vec<u32>>,
    available: Semaphore,
}

impl Slots {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new((0..capacity as u32).rev().collect()),
            available: Semaphore::new(capacity),
        }
    }

    pub(crate) async fn take(&self, wait: bool) -> Result<u32, EngineError> {
        let permit = if wait {
            self.available
                .acquire()
                .await
                .map_err(|_| EngineError::InternalError("box pool closed".to_string()))?
        } else {
            self.available
                .try_acquire()
                .map_err(|_| EngineError::PoolExhausted)?
        };
        // the permit is restored explicitly in put()
        permit.forget();

        self.free.lock().await.pop().ok_or_else(|| {
            EngineError::InternalError("box free list empty despite available permit".to_string())
        })
    }

    pub(crate) async fn put(&self, id: u32) {
        self.free.lock().await.push(id);
        self.available.add_permits(1);
    }
}

pub struct BoxPool {
    slots: Arc<Slots>,
    isolate: Isolate,
    wait_for_box: bool,
}

impl BoxPool {
    pub fn new(capacity: usize, wait_for_box: bool, isolate: Isolate) -> Self {
        Self {
            slots: Arc::new(Slots::new(capacity)),
            isolate,
            wait_for_box,
        }
    }

    /// Lease an exclusive box, initializing its filesystem via the
    /// primitive. The sole suspension point for callers awaiting
    /// capacity.
    pub async fn acquire(&self) -> Result<BoxLease, EngineError> {
        let id = self.slots.take(self.wait_for_box).await?;

        if let Err(e) = self.isolate.init(id).await {
            self.slots.put(id).await;
            return Err(e);
        }

        debug!(box_id = id, "box acquired");
        Ok(BoxLease {
            id,
            root: self.isolate.box_dir(id),
            slots: self.slots.clone(),
            isolate: self.isolate.clone(),
            released: false,
        })
    }
}

/// Exclusive ownership of one box for the duration of one submission.
#[derive(Debug)]
pub struct BoxLease {
    id: u32,
    root: PathBuf,
    slots: Arc<Slots>,
    isolate: Isolate,
    released: bool,
}

impl BoxLease {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The box working directory where source/input/output files live.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tear the box down and return its id to the pool. Consumes the
    /// lease; the drop backstop is skipped afterwards.
    pub async fn release(mut self) {
        self.released = true;
        if let Err(e) = self.isolate.cleanup(self.id).await {
            warn!(box_id = self.id, error = %e, "box cleanup failed");
        }
        self.slots.put(self.id).await;
        debug!(box_id = self.id, "box released");
    }
}

impl Drop for BoxLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Cannot await in Drop; spawn the cleanup so the box is still
        // returned on early-return, panic and cancellation paths.
        let id = self.id;
        let slots = self.slots.clone();
        let isolate = self.isolate.clone();
        tokio::spawn(async move {
            if let Err(e) = isolate.cleanup(id).await {
                warn!(box_id = id, error = %e, "box cleanup failed in drop backstop");
            }
            slots.put(id).await;
            debug!(box_id = id, "box released by drop backstop");
        });
    }
}
