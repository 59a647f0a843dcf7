//! Worker pool, lifecycle management, dispatch and drain.
//!
//! A [`ResolverPool`] owns the whole pipeline: the request and completion
//! queues, the worker threads, the shared TTL cache and its pruner. Callers
//! hold the pool by handle, so independent pools can coexist (and be torn
//! down) without any process-global state.

mod request;
mod worker;

pub use request::{Extras, LookupCallback};

use crossbeam_channel::{unbounded, Receiver, Sender};
use hostq_domain::{LookupAnswer, LookupMethod, PoolConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::cache::{spawn_pruner, CacheStats, HostCache, TtlBounds};
use crate::cancel::CancelToken;
use crate::errors::PoolError;
use crate::ports::NameResolver;
use request::{CompletedLookup, LookupRequest};
use worker::Worker;

struct WorkerHandle {
    id: u64,
    stop: CancelToken,
    join: JoinHandle<()>,
}

struct PoolState {
    desired_workers: usize,
    desired_ttl: Duration,
    workers: Vec<WorkerHandle>,
    next_worker_id: u64,
    cache: Option<Arc<HostCache>>,
    pruner: Option<JoinHandle<()>>,
}

/// Non-blocking name-resolution facade.
///
/// Lookups are enqueued with a callback and served by a fixed pool of
/// worker threads; completed results are delivered only when the caller
/// pumps [`ResolverPool::run`], so user callbacks never execute on a worker
/// thread.
pub struct ResolverPool {
    resolver: Arc<dyn NameResolver>,
    requests_tx: Sender<LookupRequest>,
    // The pool keeps one receiver so the request channel outlives worker
    // restarts; workers hold clones.
    requests_rx: Receiver<LookupRequest>,
    completed_tx: Sender<CompletedLookup>,
    completed_rx: Receiver<CompletedLookup>,
    stop_all: CancelToken,
    finish_queued: Arc<AtomicBool>,
    ttl_bounds: TtlBounds,
    queue_poll: Duration,
    prune_tick: Duration,
    // Serializes configure/run-startup/stop against each other.
    state: Mutex<PoolState>,
}

impl ResolverPool {
    /// Build an idle pool. No threads run until [`configure`] or [`run`]
    /// with `start_if_idle` is called.
    ///
    /// [`configure`]: ResolverPool::configure
    /// [`run`]: ResolverPool::run
    pub fn new(resolver: Arc<dyn NameResolver>, config: &PoolConfig) -> Self {
        let (requests_tx, requests_rx) = unbounded();
        let (completed_tx, completed_rx) = unbounded();
        Self {
            resolver,
            requests_tx,
            requests_rx,
            completed_tx,
            completed_rx,
            stop_all: CancelToken::new(),
            finish_queued: Arc::new(AtomicBool::new(false)),
            ttl_bounds: TtlBounds::new(config.ttl_floor(), config.ttl_ceiling()),
            queue_poll: config.queue_poll(),
            prune_tick: config.prune_tick(),
            state: Mutex::new(PoolState {
                desired_workers: config.workers,
                desired_ttl: config.cache_ttl(),
                workers: Vec::new(),
                next_worker_id: 0,
                cache: None,
                pruner: None,
            }),
        }
    }

    /// Update the desired worker count and/or cache TTL, then reconcile the
    /// running pool: create the cache on first use or retune its TTL, retire
    /// and join the oldest surplus workers, spawn any missing ones.
    ///
    /// Idempotent: calling with unchanged parameters changes nothing. Also
    /// rebuilds a pool previously torn down by [`ResolverPool::stop`].
    pub fn configure(
        &self,
        workers: Option<usize>,
        ttl: Option<Duration>,
    ) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        if let Some(workers) = workers {
            state.desired_workers = workers;
        }
        if let Some(ttl) = ttl {
            state.desired_ttl = ttl;
        }
        self.reconcile(&mut state)
    }

    fn reconcile(&self, state: &mut PoolState) -> Result<(), PoolError> {
        // A previous stop() leaves the token set; a rebuild starts clean.
        self.stop_all.reset();
        self.finish_queued.store(false, Ordering::Release);

        let cache = match &state.cache {
            Some(cache) => {
                cache.set_ttl(state.desired_ttl);
                Arc::clone(cache)
            }
            None => {
                let cache = Arc::new(HostCache::new(state.desired_ttl, self.ttl_bounds));
                let pruner = spawn_pruner(
                    Arc::clone(&cache),
                    self.stop_all.clone(),
                    self.prune_tick,
                )
                .map_err(|e| PoolError::thread_spawn("hostq-cache", e))?;
                state.cache = Some(Arc::clone(&cache));
                state.pruner = Some(pruner);
                cache
            }
        };

        if state.workers.len() > state.desired_workers {
            let surplus = state.workers.len() - state.desired_workers;
            info!(surplus, "Shrinking resolver pool, retiring oldest workers");
            let retired: Vec<WorkerHandle> = state.workers.drain(..surplus).collect();
            // Signal every retired worker before joining any, so they drain
            // their in-flight items concurrently.
            for handle in &retired {
                handle.stop.cancel();
            }
            for handle in retired {
                if handle.join.join().is_err() {
                    error!(worker = handle.id, "Resolver worker panicked before join");
                }
            }
        } else if state.workers.len() < state.desired_workers {
            let missing = state.desired_workers - state.workers.len();
            debug!(missing, "Growing resolver pool");
            for _ in 0..missing {
                let id = state.next_worker_id;
                state.next_worker_id += 1;
                let stop = CancelToken::new();
                let worker = Worker {
                    id,
                    resolver: Arc::clone(&self.resolver),
                    cache: Arc::clone(&cache),
                    requests: self.requests_rx.clone(),
                    completed: self.completed_tx.clone(),
                    stop: stop.clone(),
                    stop_all: self.stop_all.clone(),
                    finish_queued: Arc::clone(&self.finish_queued),
                    queue_poll: self.queue_poll,
                };
                let name = format!("hostq-worker-{id}");
                let join = thread::Builder::new()
                    .name(name.clone())
                    .spawn(move || worker.run())
                    .map_err(|e| PoolError::thread_spawn(name, e))?;
                state.workers.push(WorkerHandle { id, stop, join });
            }
        }

        Ok(())
    }

    /// Queue a forward lookup: name to a single address.
    pub fn lookup_host<F>(&self, name: impl Into<String>, extras: Extras, callback: F)
    where
        F: FnOnce(Option<LookupAnswer>, Extras) + Send + 'static,
    {
        self.dispatch(LookupMethod::Forward, name.into(), Box::new(callback), extras);
    }

    /// Queue an extended forward lookup: name to canonical name, aliases and
    /// all addresses.
    pub fn lookup_host_extended<F>(&self, name: impl Into<String>, extras: Extras, callback: F)
    where
        F: FnOnce(Option<LookupAnswer>, Extras) + Send + 'static,
    {
        self.dispatch(
            LookupMethod::ForwardExtended,
            name.into(),
            Box::new(callback),
            extras,
        );
    }

    /// Queue a reverse lookup: address literal to a host entry.
    pub fn lookup_addr<F>(&self, addr: impl Into<String>, extras: Extras, callback: F)
    where
        F: FnOnce(Option<LookupAnswer>, Extras) + Send + 'static,
    {
        self.dispatch(LookupMethod::Reverse, addr.into(), Box::new(callback), extras);
    }

    /// Queue an addr-info lookup: name to socket-address records.
    pub fn lookup_addr_info<F>(&self, name: impl Into<String>, extras: Extras, callback: F)
    where
        F: FnOnce(Option<LookupAnswer>, Extras) + Send + 'static,
    {
        self.dispatch(LookupMethod::AddrInfo, name.into(), Box::new(callback), extras);
    }

    /// Fire-and-forget: once shutdown has begun the request is silently
    /// discarded and the callback will never fire. Argument validity is the
    /// resolver's concern, not checked here.
    fn dispatch(
        &self,
        method: LookupMethod,
        argument: String,
        callback: LookupCallback,
        extras: Extras,
    ) {
        if self.stop_all.is_cancelled() {
            return;
        }
        info!(method = method.as_str(), argument = %argument, "Queueing lookup");
        let request = LookupRequest {
            method,
            argument,
            callback,
            extras,
        };
        // Both channel ends live as long as the pool, so this cannot fail
        // outside teardown.
        let _ = self.requests_tx.send(request);
    }

    /// Deliver completed lookups by invoking their callbacks on the calling
    /// thread, in completion order, until the queue is observed empty. Never
    /// blocks.
    ///
    /// With `start_if_idle`, a pool with no running workers is started first
    /// using the current configuration.
    pub fn run(&self, start_if_idle: bool) -> Result<(), PoolError> {
        if start_if_idle {
            let mut state = self.state.lock();
            if state.workers.is_empty() {
                self.reconcile(&mut state)?;
            }
        }
        while let Ok(completed) = self.completed_rx.try_recv() {
            let CompletedLookup {
                callback,
                answer,
                extras,
            } = completed;
            callback(answer, extras);
        }
        Ok(())
    }

    /// Stop the pool: signal every worker and the cache pruner, join them
    /// all, release the cache.
    ///
    /// With `drain`, workers first finish everything still in the request
    /// queue; the caller is expected to invoke [`ResolverPool::run`]
    /// afterwards to deliver those results. Dispatch stays a no-op until a
    /// subsequent [`ResolverPool::configure`] rebuilds the pool.
    pub fn stop(&self, drain: bool) {
        let mut state = self.state.lock();
        self.finish_queued.store(drain, Ordering::Release);
        self.stop_all.cancel();

        if !state.workers.is_empty() {
            info!(
                workers = state.workers.len(),
                drain, "Waiting for resolver workers to stop"
            );
        }
        for handle in state.workers.drain(..) {
            if handle.join.join().is_err() {
                error!(worker = handle.id, "Resolver worker panicked before join");
            }
        }
        if let Some(pruner) = state.pruner.take() {
            if pruner.join().is_err() {
                error!("Cache pruner panicked before join");
            }
        }
        if state.cache.take().is_some() {
            info!("All resolver workers stopped");
        }
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.state.lock().workers.len()
    }

    /// Counters of the current cache, if one exists.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.state.lock().cache.as_ref().map(|cache| cache.stats())
    }

    /// Empty the cache without touching workers or queued requests.
    pub fn clear_cache(&self) {
        if let Some(cache) = self.state.lock().cache.as_ref() {
            cache.clear();
        }
    }
}

impl Drop for ResolverPool {
    fn drop(&mut self) {
        self.stop(false);
    }
}
