use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use hostq_domain::{LookupAnswer, LookupMethod};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::request::{CompletedLookup, LookupRequest};
use crate::cache::HostCache;
use crate::cancel::CancelToken;
use crate::ports::NameResolver;

pub(crate) struct Worker {
    pub id: u64,
    pub resolver: Arc<dyn NameResolver>,
    pub cache: Arc<HostCache>,
    pub requests: Receiver<LookupRequest>,
    pub completed: Sender<CompletedLookup>,
    /// Set when this specific worker is retired by a pool shrink.
    pub stop: CancelToken,
    pub stop_all: CancelToken,
    /// When set at shutdown, workers keep pulling until the queue is empty.
    pub finish_queued: Arc<AtomicBool>,
    pub queue_poll: Duration,
}

impl Worker {
    pub(crate) fn run(self) {
        debug!(worker = self.id, "Resolver worker started");
        loop {
            if (self.stop.is_cancelled() || self.stop_all.is_cancelled())
                && (!self.finish_queued.load(Ordering::Acquire) || self.requests.is_empty())
            {
                break;
            }
            match self.requests.recv_timeout(self.queue_poll) {
                Ok(request) => self.process(request),
                // Bounded wait so shutdown and retirement are observed.
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!(worker = self.id, "Resolver worker stopped");
    }

    fn process(&self, request: LookupRequest) {
        let LookupRequest {
            method,
            argument,
            callback,
            extras,
        } = request;

        let mut answer = self.cache.lookup(method, &argument);
        if answer.is_none() {
            answer = self.resolve(method, &argument);
            if let Some(answer) = &answer {
                self.cache.insert(method, &argument, answer.clone());
            }
        }

        // Published even on failure so every request completes exactly once.
        let completed = CompletedLookup {
            callback,
            answer,
            extras,
        };
        if self.completed.send(completed).is_err() {
            warn!(worker = self.id, "Completion queue closed, dropping result");
        }
    }

    fn resolve(&self, method: LookupMethod, argument: &str) -> Option<LookupAnswer> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match method {
            LookupMethod::Forward => self
                .resolver
                .resolve_host(argument)
                .map(LookupAnswer::Address),
            LookupMethod::ForwardExtended => self
                .resolver
                .resolve_host_extended(argument)
                .map(LookupAnswer::Host),
            LookupMethod::Reverse => self
                .resolver
                .resolve_addr(argument)
                .map(LookupAnswer::Host),
            LookupMethod::AddrInfo => self
                .resolver
                .resolve_addr_info(argument)
                .map(LookupAnswer::AddrInfo),
        }));

        match outcome {
            Ok(Ok(answer)) => Some(answer),
            Ok(Err(e)) => {
                warn!(
                    worker = self.id,
                    method = method.as_str(),
                    argument = %argument,
                    error = %e,
                    "Lookup failed"
                );
                None
            }
            Err(_) => {
                error!(
                    worker = self.id,
                    method = method.as_str(),
                    argument = %argument,
                    "Resolver panicked during lookup"
                );
                None
            }
        }
    }
}
