//! Mesh-aware connection handle.
//!
//! # Responsibilities
//! - Route each call to an instance chosen by the pool
//! - Classify every outcome exactly once through the report analyzer
//! - Feed the classification back into the instance circuit breaker

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tonic::transport::Channel;
use tonic::Status;

use crate::mesh::pool::InstancePool;
use crate::mesh::report::{DoneInfo, ReportInfoAnalyzer};
use crate::mesh::target::Target;
use crate::observability::metrics;

struct Inner {
    target: Target,
    namespace: String,
    pool: InstancePool,
    analyzer: Arc<dyn ReportInfoAnalyzer>,
    closed: AtomicBool,
}

/// A dialed service. Cheap to clone and safe to share across tasks.
#[derive(Clone)]
pub struct MeshConnection {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MeshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshConnection")
            .field("target", &self.inner.target)
            .field("namespace", &self.inner.namespace)
            .field("pool", &self.inner.pool)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl MeshConnection {
    pub(crate) fn new(
        target: Target,
        namespace: String,
        pool: InstancePool,
        analyzer: Arc<dyn ReportInfoAnalyzer>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                target,
                namespace,
                pool,
                analyzer,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn pool(&self) -> &InstancePool {
        &self.inner.pool
    }

    /// Stop routing calls. Later calls fail with `Unavailable`.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(mesh_target = %self.inner.target, "Mesh connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Run one unary call on a selected instance channel.
    pub async fn invoke<F, Fut, R>(&self, call: F) -> Result<R, Status>
    where
        F: FnOnce(Channel) -> Fut,
        Fut: Future<Output = Result<R, Status>>,
    {
        let start = Instant::now();
        let service = self.inner.pool.service();

        let (guard, result) = if self.is_closed() {
            (None, Err(Status::unavailable("connection closed")))
        } else {
            match self.inner.pool.get() {
                Some(guard) => {
                    let result = call(guard.channel()).await;
                    (Some(guard), result)
                }
                None => (
                    None,
                    Err(Status::unavailable(format!(
                        "no available instance for service {} in namespace {}",
                        service, self.inner.namespace
                    ))),
                ),
            }
        };

        let elapsed = start.elapsed();
        let info = DoneInfo {
            err: result.as_ref().err(),
            instance: guard.as_ref().map(|g| g.addr),
            elapsed,
        };
        let (ret, code) = self.inner.analyzer.analyze(&info);
        metrics::record_call(service, ret, code, elapsed);

        if let Some(guard) = guard {
            let addr = guard.addr;
            let probe = guard.is_probe();
            let state = guard.report(ret);
            metrics::record_circuit_state(&addr.to_string(), state);
            tracing::trace!(
                instance = %addr,
                result = ret.as_str(),
                code,
                probe,
                circuit = state.as_str(),
                "Call reported"
            );
        }

        result
    }
}
