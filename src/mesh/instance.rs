//! Service instance abstraction.
//!
//! # Responsibilities
//! - Represent a single instance of a service
//! - Hold the lazily connected gRPC channel for that instance
//! - Track in-flight calls (for Least Connections LB)
//! - Gate calls through the instance circuit breaker

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};

use crate::mesh::report::RetStatus;
use crate::resilience::{Admission, CircuitBreaker, CircuitState};

/// Channel settings applied to every instance endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointSettings {
    pub connect_timeout: Duration,
    pub call_timeout: Duration,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            call_timeout: Duration::from_secs(3),
        }
    }
}

/// A single service instance.
#[derive(Debug)]
pub struct Instance {
    /// The address of the instance.
    pub addr: SocketAddr,
    channel: Channel,
    in_flight: AtomicUsize,
    breaker: Option<CircuitBreaker>,
}

impl Instance {
    /// Build an instance whose channel connects on first use.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect_lazy(
        addr: SocketAddr,
        settings: &EndpointSettings,
        breaker: Option<CircuitBreaker>,
    ) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(format!("http://{}", addr))?
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.call_timeout)
            .connect_lazy();
        Ok(Self {
            addr,
            channel,
            in_flight: AtomicUsize::new(0),
            breaker,
        })
    }

    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// Number of calls currently routed to this instance.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.as_ref().map_or(CircuitState::Closed, |b| b.state())
    }

    /// Whether the breaker would admit a call. Never changes state.
    pub fn admits(&self) -> bool {
        self.breaker.as_ref().map_or(true, |b| b.admits())
    }

    /// Admit a call and return a guard that tracks it until it is reported.
    pub fn try_acquire(self: &Arc<Self>) -> Option<InstanceGuard> {
        let admission = match &self.breaker {
            Some(breaker) => Some(breaker.try_acquire()?),
            None => None,
        };
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        Some(InstanceGuard {
            instance: self.clone(),
            admission,
        })
    }
}

/// A RAII guard for one call routed to an instance.
///
/// Dropping the guard without reporting releases the breaker admission
/// without counting a success or failure.
#[derive(Debug)]
pub struct InstanceGuard {
    pub instance: Arc<Instance>,
    admission: Option<Admission>,
}

impl InstanceGuard {
    /// Whether this call is the breaker's Half-Open probe.
    pub fn is_probe(&self) -> bool {
        self.admission == Some(Admission::Probe)
    }

    /// Feed the classified outcome to the breaker. Returns the new state.
    pub fn report(mut self, status: RetStatus) -> CircuitState {
        match (&self.instance.breaker, self.admission.take()) {
            (Some(breaker), Some(admission)) => match status {
                RetStatus::Success => breaker.on_success(admission),
                RetStatus::Fail => breaker.on_failure(admission),
            },
            _ => CircuitState::Closed,
        }
    }
}

impl Deref for InstanceGuard {
    type Target = Instance;
    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.instance.in_flight.fetch_sub(1, Ordering::Relaxed);
        if let (Some(breaker), Some(admission)) = (&self.instance.breaker, self.admission.take()) {
            breaker.release(admission);
        }
    }
}
