use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RateLimits;
use crate::error::AppError;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// How often idle client keys are dropped from every limiter.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// A keyed limiter for one route group, plus how it identifies clients.
pub struct RouteLimiter {
    limiter: IpRateLimiter,
    trust_forwarded_for: bool,
}

impl RouteLimiter {
    pub fn new(quota: Quota, trust_forwarded_for: bool) -> Self {
        Self { limiter: RateLimiter::keyed(quota), trust_forwarded_for }
    }

    pub fn per_minute(requests: u32, trust_forwarded_for: bool) -> Self {
        Self::new(Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN)), trust_forwarded_for)
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    /// Number of client keys currently tracked.
    pub fn key_count(&self) -> usize {
        self.limiter.len()
    }

    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

/// One keyed limiter per public route group.
#[derive(Clone)]
pub struct RateLimiters {
    pub contact: Arc<RouteLimiter>,
    pub booking: Arc<RouteLimiter>,
    pub invoice: Arc<RouteLimiter>,
}

impl RateLimiters {
    pub fn new(limits: &RateLimits) -> Self {
        let trust = limits.trust_forwarded_for;
        Self {
            contact: Arc::new(RouteLimiter::per_minute(limits.contact_per_minute, trust)),
            booking: Arc::new(RouteLimiter::per_minute(limits.booking_per_minute, trust)),
            invoice: Arc::new(RouteLimiter::per_minute(limits.invoice_per_minute, trust)),
        }
    }

    pub fn prune(&self) {
        self.contact.prune();
        self.booking.prune();
        self.invoice.prune();
    }

    pub fn key_count(&self) -> usize {
        self.contact.key_count() + self.booking.key_count() + self.invoice.key_count()
    }
}

/// Drops idle client keys on a fixed interval for as long as the server runs.
pub fn spawn_pruning(limiters: RateLimiters) -> JoinHandle<()> {
    info!("Starting rate limiter pruning every {}s", PRUNE_INTERVAL.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            limiters.prune();
            debug!("Rate limiter keys after pruning: {}", limiters.key_count());
        }
    })
}

/// The socket peer, or the first `X-Forwarded-For` hop when the proxy is trusted.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> IpAddr {
    let forwarded = || -> Option<IpAddr> {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse().ok())
    };

    trust_forwarded_for
        .then(forwarded)
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn enforce(
    State(limiter): State<Arc<RouteLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
    let ip = client_ip(request.headers(), peer, limiter.trust_forwarded_for);

    if !limiter.check(ip) {
        warn!("Rate limit exceeded for {} on {}", ip, request.uri().path());
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}
