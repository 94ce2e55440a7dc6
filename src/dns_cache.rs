//! Reverse-DNS lookups with a bounded, TTL-aware memoizing cache.
//!
//! The cache wraps a single direct PTR lookup per query. Failures are
//! classified into a small taxonomy (`ERRNO <n>`, `Timeout`,
//! `Failed (Unknown)`) and never propagate past this boundary; every query
//! answers with a `(hostname-or-none, error-tag-or-none)` pair.
//!
//! Staleness is read-refresh only: a hit older than the TTL triggers one
//! fresh resolution whose result is returned to the caller but *not*
//! written back into the slot. The slot is replaced only when the LRU
//! evicts it and a later miss re-resolves. Successive callers may therefore
//! still observe the conceptually stale tuple; that prolongs a DNS outage's
//! visible window by one cycle at worst and never corrupts data.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use lru::LruCache;

/// One memoized resolution with its wall-clock age marker.
#[derive(Debug, Clone)]
struct DnsCacheEntry {
    hostname: Option<String>,
    error: Option<String>,
    resolved_at: Instant,
}

/// TTL-aware LRU memoization over the direct reverse resolver.
pub struct ReverseDnsCache {
    resolver: Arc<TokioAsyncResolver>,
    ttl: Duration,
    /// `None` when caching is disabled; every call then resolves directly.
    cache: Option<LruCache<String, DnsCacheEntry>>,
}

impl ReverseDnsCache {
    /// Creates the cache. With `enabled == false` no memoization happens.
    pub fn new(
        resolver: Arc<TokioAsyncResolver>,
        enabled: bool,
        max_size: usize,
        ttl_seconds: u64,
    ) -> Self {
        let cache = if enabled {
            let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
            log::info!(
                "DNS cache initialized with max_size: {capacity}, TTL: {ttl_seconds}s"
            );
            Some(LruCache::new(capacity))
        } else {
            log::info!("DNS cache is disabled by configuration");
            None
        };
        ReverseDnsCache {
            resolver,
            ttl: Duration::from_secs(ttl_seconds),
            cache,
        }
    }

    /// Resolves `ip` to a hostname, going through the cache when enabled.
    ///
    /// Returns `(hostname, error_tag)`; exactly one side is `Some` except
    /// for the defensive case where a resolver returns neither.
    pub async fn lookup(&mut self, ip: &str) -> (Option<String>, Option<String>) {
        let Some(cache) = self.cache.as_mut() else {
            log::debug!("DNS cache not used for {ip}, performing direct lookup");
            return resolve_direct(&self.resolver, ip).await;
        };

        if let Some(entry) = cache.get(ip) {
            if entry.resolved_at.elapsed() > self.ttl {
                // Read-refresh: answer this caller freshly, leave the slot
                // to the memoization layer's own re-invocation
                log::info!("DNS cache entry for {ip} is stale, performing fresh lookup");
                return resolve_direct(&self.resolver, ip).await;
            }
            log::debug!("Using valid cached DNS entry for {ip}");
            return (entry.hostname.clone(), entry.error.clone());
        }

        let (hostname, error) = resolve_direct(&self.resolver, ip).await;
        cache.put(
            ip.to_string(),
            DnsCacheEntry {
                hostname: hostname.clone(),
                error: error.clone(),
                resolved_at: Instant::now(),
            },
        );
        (hostname, error)
    }

    #[cfg(test)]
    pub(crate) fn prime(&mut self, ip: &str, hostname: Option<&str>, error: Option<&str>) {
        self.prime_at(ip, hostname, error, Instant::now());
    }

    #[cfg(test)]
    pub(crate) fn prime_at(
        &mut self,
        ip: &str,
        hostname: Option<&str>,
        error: Option<&str>,
        resolved_at: Instant,
    ) {
        if let Some(cache) = self.cache.as_mut() {
            cache.put(
                ip.to_string(),
                DnsCacheEntry {
                    hostname: hostname.map(str::to_string),
                    error: error.map(str::to_string),
                    resolved_at,
                },
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_hostname(&mut self, ip: &str) -> Option<Option<String>> {
        self.cache
            .as_mut()
            .and_then(|c| c.get(ip).map(|e| e.hostname.clone()))
    }
}

/// Performs one reverse lookup against the system resolver.
///
/// Never returns an error: failures are folded into the error tag.
async fn resolve_direct(
    resolver: &TokioAsyncResolver,
    ip: &str,
) -> (Option<String>, Option<String>) {
    let addr: std::net::IpAddr = match ip.parse() {
        Ok(addr) => addr,
        Err(_) => {
            log::warn!("Reverse lookup skipped, not a valid IP address: {ip}");
            return (None, Some("Failed (Unknown)".to_string()));
        }
    };

    match resolver.reverse_lookup(addr).await {
        Ok(response) => match response.iter().next() {
            Some(name) => {
                let hostname = name.to_utf8().trim_end_matches('.').to_string();
                (Some(hostname), None)
            }
            None => (None, Some("Failed (Unknown)".to_string())),
        },
        Err(e) => {
            let tag = classify_resolve_error(e.kind());
            log::debug!("Reverse lookup failed for IP {ip}: {tag}");
            (None, Some(tag))
        }
    }
}

/// Maps resolver failures onto the taxonomy the sink records.
fn classify_resolve_error(kind: &ResolveErrorKind) -> String {
    match kind {
        ResolveErrorKind::Timeout => "Timeout".to_string(),
        ResolveErrorKind::Io(e) => match e.raw_os_error() {
            Some(errno) => format!("ERRNO {errno}"),
            None => "Failed (Unknown)".to_string(),
        },
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            format!("ERRNO {}", u16::from(*response_code))
        }
        _ => "Failed (Unknown)".to_string(),
    }
}
