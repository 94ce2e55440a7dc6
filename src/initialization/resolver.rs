//! DNS resolver initialization.
//!
//! This module provides functions to initialize the DNS resolver with proper
//! timeout configuration.

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;

use crate::config::DNS_TIMEOUT_SECS;

/// Initializes the DNS resolver for reverse lookups.
///
/// Creates a resolver from the default configuration with short timeouts so
/// a slow or unresponsive DNS server cannot stall a whole extraction pass
/// for long. The resolver is used exclusively for PTR lookups on client IPs.
///
/// # Returns
///
/// A configured `TokioAsyncResolver` wrapped in `Arc` for sharing.
pub fn init_resolver() -> Arc<TokioAsyncResolver> {
    use hickory_resolver::config::{ResolverConfig, ResolverOpts};

    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(DNS_TIMEOUT_SECS);
    opts.attempts = 2; // fail faster on dead servers
                       // Client IPs are absolute; never append search domains
    opts.ndots = 0;

    Arc::new(TokioAsyncResolver::tokio(ResolverConfig::default(), opts))
}
