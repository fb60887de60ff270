use std::time::Duration;

use log::*;
use storefront_payment_engine::intent_cache::PendingIntentCache;
use tokio::task::JoinHandle;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Starts the background task that sweeps abandoned payment intents out of the cache. The task runs for the
/// lifetime of the server; do not await the returned handle.
pub fn start_expiry_worker(cache: PendingIntentCache) -> JoinHandle<()> {
    info!("🕰️ Pending intent expiry worker is starting. Intents expire after {} minutes.", cache.ttl().num_minutes());
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            timer.tick().await;
            let evicted = cache.evict_expired();
            if evicted.is_empty() {
                trace!("🕰️ No pending intents have expired");
            } else {
                info!("🕰️ {} abandoned payment intent(s) expired", evicted.len());
                debug!(
                    "🕰️ Expired references: {}",
                    evicted.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(", ")
                );
            }
        }
    })
}
