use crate::{HostingPlatform, RateLimit, Result, StatsError};
use tracing::info;

/// Abort the run when the platform quota is used up.
///
/// Runs before any statistics are fetched; there is no retry.
pub async fn check_rate_limit(platform: &dyn HostingPlatform) -> Result<RateLimit> {
    let limit = platform.rate_limit().await?;
    let reset = limit
        .reset_at()
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| limit.reset.to_string());

    info!(
        "Rate limit: {} of {} requests remaining ({} used), resets at {}",
        limit.remaining, limit.limit, limit.used, reset
    );

    if limit.is_exhausted() {
        return Err(StatsError::RateLimitExceeded {
            limit: limit.limit,
            reset,
        });
    }
    Ok(limit)
}
