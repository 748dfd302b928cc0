//! Pause between timed-out attempts of the retry strategy.
//!
//! The pause doubles with every retry of the same call, stays under the
//! configured maximum, and gets up to a tenth of extra jitter so waiters that
//! timed out together do not hit the pool again in lockstep.

use std::time::Duration;
use rand::Rng;

/// Pause before the `retry`-th retry of one call. The first attempt (`retry == 0`)
/// and a zero base never pause.
pub fn retry_delay(retry: u32, base_ms: u64, max_ms: u64) -> Duration {
    if retry == 0 || base_ms == 0 {
        return Duration::ZERO;
    }

    let factor = 1u64.checked_shl(retry - 1).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor).min(max_ms);
    let spread = delay_ms / 10;
    let jitter_ms = match spread {
        0 => 0,
        _ => rand::thread_rng().gen_range(0..spread),
    };

    Duration::from_millis(delay_ms + jitter_ms)
}
