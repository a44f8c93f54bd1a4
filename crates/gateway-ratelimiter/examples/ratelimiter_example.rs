//! Fixed-window rate limiting and the security (anti-abuse) variant.
//!
//! Run with: cargo run --example ratelimiter_example -p gateway-ratelimiter

use std::sync::Arc;
use std::time::Duration;

use gateway_counterstore::MemoryCounterStore;
use gateway_ratelimiter::{
    RateLimiter, RateLimiterConfigBuilder, SecurityRateLimiter, SecurityRateLimiterConfigBuilder,
    SecurityVerdict,
};

#[tokio::main]
async fn main() {
    println!("=== Fixed-window rate limiter ===\n");
    demo_fixed_window().await;

    println!("\n=== Security rate limiter (login anti-abuse) ===\n");
    demo_security_limiter().await;
}

async fn demo_fixed_window() {
    let store = Arc::new(MemoryCounterStore::with_default_interval());
    let limiter = RateLimiter::new(
        store,
        RateLimiterConfigBuilder::new()
            .max_requests(5)
            .window(Duration::from_secs(1))
            .name("demo")
            .build(),
    );

    println!("Sending 8 requests (limit: 5 per second)...");
    for i in 1..=8 {
        let verdict = limiter.check("ip:203.0.113.5", false).await;
        if verdict.allowed {
            println!("  request {i}: admitted, {} remaining", verdict.remaining);
        } else {
            println!("  request {i}: refused, retry after {}s", verdict.retry_after_secs);
        }
    }
}

async fn demo_security_limiter() {
    let store = Arc::new(MemoryCounterStore::with_default_interval());
    let limiter = SecurityRateLimiter::new(
        store,
        SecurityRateLimiterConfigBuilder::new()
            .max_attempts(3)
            .attempt_window(Duration::from_secs(60))
            .block_duration(Duration::from_secs(300))
            .name("login")
            .build(),
    );

    println!("Recording failed login attempts for user:alice...");
    for i in 1..=4 {
        match limiter.record_failure("user:alice").await {
            SecurityVerdict::Allowed { attempts, max_attempts } => {
                println!("  attempt {i}: allowed ({attempts}/{max_attempts})");
            }
            SecurityVerdict::Blocked { block_until_millis } => {
                println!("  attempt {i}: just tripped the block, until {block_until_millis}");
            }
            SecurityVerdict::AlreadyBlocked { block_until_millis } => {
                println!("  attempt {i}: already blocked until {block_until_millis}");
            }
        }
    }

    limiter.record_success("user:bob").await;
    println!("user:bob had a successful login; their attempt counter stays at zero.");
}
