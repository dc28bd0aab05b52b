use chrono::Utc;
use redis::RedisResult;

use crate::app_config::RateLimitConfig;

/// Fixed-window request counter shared by every API instance.
///
/// Each client gets one key per window (`ratelimit:{client}:{window}`); keys outlive their
/// window by one period and then expire.
#[derive(Clone)]
pub struct RedisRateLimiter {
    client: redis::Client,
    limit: i64,
    window_seconds: i64,
}

impl RedisRateLimiter {
    pub fn new(connection_string: &str, config: &RateLimitConfig) -> RedisResult<Self> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            limit: config.requests,
            window_seconds: config.window_seconds.max(1),
        })
    }

    /// Counts one request for `client_key`; `false` once the window's budget is spent.
    pub async fn allow(&self, client_key: &str) -> RedisResult<bool> {
        let key = window_key(client_key, Utc::now().timestamp(), self.window_seconds);
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .expire(&key, self.window_seconds * 2)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= self.limit)
    }
}

fn window_key(client_key: &str, now: i64, window_seconds: i64) -> String {
    format!("ratelimit:{}:{}", client_key, now.div_euclid(window_seconds))
}
