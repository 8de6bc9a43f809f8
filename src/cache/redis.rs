use redis::Client;

// Redis cache key prefixes
pub const COMMENT_COUNT_KEY_PREFIX: &str = "post:comment_count";
pub const COMMENT_RATE_LIMIT_KEY_PREFIX: &str = "rate_limit:comment";

/// Thin wrapper around the Redis client. The whole cache is optional: every
/// caller falls back to Postgres when no client is configured.
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub fn new(client: Client) -> Self {
        // Connection validation happens on first use
        Self { client }
    }

    // Get the client
    pub fn get_client(&self) -> &Client {
        &self.client
    }
}
