use std::{
    env,
    net::IpAddr,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use rocket::{
    State,
    http::Status,
    request::{self, FromRequest, Request},
};
use tracing::{debug, warn};

/// A named request budget, overridable through the environment. Buckets are
/// tracked per client ip and rule, so hammering one endpoint does not starve
/// the others.
#[derive(Debug, Clone, Copy)]
pub struct RateRule {
    pub name: &'static str,
    env_var: &'static str,
    default_per_minute: u32,
}

pub const CREATE_RULE: RateRule = RateRule {
    name: "create",
    env_var: "RATE_LIMIT_GAMES_PER_MINUTE",
    default_per_minute: 10,
};

pub const SCORES_RULE: RateRule = RateRule {
    name: "scores",
    env_var: "RATE_LIMIT_SCORES_PER_MINUTE",
    default_per_minute: 60,
};

impl RateRule {
    fn capacity(&self) -> u32 {
        env::var(self.env_var)
            .unwrap_or_else(|_| self.default_per_minute.to_string())
            .parse()
            .unwrap_or(self.default_per_minute)
    }
}

#[derive(Debug)]
pub struct TokenBucket {
    last_refill: Instant,
    tokens: u32,
    capacity: u32,
    refill_rate: u32,
    refill_interval: Duration,
}

impl TokenBucket {
    fn new(capacity: u32, refill_rate: u32, refill_interval: Duration) -> Self {
        debug!(
            "Creating new token bucket: capacity={}, refill_rate={}, interval={}s",
            capacity,
            refill_rate,
            refill_interval.as_secs()
        );
        Self {
            last_refill: Instant::now(),
            tokens: capacity,
            capacity,
            refill_rate,
            refill_interval,
        }
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            debug!("Token consumed, remaining: {}", self.tokens);
            true
        } else {
            debug!("No tokens available for consumption");
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        let intervals = elapsed.as_secs() / self.refill_interval.as_secs();

        if intervals > 0 {
            let old_tokens = self.tokens;
            let tokens_to_add = (intervals as u32) * self.refill_rate;
            self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
            self.last_refill = now;
            if self.tokens != old_tokens {
                debug!(
                    "Token bucket refilled: {} -> {} tokens",
                    old_tokens, self.tokens
                );
            }
        }
    }
}

pub type RateLimiter = DashMap<(IpAddr, &'static str), TokenBucket>;

pub fn create_rate_limiter() -> RateLimiter {
    DashMap::new()
}

/// The address to rate limit on, honoring reverse-proxy headers before the
/// socket address.
pub struct ClientIp(pub IpAddr);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientIp {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let ip = req
            .headers()
            .get_one("X-Forwarded-For")
            .and_then(|header| header.split(',').next())
            .and_then(|ip| ip.trim().parse().ok())
            .or_else(|| {
                req.headers()
                    .get_one("X-Real-IP")
                    .and_then(|ip| ip.parse().ok())
            })
            .or_else(|| req.client_ip())
            .unwrap_or_else(|| "127.0.0.1".parse().unwrap());

        request::Outcome::Success(ClientIp(ip))
    }
}

pub fn check_rate_limit(
    rate_limiter: &State<RateLimiter>,
    client_ip: &ClientIp,
    rule: &RateRule,
) -> Result<(), Status> {
    let capacity = rule.capacity();
    let refill_interval = Duration::from_secs(60); // 1 minute
    let refill_rate = capacity; // Refill to full capacity every minute

    let mut entry = rate_limiter
        .entry((client_ip.0, rule.name))
        .or_insert_with(|| TokenBucket::new(capacity, refill_rate, refill_interval));

    if entry.try_consume() {
        debug!("Rate limit check passed for {} ({})", client_ip.0, rule.name);
        Ok(())
    } else {
        warn!(
            "Rate limit exceeded for {} ({}) - rejecting request",
            client_ip.0, rule.name
        );
        Err(Status::TooManyRequests)
    }
}
