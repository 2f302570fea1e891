//! Constants for enscope.
//!
//! Endpoint defaults, the retry budget, and the set of well-known ENS text
//! record keys queried when assembling a profile.

// ═══════════════════════════════════════════════════════════════════════════════
// RPC ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Environment variable holding an optional preferred primary RPC endpoint.
///
/// When set, the endpoint pool is `[primary, ...fallbacks]`; when unset the
/// pool is the fallback list verbatim.
pub const RPC_URL_ENV: &str = "ETH_RPC_URL";

/// Public fallback RPC endpoints, in priority order.
///
/// The pool is guaranteed non-empty because this list is always appended.
pub const FALLBACK_RPC_URLS: [&str; 4] = [
    "https://ethereum.publicnode.com",
    "https://eth.llamarpc.com",
    "https://rpc.ankr.com/eth",
    "https://cloudflare-eth.com",
];

/// Maximum attempts per logical resolution call before giving up.
///
/// Each failed attempt rotates to the next endpoint in the pool, so a fully
/// degraded pool costs at most `min(MAX_RPC_ATTEMPTS, pool_size)` distinct
/// endpoints per call.
pub const MAX_RPC_ATTEMPTS: usize = 3;

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Well-known ENS text record keys fetched by the all-records aggregation.
///
/// Global keys per ENSIP-5 plus the common service identifiers.
pub const TEXT_RECORD_KEYS: [&str; 12] = [
    "email",
    "url",
    "avatar",
    "description",
    "notice",
    "keywords",
    "com.discord",
    "com.github",
    "com.reddit",
    "com.twitter",
    "org.telegram",
    "io.keybase",
];
