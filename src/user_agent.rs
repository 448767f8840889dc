//! User-Agent strings for live queries and archive downloads.
//!
//! Live queries identify the tool. Archive downloads rotate through common
//! browser identities, one pick per request.

use rand::seq::SliceRandom;

/// Browser identities used for archive downloads.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Default User-Agent for live query requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("newsfeed/{version} (news-research-tool)")
}

/// Picks a random browser User-Agent.
#[must_use]
pub fn random_identity() -> &'static str {
    BROWSER_USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(BROWSER_USER_AGENTS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_names_tool_and_version() {
        let ua = default_user_agent();
        assert_eq!(
            ua,
            format!("newsfeed/{} (news-research-tool)", env!("CARGO_PKG_VERSION"))
        );
        assert!(!ua.contains("http"), "got: {ua}");
    }

    #[test]
    fn test_random_identity_is_a_known_browser() {
        for _ in 0..50 {
            let ua = random_identity();
            assert!(BROWSER_USER_AGENTS.contains(&ua));
            assert!(ua.starts_with("Mozilla/5.0"));
        }
    }

    #[test]
    fn test_random_identity_varies() {
        let picks: std::collections::HashSet<&str> = (0..200).map(|_| random_identity()).collect();
        assert!(picks.len() > 1, "expected more than one identity in 200 picks");
    }
}
