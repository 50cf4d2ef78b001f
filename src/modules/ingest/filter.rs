// Copyright © 2025 maildesk.io
// Licensed under Maildesk License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::LazyLock;

use regex::Regex;

/// Distinguishes human correspondence from automated or bulk senders.
///
/// This is a business-relevance predicate, not a security control: a
/// rejected message is dropped silently and never retried. Implementations
/// are expected to produce false negatives and false positives; the heuristic
/// below preserves the documented keyword and shape rules as they are.
pub trait SenderFilter: Send + Sync {
    fn admissible(&self, address: &str) -> bool;
}

pub static SENDER_FILTER: LazyLock<HeuristicSenderFilter> =
    LazyLock::new(HeuristicSenderFilter::new);

/// Keyword match against the full address, a role-account list for the local
/// part, a human-name shape check, and a dotted-domain requirement.
pub struct HeuristicSenderFilter {
    automated_keywords: &'static [&'static str],
    role_accounts: &'static [&'static str],
    local_part_shape: Regex,
}

const AUTOMATED_KEYWORDS: &[&str] = &[
    "no-reply",
    "noreply",
    "no_reply",
    "do-not-reply",
    "donotreply",
    "notification",
    "newsletter",
    "marketing",
    "mailer-daemon",
    "postmaster",
    "bounce",
    "unsubscribe",
    "facebook",
    "twitter",
    "linkedin",
    "instagram",
    "tiktok",
    "youtube",
    "amazon",
    "ebay",
    "paypal",
    "stripe",
    "shopify",
    "uber",
    "airbnb",
    "dropbox",
    "slack",
    "zoom",
    "github",
];

const ROLE_ACCOUNTS: &[&str] = &[
    "info", "support", "admin", "billing", "help", "contact", "sales", "service",
];

impl HeuristicSenderFilter {
    pub fn new() -> Self {
        Self {
            automated_keywords: AUTOMATED_KEYWORDS,
            role_accounts: ROLE_ACCOUNTS,
            local_part_shape: Regex::new(r"^[a-z][a-z0-9._'-]*$").unwrap(),
        }
    }
}

impl Default for HeuristicSenderFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SenderFilter for HeuristicSenderFilter {
    fn admissible(&self, address: &str) -> bool {
        let address = address.trim().to_lowercase();
        let Some((local_part, domain)) = address.split_once('@') else {
            return false;
        };
        if local_part.is_empty() || domain.is_empty() {
            return false;
        }

        // automated/bulk senders, matched anywhere in the full address
        if self
            .automated_keywords
            .iter()
            .any(|keyword| address.contains(keyword))
        {
            return false;
        }

        // generic role accounts
        if self.role_accounts.contains(&local_part) {
            return false;
        }

        // a human-looking local part: letters first, at least two of them
        if !self.local_part_shape.is_match(local_part) {
            return false;
        }
        if local_part.chars().filter(|c| c.is_ascii_alphabetic()).count() < 2 {
            return false;
        }

        // a deliverable domain has at least one dot
        domain.contains('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_human_addresses() {
        let filter = HeuristicSenderFilter::new();
        assert!(filter.admissible("jane.doe@acme.com"));
        assert!(filter.admissible("Mark_Twain@books.org"));
        assert!(filter.admissible("ann-lee@x.io"));
    }

    #[test]
    fn rejects_automated_senders() {
        let filter = HeuristicSenderFilter::new();
        assert!(!filter.admissible("no-reply@facebook.com"));
        assert!(!filter.admissible("noreply@shop.example"));
        assert!(!filter.admissible("newsletter@store.example"));
        assert!(!filter.admissible("mailer-daemon@mx.example"));
    }

    #[test]
    fn rejects_role_accounts() {
        let filter = HeuristicSenderFilter::new();
        assert!(!filter.admissible("support@acme.com"));
        assert!(!filter.admissible("info@acme.com"));
        assert!(!filter.admissible("billing@acme.com"));
    }

    #[test]
    fn rejects_non_human_shapes_and_bare_domains() {
        let filter = HeuristicSenderFilter::new();
        assert!(!filter.admissible("a1@acme"));
        assert!(!filter.admissible("a1@acme.com"));
        assert!(!filter.admissible("12345@acme.com"));
        assert!(!filter.admissible("jane@localhost"));
        assert!(!filter.admissible("not-an-address"));
    }
}
