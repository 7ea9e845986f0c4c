//! Static reward tiers and the manual fallback channel
//!
//! Codes and tier metadata are compile-time constants. Availability counts
//! are display copy only; nothing is decremented or checked at redemption.

use serde::Serialize;

/// App Store identifier of the Nyxa app
pub const APP_STORE_APP_ID: &str = "6756638306";

/// Offer-code redemption endpoint
pub const REDEEM_BASE_URL: &str = "https://apps.apple.com/redeem";

/// One redeemable offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardTier {
    pub id: &'static str,
    pub redemption_code: &'static str,
    pub display_title: &'static str,
    pub description: &'static str,
    pub value_label: &'static str,
    pub availability_count: u32,
}

pub const REWARD_TIERS: &[RewardTier] = &[
    RewardTier {
        id: "free-year",
        redemption_code: "REDDIT26",
        display_title: "🏆 FREE Full Year",
        description: "1 year of Nyxa Premium",
        value_label: "$59.99 value",
        availability_count: 100,
    },
    RewardTier {
        id: "free-month",
        redemption_code: "FREEMONTH",
        display_title: "🥈 FREE Month",
        description: "1 month of Premium access",
        value_label: "$4.99 value",
        availability_count: 100,
    },
    RewardTier {
        id: "half-year",
        redemption_code: "GLOBAL50",
        display_title: "🎁 50% Off Year",
        description: "Half off annual subscription",
        value_label: "Save $29.99",
        availability_count: 500,
    },
    RewardTier {
        id: "half-month",
        redemption_code: "MONTH50",
        display_title: "✨ 50% Off Month",
        description: "Half off monthly subscription",
        value_label: "Save $2.49",
        availability_count: 600,
    },
];

impl RewardTier {
    /// App Store redemption link for this tier
    pub fn redeem_url(&self) -> String {
        format!(
            "{}?ctx=offercodes&id={}&code={}",
            REDEEM_BASE_URL, APP_STORE_APP_ID, self.redemption_code
        )
    }

    pub fn link(&self) -> RewardLink {
        RewardLink {
            id: self.id,
            display_title: self.display_title,
            description: self.description,
            value_label: self.value_label,
            availability_count: self.availability_count,
            redeem_url: self.redeem_url(),
        }
    }
}

/// Reward tier as presented to a verified visitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardLink {
    pub id: &'static str,
    pub display_title: &'static str,
    pub description: &'static str,
    pub value_label: &'static str,
    pub availability_count: u32,
    pub redeem_url: String,
}

/// All tiers as redemption links
pub fn reward_links() -> Vec<RewardLink> {
    REWARD_TIERS.iter().map(RewardTier::link).collect()
}

/// Human-operated escape hatch offered when automatic verification fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManualFallback {
    pub handle: &'static str,
    pub url: &'static str,
    pub instructions: &'static str,
}

pub const MANUAL_FALLBACK: ManualFallback = ManualFallback {
    handle: "@MohamedSaid__",
    url: "https://x.com/MohamedSaid__",
    instructions: "Having issues with verification? Write a 5-star review, take a screenshot \
                   and send it as a direct message; the redeem link will be sent personally.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn redeem_url_follows_offer_code_template() {
        let tier = REWARD_TIERS[0];
        assert_eq!(
            tier.redeem_url(),
            "https://apps.apple.com/redeem?ctx=offercodes&id=6756638306&code=REDDIT26"
        );
    }

    #[test]
    fn tier_ids_and_codes_are_unique() {
        let ids: HashSet<_> = REWARD_TIERS.iter().map(|t| t.id).collect();
        let codes: HashSet<_> = REWARD_TIERS.iter().map(|t| t.redemption_code).collect();
        assert_eq!(ids.len(), REWARD_TIERS.len());
        assert_eq!(codes.len(), REWARD_TIERS.len());
    }

    #[test]
    fn links_cover_every_tier() {
        let links = reward_links();
        assert_eq!(links.len(), 4);
        assert!(links.iter().all(|l| l.redeem_url.ends_with(
            REWARD_TIERS.iter().find(|t| t.id == l.id).unwrap().redemption_code
        )));
    }
}
