//! Reward catalogue endpoint
//!
//! Lists every tier for the Acquisition page. Tier metadata is public; the
//! redemption links are what the Reward step adds.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::{
    models::{ManualFallback, RewardTier, MANUAL_FALLBACK, REWARD_TIERS},
    AppState,
};

/// Public view of a tier (no redemption code)
#[derive(Debug, Serialize)]
pub struct TierSummary {
    pub id: &'static str,
    pub display_title: &'static str,
    pub description: &'static str,
    pub value_label: &'static str,
    pub availability_count: u32,
}

impl From<&RewardTier> for TierSummary {
    fn from(tier: &RewardTier) -> Self {
        Self {
            id: tier.id,
            display_title: tier.display_title,
            description: tier.description,
            value_label: tier.value_label,
            availability_count: tier.availability_count,
        }
    }
}

/// GET /rewards response
#[derive(Debug, Serialize)]
pub struct RewardCatalogue {
    pub tiers: Vec<TierSummary>,
    pub manual_fallback: ManualFallback,
}

/// GET /rewards
pub async fn list_rewards() -> Json<RewardCatalogue> {
    Json(RewardCatalogue {
        tiers: REWARD_TIERS.iter().map(TierSummary::from).collect(),
        manual_fallback: MANUAL_FALLBACK,
    })
}

/// Build reward routes
pub fn reward_routes() -> Router<AppState> {
    Router::new().route("/rewards", get(list_rewards))
}
