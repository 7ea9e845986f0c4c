//! Self-service page handler - review & reward flow

use axum::response::{Html, IntoResponse};

use crate::models::{MANUAL_FALLBACK, REWARD_TIERS};

/// GET /
///
/// One page, five panels. Panels are toggled by `self-service.js` from the
/// session snapshot; the reward overview is rendered server-side.
pub async fn self_service_page() -> impl IntoResponse {
    let build_timestamp = env!("BUILD_TIMESTAMP");
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_profile = env!("BUILD_PROFILE");

    let tiers: String = REWARD_TIERS
        .iter()
        .map(|tier| {
            format!(
                r#"
                <li class="tier">
                    <span class="tier-title">{}</span>
                    <span class="tier-description">{}</span>
                    <span class="tier-value">{}</span>
                    <span class="tier-count">{} available</span>
                </li>"#,
                tier.display_title, tier.description, tier.value_label, tier.availability_count
            )
        })
        .collect();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Nyxa - Review &amp; Reward</title>
    <link rel="stylesheet" href="/static/self-service.css">
</head>
<body>
    <header>
        <div class="header-content">
            <div class="header-left">
                <h1>
                    Nyxa Review &amp; Reward
                    <span class="connection-status" id="connection-status">Connecting...</span>
                </h1>
                <p class="subtitle">Leave a 5-star review, get Premium</p>
            </div>
            <div class="header-right">
                <div class="build-info-line">nyxa-ss v{version}</div>
                <div class="build-info-line">{git_hash} ({build_profile})</div>
                <div class="build-info-line">{build_timestamp}</div>
            </div>
        </div>
    </header>

    <main class="content">
        <section class="panel" data-step="acquisition">
            <h2>Rate Nyxa on the App Store</h2>
            <p>Leave a 5-star review, upload a screenshot of it and unlock one of these rewards:</p>
            <ul class="tiers">{tiers}
            </ul>
            <button id="start-button" class="button">I left my review</button>
        </section>

        <section class="panel" data-step="verification">
            <h2>Upload your review screenshot</h2>
            <p>JPG, PNG or WebP, less than 10MB.</p>
            <form id="upload-form">
                <input type="file" id="screenshot-input" name="screenshot" accept="image/jpeg,image/png,image/webp">
                <button type="submit" id="upload-button" class="button">Verify</button>
            </form>
        </section>

        <section class="panel" data-step="processing">
            <h2>Checking your screenshot...</h2>
            <progress id="ocr-progress" max="100" value="0"></progress>
        </section>

        <section class="panel" data-step="feedback">
            <h2>We couldn't verify your review</h2>
            <button id="retry-button" class="button">Try another screenshot</button>
        </section>

        <section class="panel" data-step="reward">
            <h2>Thank you! Pick your reward</h2>
            <ul id="reward-links" class="tiers"></ul>
        </section>

        <p id="flow-message" class="message" hidden></p>
        <p id="manual-fallback" class="fallback" hidden>
            {instructions}
            <a href="{fallback_url}" target="_blank" rel="noopener">{fallback_handle}</a>
        </p>
        <button id="reset-button" class="button secondary">Start over</button>
    </main>

    <script src="/static/self-service.js"></script>
</body>
</html>"#,
        instructions = MANUAL_FALLBACK.instructions,
        fallback_url = MANUAL_FALLBACK.url,
        fallback_handle = MANUAL_FALLBACK.handle,
    ))
}
