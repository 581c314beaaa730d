//! Prints a signed admin token.
//!
//! Usage: `issue-admin-token [subject]` (subject defaults to `admin`).
//! Reads the same configuration as the server.

use anyhow::{Context, Result};

use ofb_catalog_api::config::Config;
use shared::jwt::{JwtConfig, Role};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let subject = std::env::args().nth(1).unwrap_or_else(|| "admin".to_string());
    let config = Config::load().context("Failed to load configuration")?;

    let jwt = JwtConfig::with_leeway(
        &config.auth.token_secret,
        &config.auth.issuer,
        config.auth.token_expiry_secs,
        config.auth.leeway_secs,
    )
    .context("Invalid auth configuration")?;

    let token = jwt
        .generate_token(&subject, Role::Admin)
        .context("Failed to sign token")?;

    println!("{}", token);
    Ok(())
}
