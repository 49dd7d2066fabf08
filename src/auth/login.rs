//! Password login against `/token/`, plus logout and status

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;

use super::claims::{decode_claims, role_from_token, Role};
use super::tokens::USER_ROLE_KEY;
use crate::api::client::ApiClient;
use crate::api::profile::fetch_profile;

/// Obtain and store a credential pair, then record the user's role.
///
/// The role comes from the profile endpoint and falls back to the token claims.
pub async fn sign_in(client: &ApiClient, username: &str, password: &str) -> Result<Option<Role>> {
    let pair = match client.obtain_credentials(username, password).await {
        Ok(pair) => pair,
        Err(e) if e.is_unauthorized() || e.status() == Some(StatusCode::BAD_REQUEST) => {
            tracing::debug!("Token request rejected: {}", e);
            bail!("Invalid username or password");
        }
        Err(e) => return Err(e).context("Login request failed"),
    };

    let store = client.store();
    store.clear()?;
    store.set_credentials(&pair)?;

    let profile = fetch_profile(client)
        .await
        .context("Logged in, but failed to fetch profile")?;
    let role = profile
        .role
        .as_deref()
        .map(Role::parse)
        .or_else(|| role_from_token(&pair.access_token));

    match &role {
        Some(role) => store.set(USER_ROLE_KEY, role.as_str())?,
        None => store.remove(USER_ROLE_KEY)?,
    }

    Ok(role)
}

/// Perform password login
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<()> {
    tracing::info!("Signing in as {}...", username);
    let role = sign_in(client, username, password).await?;

    match role {
        Some(role) => println!(
            "Login successful (role: {}, home: {}).",
            role,
            role.home_route()
        ),
        None => println!("Login successful (no role assigned)."),
    }
    Ok(())
}

/// Clear stored credentials
pub fn logout(client: &ApiClient) -> Result<()> {
    client.store().clear().context("Failed to clear session")?;
    println!("Logged out.");
    Ok(())
}

/// Display current auth status
pub fn status(client: &ApiClient) -> Result<()> {
    let store = client.store();

    println!("API:         {}", client.base_url());
    match store.access_token() {
        Some(token) => {
            println!("Access tok:  present");
            if let Some(exp) = decode_claims(&token).and_then(|c| c.expires_at()) {
                println!("  expires_at: {}", exp.to_rfc3339());
            }
        }
        None => println!("Access tok:  none"),
    }

    match store.refresh_token() {
        Some(_) => println!("Refresh tok: present"),
        None => println!("Refresh tok: none"),
    }

    let role = store
        .get(USER_ROLE_KEY)
        .map(|r| Role::parse(&r))
        .or_else(|| store.access_token().and_then(|t| role_from_token(&t)));
    match role {
        Some(role) if role.can_manage() => println!("Role:        {} (management access)", role),
        Some(role) => println!("Role:        {}", role),
        None => println!("Role:        none"),
    }

    if store.access_token().is_none() {
        println!("\nRun 'erp-cli login' to authenticate.");
    }

    Ok(())
}
