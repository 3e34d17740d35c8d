//! Basic usage example for credentials-core
//!
//! This example demonstrates:
//! - Registering a user
//! - Logging in with a password
//! - Exchanging the refresh token for a new access token
//! - Revoking the refresh token
//! - Checking resource ownership

use credentials_core::jwt::JwtConfig;
use credentials_core::{init, CreateUserRequest, CredentialsConfig, UserId};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = CredentialsConfig {
        database_url: "sqlite://example_credentials.db?mode=rwc".to_string(),
        jwt: JwtConfig {
            secret: "example-signing-secret".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    println!("🚀 Initializing credentials-core...");
    let auth_service = init(config).await?;

    println!("\n📝 Registering a user...");
    let user = auth_service.create_user(CreateUserRequest {
        email: "walt@breakingbad.com".to_string(),
        password: "123456789".to_string(),
    }).await?;
    println!("✅ User created: {} ({})", user.email, user.id);

    println!("\n🔐 Logging in...");
    let login = auth_service
        .authenticate_password("walt@breakingbad.com", "123456789")
        .await?;
    println!("✅ Access token (first 30 chars): {}...", &login.access_token[..30]);
    println!("   Expires in: {} seconds", login.expires_in.as_secs());
    println!("   Refresh token: {}", login.refresh_token);

    println!("\n🛡️ Authenticating a request...");
    let header = format!("Bearer {}", login.access_token);
    let caller = auth_service.guard().authenticate_request(Some(&header))?;
    println!("✅ Caller is {}", caller);

    match auth_service.guard().authorize_ownership(caller, UserId::new_v4()) {
        Ok(_) => println!("⚠️ Foreign resource accepted - unexpected!"),
        Err(e) => println!("✅ Foreign resource rejected: {}", e),
    }

    println!("\n🔄 Refreshing access token...");
    let refreshed = auth_service.refresh_access_token(&login.refresh_token).await?;
    println!("✅ New access token (first 30 chars): {}...", &refreshed.access_token[..30]);

    println!("\n🚫 Revoking refresh token...");
    auth_service.revoke_refresh_token(&login.refresh_token).await?;
    match auth_service.refresh_access_token(&login.refresh_token).await {
        Ok(_) => println!("⚠️ Revoked token still works - unexpected!"),
        Err(e) => println!("✅ Revoked token rejected: {}", e),
    }

    // Clean up
    println!("\n🧹 Cleaning up example database...");
    std::fs::remove_file("example_credentials.db").ok();

    println!("\n✨ Example completed successfully!");
    Ok(())
}
