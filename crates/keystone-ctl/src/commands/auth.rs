//! Token minting for the module API.

use chrono::Duration;
use keystone_server::{JwtAuth, KeystoneConfig};

use crate::error::{CtlError, CtlResult};
use crate::AuthCommands;

pub(crate) fn handle_auth_command(cmd: AuthCommands, config: &KeystoneConfig) -> CtlResult<()> {
    match cmd {
        AuthCommands::Token {
            subject,
            secret,
            expiry_hours,
        } => generate_token(&subject, secret.as_deref().or(config.jwt_secret()), expiry_hours),
    }
}

fn generate_token(subject: &str, secret: Option<&str>, expiry_hours: i64) -> CtlResult<()> {
    let secret = secret.filter(|s| !s.is_empty()).ok_or_else(|| {
        CtlError::InvalidInput(
            "no JWT secret configured; pass --secret or set KEYSTONE_JWT_SECRET".to_string(),
        )
    })?;
    if expiry_hours <= 0 {
        return Err(CtlError::InvalidInput(
            "--expiry-hours must be positive".to_string(),
        ));
    }

    let token = JwtAuth::new(secret)
        .issue(subject, Duration::hours(expiry_hours))
        .map_err(|e| CtlError::Token(e.to_string()))?;

    // Raw token to stdout for piping; details to stderr
    println!("{token}");
    eprintln!();
    eprintln!("Token details:");
    eprintln!("  Subject: {subject}");
    eprintln!("  Expires in: {expiry_hours} hours");
    eprintln!();
    eprintln!("Use with:");
    eprintln!("  curl -H \"Authorization: Bearer <token>\" http://localhost:3001/api/modules");

    Ok(())
}
