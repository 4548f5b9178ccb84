//! Session commands.

use anyhow::{bail, Result};
use storefront_auth::{AccessDecision, LoginCredentials};

use super::LoginArgs;
use crate::setup::Setup;

/// Run the login command.
pub async fn login(args: LoginArgs, ctx: &Setup) -> Result<()> {
    let session = ctx.app.session();
    if session.is_authenticated {
        ctx.output.warn(&format!(
            "Already signed in as {}. Run `storefront logout` first.",
            session.display_name().unwrap_or_default()
        ));
        return Ok(());
    }

    let credentials = LoginCredentials::new(args.username, args.password);
    match ctx.app.login(&credentials).await {
        Ok(session) => {
            if ctx.output.is_json() {
                ctx.output.json(&session.user);
                return Ok(());
            }
            ctx.output.success(&format!(
                "Signed in as {}",
                session.display_name().unwrap_or_default()
            ));
            ctx.output.kv("Session file", &ctx.storage_path.display().to_string());
            Ok(())
        }
        Err(error) => {
            tracing::debug!(%error, "login failed");
            bail!("{}", error.field_message())
        }
    }
}

/// Run the logout command.
pub fn logout(ctx: &Setup) -> Result<()> {
    ctx.app.logout();
    ctx.output.success("Signed out");
    Ok(())
}

/// Run the whoami command.
pub fn whoami(ctx: &Setup) -> Result<()> {
    let session = ctx.app.session();
    match session.access_decision() {
        AccessDecision::Allow => {
            if ctx.output.is_json() {
                ctx.output.json(&session.user);
                return Ok(());
            }
            ctx.output.header("Session");
            if let Some(user) = &session.user {
                ctx.output.kv("Name", &user.display_name());
                ctx.output.kv("Username", &user.username);
                if !user.email.is_empty() {
                    ctx.output.kv("Email", &user.email);
                }
            }
            Ok(())
        }
        AccessDecision::Redirect(route) => {
            ctx.output.info(&format!("Not signed in (see {route}). Run `storefront login`."));
            Ok(())
        }
        AccessDecision::Pending => {
            ctx.output.info("Sign-in in progress");
            Ok(())
        }
    }
}
