use crate::cmd::prompt::{ask, ask_secret};
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn login(ctx: &AppContext, email: Option<String>) -> AppResult<()> {
    let email = match email {
        Some(email) => email,
        None => ask("Email: ")?,
    };
    let password = ask_secret("Password")?;

    let session = ctx.auth_service.sign_in(&email, &password).await?;
    ctx.sessions.save(&session)?;

    let shown = session
        .identity
        .email
        .as_deref()
        .unwrap_or(session.identity.id.as_str());
    println!("Signed in as {shown}");
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> AppResult<()> {
    let Some(session) = ctx.sessions.load_or_forget() else {
        ctx.sessions.clear()?;
        println!("Not signed in.");
        return Ok(());
    };

    if let Err(err) = ctx.auth_service.sign_out(&session).await {
        tracing::warn!(error = %err, "remote sign-out failed; clearing local session anyway");
    }
    ctx.sessions.clear()?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> AppResult<()> {
    let identity = ctx.tickets.auth().require_user()?;
    match &identity.email {
        Some(email) => println!("{email} ({})", identity.id),
        None => println!("{}", identity.id),
    }
    Ok(())
}
