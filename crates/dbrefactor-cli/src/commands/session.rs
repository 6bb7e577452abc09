use anyhow::Result;
use colored::Colorize;
use tracing::warn;

use crate::cli::ConnectArgs;
use crate::context::AppContext;
use crate::output::{print_error, print_success, print_warning};
use crate::session::{self, StoredSession};

pub async fn connect(ctx: &AppContext, args: &ConnectArgs) -> Result<()> {
    let home = ctx.home()?;
    let client = ctx.client()?;
    let resp = client
        .connect(&args.connection_string, Some(args.ttl))
        .await?;

    let stored = StoredSession {
        server: ctx.server.clone(),
        session_id: resp.session_id,
        expires_at_utc: resp.expires_at_utc,
    };
    session::save_session(home, &ctx.profile, &stored)?;
    print_success(&format!(
        "Connected to {} (session {}, expires {})",
        ctx.server.cyan(),
        stored.session_id.cyan(),
        stored.expires_at_utc
    ));
    Ok(())
}

/// Closes the backend session. The local session is forgotten even when the backend
/// call fails, so a dead session never blocks a reconnect.
pub async fn disconnect(ctx: &AppContext) -> Result<()> {
    let home = ctx.home()?;
    let Some(stored) = session::load_session(home, &ctx.profile)? else {
        println!("No session for profile \"{}\"", ctx.profile);
        return Ok(());
    };

    let client = ctx.client()?;
    let result = client.disconnect(&stored.session_id).await;
    session::remove_session(home, &ctx.profile)?;

    match result {
        Ok(()) => print_success("Disconnected"),
        Err(e) => {
            warn!(error = %e, "backend disconnect failed");
            print_warning(&format!("Session forgotten locally, but the backend said: {e}"));
        }
    }
    Ok(())
}

pub fn show(ctx: &AppContext) -> Result<()> {
    match ctx.load_session()? {
        Some(stored) => {
            println!("{}: {}", "Profile".cyan(), ctx.profile);
            println!("{}: {}", "Server".cyan(), stored.server.cyan());
            println!("{}: {}", "Session".cyan(), stored.session_id);
            if stored.is_expired() {
                println!("{}: {} ({})", "Expires".cyan(), stored.expires_at_utc, "expired".red());
            } else {
                println!("{}: {}", "Expires".cyan(), stored.expires_at_utc);
            }
        }
        None => {
            print_error(&format!("Not connected (profile: \"{}\")", ctx.profile));
        }
    }
    Ok(())
}
