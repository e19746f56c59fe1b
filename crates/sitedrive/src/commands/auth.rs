//! Auth command - sign-in management.

use anyhow::Result;
use async_trait::async_trait;
use clap::{Args, Subcommand};
use console::{Style, style};
use reqwest::header::HeaderMap;

use sitedrive_auth::{Acquisition, AuthError, AuthMode, AuthResolver, AuthSession, SignInPrompt};

use super::Context;

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in with your Microsoft account in the browser
    Login {
        /// Sign in as the application using CLIENT_SECRET
        #[arg(long)]
        app: bool,
    },

    /// Show authentication status
    Status,

    /// Sign out and clear the token cache
    Logout,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { app } => cmd_login(app, ctx).await,
        AuthCommand::Status => cmd_status(ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
    }
}

async fn cmd_login(app: bool, ctx: &Context) -> Result<()> {
    let resolver = ctx.resolver()?;
    let mut session = AuthSession::new();
    let green = Style::new().green();

    let flow = match &resolver {
        AuthResolver::Managed(_) => {
            resolver.acquire(&mut session, &HeaderMap::new()).await?;
            println!("Authentication is handled by the hosting platform.");
            if let Some(account) = session.account() {
                println!("Signed in as {}", account);
            }
            return Ok(());
        }
        AuthResolver::Interactive(flow) => flow,
    };

    if app {
        match flow.sign_in_as_application(&mut session).await {
            Ok(token) => println!(
                "{} Application token acquired (expires in {})",
                green.apply_to("✓"),
                token.expires_in_display()
            ),
            Err(e) => warn_sign_in_failed(&e),
        }
        return Ok(());
    }

    // Check if already signed in
    if let Acquisition::Ready(token) = flow.acquire_silent(&mut session).await? {
        let who = session
            .account()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown account".to_string());
        println!(
            "Already signed in as {} (expires in {})",
            who,
            token.expires_in_display()
        );
        println!("Run 'sitedrive auth logout' first to switch accounts.");
        return Ok(());
    }

    println!("{}", style("Microsoft Sign-in").bold());
    println!("{}", Style::new().dim().apply_to("─".repeat(50)));
    println!();

    if let Err(e) = resolver.sign_in(&mut session, &ConsolePrompt).await {
        warn_sign_in_failed(&e);
        return Ok(());
    }

    println!();
    match session.account() {
        Some(account) => println!("{} Signed in as {}", green.apply_to("✓"), account),
        None => println!("{} Signed in", green.apply_to("✓")),
    }
    Ok(())
}

/// Sign-in failures leave the user signed out; they are not fatal.
fn warn_sign_in_failed(error: &AuthError) {
    let yellow = Style::new().yellow();
    eprintln!("{} Sign-in failed: {}", yellow.apply_to("!"), error);
    eprintln!("  Still signed out. Run 'sitedrive auth login' to try again.");
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    let resolver = ctx.resolver()?;
    let mut session = AuthSession::new();
    let acquisition = resolver.acquire(&mut session, &HeaderMap::new()).await;

    let cache_path = match &resolver {
        AuthResolver::Interactive(flow) if flow.cache().has_session() => Some(
            ctx.data_dir
                .join(sitedrive_auth::token_cache::TOKEN_CACHE_FILE),
        ),
        _ => None,
    };

    if ctx.json_output {
        let status = serde_json::json!({
            "mode": resolver.mode().to_string(),
            "state": session.state().name(),
            "account": session.account(),
            "expires_at": session.token().and_then(|t| t.expires_at()),
            "error": acquisition.as_ref().err().map(|e| e.to_string())
                .or_else(|| session.last_error().map(str::to_string)),
            "token_cache": cache_path,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", style("Authentication Status").bold());
    println!("{}", Style::new().dim().apply_to("─".repeat(50)));
    println!("Mode:    {}", resolver.mode());
    println!("State:   {}", session.state().name());

    if let Some(account) = session.account() {
        println!("Account: {}", account);
    }
    if let Some(token) = session.token() {
        println!("Expires: {}", token.expires_in_display());
        if let Some(scope) = token.scope() {
            println!("Scope:   {}", scope);
        }
    }
    if let Some(path) = &cache_path {
        println!("Cache:   {}", path.display());
    }

    let red = Style::new().red();
    match acquisition {
        Err(e) => println!("{} {}", red.apply_to("Error:"), e),
        Ok(Acquisition::Pending) => {
            if let Some(error) = session.last_error() {
                println!("{} {}", red.apply_to("Last error:"), error);
            }
            if resolver.mode() == AuthMode::Interactive {
                println!();
                println!("Run 'sitedrive auth login' to sign in.");
            }
        }
        Ok(Acquisition::Ready(_)) => {}
    }

    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let resolver = ctx.resolver()?;
    let mut session = AuthSession::new();

    let had_session = match &resolver {
        AuthResolver::Interactive(flow) => flow.cache().has_session(),
        AuthResolver::Managed(_) => false,
    };

    resolver.sign_out(&mut session).await?;

    if had_session {
        println!("Signed out. Token cache removed.");
    } else {
        println!("No cached sign-in found.");
    }
    if resolver.mode() == AuthMode::Managed {
        println!("Platform-managed sign-in is controlled by the hosting platform.");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Browser prompt
// ─────────────────────────────────────────────────────────────────────────────

/// Opens the authorization URL and reads the redirect URL from stdin.
struct ConsolePrompt;

#[async_trait]
impl SignInPrompt for ConsolePrompt {
    async fn authorize(&self, authorization_url: &str) -> sitedrive_auth::Result<String> {
        println!("Open this URL in your browser:");
        println!();
        println!("  {}", authorization_url);
        println!();

        // Only open a browser when someone is at the terminal
        if console::user_attended() && open_url(authorization_url).is_err() {
            println!("(Could not open browser automatically)");
            println!();
        }

        println!("After signing in, your browser is sent to the redirect URI.");
        println!("Copy the full URL from the address bar and paste it here:");
        println!();
        print!("redirect> ");

        use std::io::Write;
        let mut input = String::new();
        std::io::stdout()
            .flush()
            .and_then(|_| std::io::stdin().read_line(&mut input))
            .map_err(|e| AuthError::InvalidRequest(format!("failed to read input: {}", e)))?;

        Ok(input.trim().to_string())
    }
}

/// Try to open a URL in the default browser.
fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }
    #[cfg(target_os = "windows")]
    {
        // `cmd /C start` would split the URL at `&`
        std::process::Command::new("rundll32")
            .args(["url.dll,FileProtocolHandler", url])
            .status()?;
    }
    Ok(())
}
