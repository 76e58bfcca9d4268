//! Config command - client configuration and contexts.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use console::Style;

use lyceum_config::{self, Context as ClientContext};

use super::{Context, print_header, print_json};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective settings
    Show,

    /// Show configuration file path
    Path,

    /// Show the current context name
    CurrentContext,

    /// List available contexts
    GetContexts,

    /// Switch to a different context
    UseContext {
        /// Context name to switch to
        name: String,
    },

    /// Create or update a context
    SetContext {
        /// Context name
        name: String,

        /// Backend URL (e.g., http://localhost:4943)
        #[arg(long)]
        server: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Base URL the payment page returns to
        #[arg(long)]
        return_base_url: Option<String>,
    },

    /// Delete a context
    DeleteContext {
        /// Context name to delete
        name: String,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::CurrentContext => cmd_current_context(),
        ConfigCommand::GetContexts => cmd_get_contexts(ctx),
        ConfigCommand::UseContext { name } => cmd_use_context(&name),
        ConfigCommand::SetContext {
            name,
            server,
            timeout,
            return_base_url,
        } => cmd_set_context(&name, server, timeout, return_base_url),
        ConfigCommand::DeleteContext { name } => cmd_delete_context(&name),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let s = ctx.settings()?;

    if ctx.json_output {
        return print_json(&serde_json::json!({
            "context": s.context,
            "server": s.server,
            "timeoutSecs": s.timeout.as_secs(),
            "returnBaseUrl": s.return_base_url,
            "cache": {
                "maxEntries": s.cache_max_entries,
                "staleAfterSecs": s.cache_stale_after.map(|d| d.as_secs()),
            },
            "payment": {
                "confirmTimeoutSecs": s.confirm_timeout.as_secs(),
                "redirectDelayMs": s.redirect_delay.as_millis() as u64,
                "currency": s.currency,
            },
            "identity": {
                "retryDelayMs": s.login_retry_delay.as_millis() as u64,
            },
        }));
    }

    let dim = Style::new().dim();
    print_header("Lyceum Configuration");
    println!(
        "  {} {}",
        dim.apply_to("Context:"),
        s.context.as_deref().unwrap_or("(none)")
    );
    println!("  {} {}", dim.apply_to("Server:"), s.server);
    println!("  {} {}s", dim.apply_to("Timeout:"), s.timeout.as_secs());
    println!("  {} {}", dim.apply_to("Return URL:"), s.return_base_url);
    println!();
    println!(
        "  {} {} entries, stale after {}",
        dim.apply_to("Cache:"),
        s.cache_max_entries,
        s.cache_stale_after
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "never".to_string())
    );
    println!(
        "  {} {} · confirm timeout {}s · redirect after {}ms",
        dim.apply_to("Payment:"),
        s.currency,
        s.confirm_timeout.as_secs(),
        s.redirect_delay.as_millis()
    );
    println!(
        "  {} retry after {}ms",
        dim.apply_to("Login:"),
        s.login_retry_delay.as_millis()
    );
    Ok(())
}

fn cmd_path() -> Result<()> {
    match lyceum_config::client_config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("Could not determine config directory"),
    }
    Ok(())
}

fn cmd_current_context() -> Result<()> {
    let config = lyceum_config::load_client_config()?;

    match &config.current_context {
        Some(name) => println!("{}", name),
        None => {
            println!("No current context set. Use 'lyceum config use-context <name>' to set one.")
        }
    }
    Ok(())
}

fn cmd_get_contexts(ctx: &Context) -> Result<()> {
    let config = lyceum_config::load_client_config()?;

    if ctx.json_output {
        return print_json(&serde_json::json!({
            "current": config.current_context,
            "contexts": config.contexts,
        }));
    }

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!();
        println!("Create one with:");
        println!("  lyceum config set-context local --server=http://localhost:4943");
        return Ok(());
    }

    let current = config.current_context.as_deref();
    println!("CURRENT   NAME            SERVER");
    for c in &config.contexts {
        let marker = if current == Some(c.name.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{}         {:<15} {}", marker, c.name, c.server);
    }
    Ok(())
}

fn cmd_use_context(name: &str) -> Result<()> {
    let mut config = lyceum_config::load_client_config()?;
    config.use_context(name)?;
    lyceum_config::save_client_config(&config)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

fn cmd_set_context(
    name: &str,
    server: Option<String>,
    timeout: Option<u64>,
    return_base_url: Option<String>,
) -> Result<()> {
    let mut config = lyceum_config::load_client_config()?;

    let updated = match config.get_context(name).cloned() {
        Some(mut existing) => {
            if let Some(url) = server {
                existing.server = url;
            }
            if let Some(t) = timeout {
                existing.timeout = Some(t);
            }
            if let Some(url) = return_base_url {
                existing.return_base_url = Some(url);
            }
            println!("Context \"{}\" modified.", name);
            existing
        }
        None => {
            let server_url = server
                .ok_or_else(|| anyhow!("--server is required when creating a new context"))?;
            let mut c = ClientContext::new(name, server_url);
            if let Some(t) = timeout {
                c = c.with_timeout(t);
            }
            if let Some(url) = return_base_url {
                c = c.with_return_base_url(url);
            }
            println!("Context \"{}\" created.", name);
            c
        }
    };
    config.set_context(updated);

    // The first context becomes current.
    if config.current_context.is_none() && config.contexts.len() == 1 {
        config.current_context = Some(name.to_string());
        println!("Context \"{}\" set as current context.", name);
    }

    lyceum_config::save_client_config(&config)?;
    Ok(())
}

fn cmd_delete_context(name: &str) -> Result<()> {
    let mut config = lyceum_config::load_client_config()?;

    match config.remove_context(name) {
        Some(_) => {
            lyceum_config::save_client_config(&config)?;
            println!("Context \"{}\" deleted.", name);
            if config.current_context.is_none() {
                println!(
                    "Note: No current context. Use 'lyceum config use-context <name>' to set one."
                );
            }
        }
        None => println!("Context \"{}\" not found.", name),
    }
    Ok(())
}
