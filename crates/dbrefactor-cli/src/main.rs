mod api;
mod cli;
mod client;
mod commands;
mod config;
mod context;
mod llm;
mod observability;
mod output;
mod plan_file;
mod session;

use anyhow::Result;
use clap::Parser;
use dbrefactor_core::CoreError;

use cli::{Cli, Commands, ConfigCommands, PlanCommands, SessionCommands};
use context::AppContext;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(core) = e.downcast_ref::<CoreError>() {
            tracing::debug!(category = %core.category(), "command failed");
        }
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);
    let ctx = AppContext::from_cli(&cli)?;

    match &cli.command {
        Commands::Session(args) => match &args.command {
            SessionCommands::Connect(connect) => commands::session::connect(&ctx, connect).await?,
            SessionCommands::Disconnect => commands::session::disconnect(&ctx).await?,
            SessionCommands::Show => commands::session::show(&ctx)?,
        },
        Commands::Schema(args) => commands::schema::schema(&ctx, args).await?,
        Commands::Plan(args) => match &args.command {
            PlanCommands::List => commands::plan::list(&ctx)?,
            PlanCommands::Add(add) => commands::plan::add(&ctx, add)?,
            PlanCommands::Edit(edit) => commands::plan::edit(&ctx, edit)?,
            PlanCommands::Remove(remove) => commands::plan::remove(&ctx, remove)?,
            PlanCommands::Move(mv) => commands::plan::move_entry(&ctx, mv)?,
            PlanCommands::Clear => commands::plan::clear(&ctx)?,
        },
        Commands::Preview(args) => commands::sync::preview(&ctx, args).await?,
        Commands::Apply(args) => commands::sync::apply(&ctx, args).await?,
        Commands::Cleanup(args) => commands::sync::cleanup(&ctx, args).await?,
        Commands::Codefix(args) => commands::sync::codefix(&ctx, args).await?,
        Commands::Suggest(args) => commands::suggest::suggest(&ctx, args).await?,
        Commands::Config(args) => match &args.command {
            ConfigCommands::Show => commands::config::show(&ctx)?,
            ConfigCommands::Set(set) => commands::config::set(&ctx, set)?,
        },
    }

    Ok(())
}
