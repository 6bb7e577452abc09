use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigSetArgs;
use crate::config;
use crate::context::AppContext;
use crate::output::print_success;

pub fn show(ctx: &AppContext) -> Result<()> {
    println!("{}: {}", "Profile".cyan(), ctx.profile);
    for (key, value) in ctx.config.effective() {
        println!("{}: {}", key.cyan(), value);
    }
    if let Some(home) = &ctx.home {
        println!("{}: {}", "config_dir".cyan(), home.display());
    }
    Ok(())
}

pub fn set(ctx: &AppContext, args: &ConfigSetArgs) -> Result<()> {
    let home = ctx.home()?;
    let mut cfg = config::load_profile(home, &ctx.profile)?;
    cfg.set(&args.key, &args.value)?;
    config::save_profile(home, &ctx.profile, &cfg)?;
    print_success(&format!("Set {} = {}", args.key, args.value));
    Ok(())
}
