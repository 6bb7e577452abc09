use anyhow::Result;
use colored::Colorize;
use dbrefactor_core::{Plan, PlanEntry, SuggestionResponse, apply_suggested_order, render_prompt, status};
use tracing::info;

use crate::cli::SuggestArgs;
use crate::context::AppContext;
use crate::output::{print_plan, print_structured, print_success};

/// Builds the reordered plan. Fails on anything the plan does not contain.
pub fn reorder(plan: &Plan, suggestion: &SuggestionResponse) -> Result<Plan> {
    let ordered: Vec<PlanEntry> = apply_suggested_order(plan, suggestion)?;
    let mut reordered = plan.clone();
    reordered.replace_order(ordered)?;
    Ok(reordered)
}

pub async fn suggest(ctx: &AppContext, args: &SuggestArgs) -> Result<()> {
    let plan = ctx.load_plan()?;
    if plan.len() < 2 {
        anyhow::bail!("Need at least two operations in the plan to suggest an order");
    }

    let connection = ctx.connection(&args.connection)?;
    let tables = ctx.client()?.analyze_schema(&connection).await?;
    let prompt = render_prompt(&tables, plan.entries());
    let suggestion = ctx.llm()?.suggest_order(&prompt).await?;
    let reordered = reorder(&plan, &suggestion)?;
    info!(operations = reordered.len(), "suggestion accepted");

    if !print_structured(&reordered, ctx.format)? {
        let applied = ctx.store().load(&ctx.root_key);
        print_plan(&status(reordered.entries(), &applied));
        if !suggestion.rationale.trim().is_empty() {
            println!("{}: {}", "Rationale".cyan(), suggestion.rationale.trim());
        }
    }

    if args.write {
        ctx.save_plan(&reordered)?;
        print_success("Plan reordered");
    } else {
        println!("Not saved. Re-run with --write to reorder the plan.");
    }
    Ok(())
}
