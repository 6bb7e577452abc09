use anyhow::{Context, Result};
use dbrefactor_core::{OperationDraft, PlanEntry, status};
use serde::Serialize;
use tracing::info;

use crate::cli::{Direction, OperationFields, PlanAddArgs, PlanEditArgs, PlanMoveArgs, PlanRefArgs};
use crate::context::AppContext;
use crate::output::{print_plan, print_structured, print_success, print_warning, short_id};

#[derive(Serialize)]
struct ListedEntry<'a> {
    #[serde(flatten)]
    entry: &'a PlanEntry,
    status: String,
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let plan = ctx.load_plan()?;
    let applied = ctx.store().load(&ctx.root_key);
    let rows = status(plan.entries(), &applied);

    let listed: Vec<ListedEntry> = rows
        .iter()
        .map(|(entry, state)| ListedEntry {
            entry,
            status: state.to_string(),
        })
        .collect();
    if !print_structured(&listed, ctx.format)? {
        print_plan(&rows);
    }
    Ok(())
}

pub fn add(ctx: &AppContext, args: &PlanAddArgs) -> Result<()> {
    let mut draft = OperationDraft::new(args.scope);
    apply_fields(&mut draft, &args.fields);
    let operation = draft.build()?;

    let mut plan = ctx.load_plan()?;
    let summary = operation.summary();
    let id = plan.add(operation)?;
    ctx.save_plan(&plan)?;
    info!(id = %id, "operation added");
    print_success(&format!("Added {} {summary}", short_id(&id)));
    Ok(())
}

/// Changes the given fields of an entry. Boolean flags can only be switched on here;
/// re-add the operation to switch one off.
pub fn edit(ctx: &AppContext, args: &PlanEditArgs) -> Result<()> {
    let mut plan = ctx.load_plan()?;
    let entry = plan.resolve(&args.reference)?;
    let id = entry.id.clone();

    let mut draft = OperationDraft::from(&entry.operation);
    if let Some(scope) = args.scope {
        draft.scope = Some(scope);
    }
    apply_fields(&mut draft, &args.fields);
    let operation = draft.build()?;
    let summary = operation.summary();

    plan.update(&id, operation)?;
    ctx.save_plan(&plan)?;
    print_success(&format!("Updated {} {summary}", short_id(&id)));
    Ok(())
}

pub fn remove(ctx: &AppContext, args: &PlanRefArgs) -> Result<()> {
    let mut plan = ctx.load_plan()?;
    let id = plan.resolve(&args.reference)?.id.clone();
    let removed = plan.remove(&id)?;
    ctx.save_plan(&plan)?;
    print_success(&format!(
        "Removed {} {}",
        short_id(&removed.id),
        removed.operation.summary()
    ));
    Ok(())
}

pub fn move_entry(ctx: &AppContext, args: &PlanMoveArgs) -> Result<()> {
    let mut plan = ctx.load_plan()?;
    let id = plan.resolve(&args.reference)?.id.clone();
    let moved = match args.direction {
        Direction::Up => plan.move_up(&id)?,
        Direction::Down => plan.move_down(&id)?,
    };
    if !moved {
        print_warning("Already at the edge of the plan, nothing moved");
        return Ok(());
    }
    ctx.save_plan(&plan)?;
    let applied = ctx.store().load(&ctx.root_key);
    print_plan(&status(plan.entries(), &applied));
    Ok(())
}

/// Empties the plan and forgets which operations were applied under the root key.
pub fn clear(ctx: &AppContext) -> Result<()> {
    let mut plan = ctx.load_plan()?;
    let count = plan.len();
    plan.clear();
    ctx.save_plan(&plan)?;

    let store = ctx.store();
    let forgotten = store
        .clear(&ctx.root_key)
        .with_context(|| format!("Failed to clear applied history for {}", ctx.root_key))?;
    info!(root_key = %ctx.root_key, forgotten, "plan cleared");
    print_success(&format!(
        "Removed {count} operation(s){}",
        if forgotten {
            format!(" and the applied history of {}", ctx.root_key)
        } else {
            String::new()
        }
    ));
    Ok(())
}

/// Overlays the fields given on the command line onto a draft.
fn apply_fields(draft: &mut OperationDraft, fields: &OperationFields) {
    fn set(target: &mut Option<String>, value: &Option<String>) {
        if let Some(v) = value {
            *target = Some(v.clone());
        }
    }

    set(&mut draft.table_from, &fields.table_from);
    set(&mut draft.table_to, &fields.table_to);
    set(&mut draft.column_from, &fields.column_from);
    set(&mut draft.column_to, &fields.column_to);
    set(&mut draft.sql_type, &fields.sql_type);
    set(&mut draft.note, &fields.note);
    set(&mut draft.constraint_name, &fields.constraint);
    set(&mut draft.index_name, &fields.index);
    set(&mut draft.ref_table, &fields.ref_table);
    set(&mut draft.ref_column, &fields.ref_column);
    set(&mut draft.default_value, &fields.default);
    if fields.area.is_some() {
        draft.area = fields.area;
    }
    if fields.on_delete.is_some() {
        draft.on_delete = fields.on_delete;
    }
    if fields.nullable.is_some() {
        draft.nullable = fields.nullable;
    }
    if fields.position.is_some() {
        draft.new_position = fields.position;
    }
    if !fields.columns.is_empty() {
        draft.columns = fields.columns.clone();
    }
    if let Some(clustered) = fields.clustered {
        draft.clustered = clustered;
    }
    if let Some(replace_existing) = fields.replace_existing {
        draft.replace_existing = replace_existing;
    }
    if let Some(allow_data_loss) = fields.allow_data_loss {
        draft.allow_data_loss = allow_data_loss;
    }
    if let Some(rebuild) = fields.rebuild {
        draft.rebuild = rebuild;
    }
}
