use anyhow::Result;

use crate::cli::SchemaArgs;
use crate::context::AppContext;
use crate::output::{print_structured, print_tables};

pub async fn schema(ctx: &AppContext, args: &SchemaArgs) -> Result<()> {
    let connection = ctx.connection(&args.connection)?;
    let tables = ctx.client()?.analyze_schema(&connection).await?;
    if !print_structured(&tables, ctx.format)? {
        print_tables(&tables);
    }
    Ok(())
}
