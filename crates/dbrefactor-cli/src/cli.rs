use clap::{Parser, Subcommand, ValueEnum};
use dbrefactor_core::{CompatArea, OperationKind, ReferentialAction};

#[derive(Parser)]
#[command(name = "dbrefactor")]
#[command(about = "Plan, preview and apply database refactorings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base URL (overrides config and DBREFACTOR_URL env var)
    #[arg(short, long, global = true, env = "DBREFACTOR_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "DBREFACTOR_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Plan file (defaults to the profile's plan_file, then dbrefactor.plan.json)
    #[arg(long, global = true, env = "DBREFACTOR_PLAN")]
    pub plan: Option<String>,

    /// Root key that partitions the applied-operation history
    #[arg(long, global = true, env = "DBREFACTOR_ROOT_KEY")]
    pub root_key: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open or close a backend database session
    Session(SessionArgs),
    /// Analyze and print the database schema
    Schema(SchemaArgs),
    /// Edit the refactoring plan
    Plan(PlanArgs),
    /// Generate SQL for pending operations without applying anything
    Preview(PreviewArgs),
    /// Apply pending operations to the database and the code repository
    Apply(ApplyArgs),
    /// Remove compatibility objects and run drops for the whole plan
    Cleanup(CleanupArgs),
    /// Run the code fixer on the repository
    Codefix(CodefixArgs),
    /// Ask a language model for an execution order
    Suggest(SuggestArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Connect to a database through the backend
    Connect(ConnectArgs),
    /// Close the current session
    Disconnect,
    /// Show the current session
    Show,
}

#[derive(clap::Args)]
pub struct ConnectArgs {
    /// Database connection string
    #[arg(env = "DBREFACTOR_CONNECTION_STRING")]
    pub connection_string: String,
    /// Session lifetime in seconds
    #[arg(long, default_value_t = 1800)]
    pub ttl: u64,
}

/// How a command reaches the database.
#[derive(clap::Args, Default)]
pub struct ConnectionArgs {
    /// Use this connection string instead of the stored session
    #[arg(long)]
    pub connection_string: Option<String>,
}

#[derive(clap::Args)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(clap::Args)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub command: PlanCommands,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// List operations with their applied/pending status
    List,
    /// Add an operation
    Add(PlanAddArgs),
    /// Change fields of an operation
    Edit(PlanEditArgs),
    /// Remove an operation
    Remove(PlanRefArgs),
    /// Move an operation up or down
    Move(PlanMoveArgs),
    /// Remove every operation and forget the applied history of the root key
    Clear,
}

#[derive(clap::Args)]
pub struct PlanAddArgs {
    /// Operation kind (table-rename, column-rename, add-column, drop-column, drop-table,
    /// drop-index, add-primary-key, drop-primary-key, add-foreign-key, drop-foreign-key,
    /// reorder-column)
    pub scope: OperationKind,
    #[command(flatten)]
    pub fields: OperationFields,
}

#[derive(clap::Args)]
pub struct PlanEditArgs {
    /// Position (1-based) or id prefix
    pub reference: String,
    /// Change the operation kind
    #[arg(long)]
    pub scope: Option<OperationKind>,
    #[command(flatten)]
    pub fields: OperationFields,
}

#[derive(clap::Args)]
pub struct PlanRefArgs {
    /// Position (1-based) or id prefix
    pub reference: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

#[derive(clap::Args)]
pub struct PlanMoveArgs {
    /// Position (1-based) or id prefix
    pub reference: String,
    pub direction: Direction,
}

/// Fields of an operation. Only those relevant to the kind are used.
#[derive(clap::Args, Default)]
pub struct OperationFields {
    /// Source table
    #[arg(long = "table")]
    pub table_from: Option<String>,
    /// New table name
    #[arg(long = "to-table")]
    pub table_to: Option<String>,
    /// Source column
    #[arg(long = "column")]
    pub column_from: Option<String>,
    /// New column name
    #[arg(long = "to-column")]
    pub column_to: Option<String>,
    /// SQL type (e.g. nvarchar(100))
    #[arg(long = "type")]
    pub sql_type: Option<String>,
    /// Compatibility area for renames
    #[arg(long)]
    pub area: Option<CompatArea>,
    /// Free-text note
    #[arg(long)]
    pub note: Option<String>,
    /// Constraint name (primary/foreign keys)
    #[arg(long)]
    pub constraint: Option<String>,
    /// Index name (drop-index)
    #[arg(long)]
    pub index: Option<String>,
    /// Referenced table (add-foreign-key)
    #[arg(long)]
    pub ref_table: Option<String>,
    /// Referenced column (add-foreign-key)
    #[arg(long)]
    pub ref_column: Option<String>,
    /// ON DELETE action (no-action, cascade, set-null, set-default)
    #[arg(long)]
    pub on_delete: Option<ReferentialAction>,
    /// Key columns (add-primary-key), comma separated
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
    /// Create a clustered primary key (`--clustered false` switches it off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub clustered: Option<bool>,
    /// Replace the table's existing primary key (`--replace-existing false` switches it off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub replace_existing: Option<bool>,
    /// Allow a type change that can lose data (`--allow-data-loss false` switches it off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub allow_data_loss: Option<bool>,
    /// Nullability of an added column
    #[arg(long)]
    pub nullable: Option<bool>,
    /// Default value of an added column
    #[arg(long)]
    pub default: Option<String>,
    /// New 1-based position (reorder-column)
    #[arg(long)]
    pub position: Option<u32>,
    /// Rebuild the table to move the column (`--rebuild false` switches it off)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub rebuild: Option<bool>,
}

#[derive(clap::Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Preview the whole plan, including operations already applied
    #[arg(long)]
    pub all: bool,
}

#[derive(clap::Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Only apply to the database, skip the code fixer
    #[arg(long)]
    pub skip_codefix: bool,
    /// Allow destructive operations during apply
    #[arg(long)]
    pub allow_destructive: bool,
}

#[derive(clap::Args)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Execute drops and other destructive operations
    #[arg(long)]
    pub allow_destructive: bool,
}

#[derive(clap::Args)]
pub struct CodefixArgs {
    /// Write changes (default is a dry run)
    #[arg(long)]
    pub apply: bool,
    /// Run for the whole plan, including operations already applied
    #[arg(long)]
    pub all: bool,
    /// Glob of files to include (repeatable)
    #[arg(long = "include")]
    pub include_globs: Vec<String>,
    /// Glob of files to exclude (repeatable)
    #[arg(long = "exclude")]
    pub exclude_globs: Vec<String>,
}

#[derive(clap::Args)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
    /// Save the suggested order to the plan
    #[arg(long)]
    pub write: bool,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (see `config show`)
    pub key: String,
    /// Value
    pub value: String,
}
