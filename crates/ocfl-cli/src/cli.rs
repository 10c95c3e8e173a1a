use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ocfl",
    about = "OCFL object creation, update, and validation",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new object from a source directory
    Create(CreateArgs),
    /// Build an object by replaying v1..vN source subdirectories
    Build(BuildArgs),
    /// Append a version to an existing object
    Update(UpdateArgs),
    /// Check an object for conformance
    Validate(ValidateArgs),
    /// Summarize an object's inventory
    Show(ShowArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Directory to create the object in (must be empty or absent)
    pub object: String,
    /// Source directory whose tree becomes the v1 state
    pub source: String,
    /// Object identifier (a URI)
    #[arg(long)]
    pub id: String,
    #[arg(long, default_value = "sha512")]
    pub digest_algorithm: String,
    #[arg(long)]
    pub content_directory: Option<String>,
    /// Zero-pad version numbers to this width (0 for none)
    #[arg(long, default_value = "0")]
    pub padding: usize,
    #[command(flatten)]
    pub meta: MetaArgs,
}

#[derive(Args)]
pub struct BuildArgs {
    pub object: String,
    /// Source directory containing v1, v2, ... subdirectories
    pub source: String,
    #[arg(long)]
    pub id: String,
    #[arg(long, default_value = "sha512")]
    pub digest_algorithm: String,
    #[arg(long)]
    pub content_directory: Option<String>,
    #[arg(long, default_value = "0")]
    pub padding: usize,
    #[command(flatten)]
    pub meta: MetaArgs,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub object: String,
    /// Source directory for the new version's state; omit to carry the
    /// previous state forward (digest migration, fixity additions)
    pub source: Option<String>,
    /// Migrate the object to a different digest algorithm
    #[arg(long)]
    pub digest_algorithm: Option<String>,
    /// Add fixity entries under this algorithm (repeatable)
    #[arg(long)]
    pub add_fixity: Vec<String>,
    /// Copy content even when an identical file already exists in an
    /// earlier version
    #[arg(long)]
    pub no_forward_delta: bool,
    /// Copy every file even when identical content exists in this version
    #[arg(long)]
    pub no_dedupe: bool,
    #[command(flatten)]
    pub meta: MetaArgs,
}

#[derive(Args)]
pub struct MetaArgs {
    #[arg(short, long)]
    pub message: Option<String>,
    #[arg(long)]
    pub user_name: Option<String>,
    #[arg(long)]
    pub user_address: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    pub object: String,
    /// Accept any known digest algorithm as primary
    #[arg(long)]
    pub lax_digests: bool,
    /// Keep at most this many diagnostics (counts stay exact)
    #[arg(long)]
    pub max_diagnostics: Option<usize>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub object: String,
}
