use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "curvectl",
    version,
    about = "Curve log filtering and acquisition tool",
    long_about = "Filter outliers from curve logs, compact selected index values into ranges\n\
                  and replay recorded logs through the streaming controller.\n\
                  Samples are read as JSON: [{\"index\": 1500.0, \"values\": {\"GR\": 45.2}}, ...]"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Remove outliers and out-of-bounds values from a sample file
    Filter(FilterArgs),
    /// Collapse selected index values into contiguous ranges
    Compact(CompactArgs),
    /// List the built-in sensitivity presets
    Presets(PresetsArgs),
    /// Replay a recorded log as a growing log through the streaming controller
    Replay(ReplayArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Depth,
    Time,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    Increasing,
    Decreasing,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SensitivityArg {
    Low,
    Medium,
    High,
}

#[derive(Args)]
pub struct IndexArgs {
    /// Kind of index curve
    #[arg(long, value_enum, default_value = "depth")]
    pub kind: KindArg,

    /// Direction the index moves as the log grows
    #[arg(long, value_enum, default_value = "increasing")]
    pub direction: DirectionArg,
}

#[derive(Args)]
pub struct FilterArgs {
    /// JSON file with an array of samples
    #[arg(long)]
    pub input: String,

    /// Curve holding the index values; never filtered
    #[arg(long)]
    pub index_curve: String,

    /// Built-in outlier sensitivity (default: medium)
    #[arg(long, value_enum, conflicts_with_all = ["global_z", "local_z", "window"])]
    pub sensitivity: Option<SensitivityArg>,

    /// Only apply --bound filters, no outlier removal
    #[arg(long, conflicts_with_all = ["sensitivity", "global_z", "local_z", "window"])]
    pub skip_outliers: bool,

    /// Custom global Z-score threshold
    #[arg(long, requires_all = ["local_z", "window"])]
    pub global_z: Option<f64>,

    /// Custom local Z-score threshold
    #[arg(long, requires_all = ["global_z", "window"])]
    pub local_z: Option<f64>,

    /// Custom local window size
    #[arg(long, requires_all = ["global_z", "local_z"])]
    pub window: Option<usize>,

    /// Bounds as CURVE=MIN:MAX (either side may be empty), repeatable
    #[arg(long = "bound", value_name = "CURVE=MIN:MAX")]
    pub bounds: Vec<String>,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no pretty printing)
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct CompactArgs {
    /// JSON array with every index value of the log, in sequence order
    #[arg(long)]
    pub full: String,

    /// JSON array with the selected index values, in any order
    #[arg(long)]
    pub selected: String,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no pretty printing)
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct PresetsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// JSON file with the recorded samples, in sequence order
    #[arg(long)]
    pub input: String,

    /// Curve holding the index values
    #[arg(long)]
    pub index_curve: String,

    /// Curves to acquire (default: all)
    #[arg(long, num_args = 1..)]
    pub curves: Vec<String>,

    #[command(flatten)]
    pub index: IndexArgs,

    /// Samples present before streaming starts
    #[arg(long, default_value_t = 50)]
    pub initial: usize,

    /// Samples added to the log before each poll
    #[arg(long, default_value_t = 10)]
    pub batch: usize,

    /// Maximum number of batches to add
    #[arg(long, default_value_t = 5)]
    pub polls: usize,

    /// Poll interval in milliseconds
    #[arg(long, env = "CURVE_POLL_INTERVAL_MS", default_value_t = 200)]
    pub interval_ms: u64,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no pretty printing)
    #[arg(long)]
    pub compact: bool,
}
