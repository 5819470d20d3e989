// ==========================================
// CSV Import+ - 命令行参数定义
// ==========================================
// 职责: clap 派生的子命令与全局参数（--db / --locale / --log-json）
// ==========================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use csv_import_plus::DelimiterMode;

#[derive(Parser, Debug)]
#[command(
    name = "csv-import-plus",
    version,
    about = "Bulk-import CSV text into flashcard decks"
)]
pub struct Cli {
    /// Collection database (default: $CSV_IMPORT_PLUS_DB_PATH or the user data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// UI language for messages (en, zh-CN)
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the collection and seed the stock note types
    Init,
    /// List note types with their fields
    NoteTypes,
    /// List decks; the current deck is marked with '*'
    Decks,
    /// Show what would be detected for the input
    Detect(DetectArgs),
    /// Import the input as notes
    Import(ImportArgs),
    /// Create a subdeck and make it current
    Subdeck(SubdeckArgs),
    /// Read or write stored settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Read CSV from this file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// CSV given inline; wins over --file when not blank
    #[arg(long)]
    pub text: Option<String>,

    /// auto, comma, tab, semicolon, pipe or a single character
    #[arg(long)]
    pub delimiter: Option<DelimiterMode>,

    /// First row is a header
    #[arg(long, default_value_t = false)]
    pub header: bool,

    /// Print the result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Target deck (default: current deck)
    #[arg(long)]
    pub deck: Option<String>,

    /// Note type name; overrides #notetype and auto-detection
    #[arg(long)]
    pub notetype: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SubdeckArgs {
    /// Parent deck (default: current deck)
    #[arg(long)]
    pub parent: Option<String>,

    /// Name of the new subdeck
    pub name: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show stored settings and the effective detection settings
    List,
    /// Print one stored setting
    Get { key: String },
    /// Store a setting
    Set { key: String, value: String },
}
