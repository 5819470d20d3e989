// ==========================================
// CSV Import+ - 命令行入口
// ==========================================
// 职责: 解析命令行 → 初始化日志/语言/AppState → 分发命令
// 输出: 结果写 stdout，日志与错误提示写 stderr
// ==========================================

mod cli;

use std::io::Read;

use anyhow::{anyhow, Result};
use clap::Parser;
use csv_import_plus::api::{render_outcome, render_status, render_subdeck_created};
use csv_import_plus::app::{get_default_db_path, AppState};
use csv_import_plus::config::ImportConfigReader;
use csv_import_plus::domain::{AnalysisOptions, ContainerSelection, DelimiterMode, ImportRequest};
use csv_import_plus::i18n;
use csv_import_plus::importer::InputSource;
use csv_import_plus::logging::{self, LogFormat};
use csv_import_plus::repository::SchemaRepository;
use csv_import_plus::ApiError;
use tracing::{error, info};

use crate::cli::{Cli, Commands, ConfigCommand, ImportArgs, InputArgs, SubdeckArgs};

fn main() {
    let cli = Cli::parse();

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    if let Err(err) = run(cli) {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        let message = match err.downcast_ref::<ApiError>() {
            Some(api_err) => api_err.user_message(),
            None => err.to_string(),
        };
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let db_path = match &cli.db {
        Some(path) => path.to_string_lossy().to_string(),
        None => get_default_db_path(),
    };
    info!("{} {} 使用数据库: {}", csv_import_plus::APP_NAME, csv_import_plus::VERSION, db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let locale = match cli.locale {
        Some(locale) => locale,
        None => state.config.get_ui_locale().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "界面语言读取失败，使用 en");
            "en".to_string()
        }),
    };
    i18n::set_locale(&locale);

    match cli.command {
        Commands::Init => cmd_init(&state),
        Commands::NoteTypes => cmd_note_types(&state),
        Commands::Decks => cmd_decks(&state),
        Commands::Detect(args) => cmd_detect(&state, &args.input),
        Commands::Import(args) => cmd_import(&state, &args),
        Commands::Subdeck(args) => cmd_subdeck(&state, &args),
        Commands::Config(command) => cmd_config(&state, command),
    }
}

fn cmd_init(state: &AppState) -> Result<()> {
    let schemas = state.import_api.list_schemas()?;
    println!("{}", state.db_path);
    println!(
        "note types: {} ({} new), decks: {}",
        schemas.len(),
        state.seeded_note_types,
        state.import_api.list_containers()?.len()
    );
    Ok(())
}

fn cmd_note_types(state: &AppState) -> Result<()> {
    for info in state.import_api.list_schemas()? {
        match state.collection.get_schema(info.id)? {
            Some(schema) => println!("{}\t{}", schema.name, schema.fields.join(", ")),
            None => println!("{}", info.name),
        }
    }
    Ok(())
}

fn cmd_decks(state: &AppState) -> Result<()> {
    let current = state.import_api.current_container()?.map(|deck| deck.id);
    for deck in state.import_api.list_containers()? {
        let marker = if Some(deck.id) == current { "*" } else { " " };
        println!("{} {}", marker, deck.name);
    }
    Ok(())
}

/// 命令行给出的输入；既无 --text 也无 --file 时读 stdin
fn read_input(args: &InputArgs) -> Result<String> {
    if args.text.is_none() && args.file.is_none() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(InputSource::from_text(text).active_raw().to_string());
    }

    let mut source = InputSource::from_text(args.text.clone().unwrap_or_default());
    if let Some(path) = &args.file {
        source = source.with_file(path);
    }
    Ok(source.active_raw().to_string())
}

/// 未指定 --delimiter 时使用配置中的默认模式
fn delimiter_mode(state: &AppState, args: &InputArgs) -> DelimiterMode {
    args.delimiter.unwrap_or_else(|| {
        state
            .config
            .get_default_delimiter_mode()
            .unwrap_or_default()
    })
}

fn cmd_detect(state: &AppState, args: &InputArgs) -> Result<()> {
    let raw = read_input(args)?;
    let options = AnalysisOptions {
        delimiter_mode: delimiter_mode(state, args),
        header_hint: args.header,
    };

    let Some(analysis) = state.import_api.analyze_content(&raw, options) else {
        return Err(ApiError::InputEmpty.into());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", render_status(&analysis));
    }
    Ok(())
}

fn cmd_import(state: &AppState, args: &ImportArgs) -> Result<()> {
    let raw = read_input(&args.input)?;
    let request = ImportRequest {
        container: match &args.deck {
            Some(name) => ContainerSelection::ByName(name.clone()),
            None => ContainerSelection::Current,
        },
        schema_override: args.notetype.clone(),
        delimiter_mode: delimiter_mode(state, &args.input),
        header_present: args.input.header,
    };

    let response = state.import_api.quick_import(&raw, &request)?;
    if args.input.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", render_outcome(&response));
    }
    Ok(())
}

fn cmd_subdeck(state: &AppState, args: &SubdeckArgs) -> Result<()> {
    let parent = match &args.parent {
        Some(parent) => parent.clone(),
        None => state
            .import_api
            .current_container()?
            .map(|deck| deck.name)
            .unwrap_or_default(),
    };

    let deck = state.import_api.create_subdeck(&parent, &args.name)?;
    println!("{}", render_subdeck_created(&deck));
    Ok(())
}

fn cmd_config(state: &AppState, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List => {
            let stored = state
                .config
                .list_global_configs()
                .map_err(|e| anyhow!("配置读取失败: {}", e))?;
            for (key, value) in stored {
                println!("{} = {}", key, value);
            }
            let settings = state.import_api.detection_settings();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommand::Get { key } => {
            let value = state
                .config
                .get_global_config_value(&key)
                .map_err(|e| anyhow!("配置读取失败: {}", e))?;
            match value {
                Some(value) => println!("{}", value),
                None => return Err(anyhow!("未设置配置项: {}", key)),
            }
        }
        ConfigCommand::Set { key, value } => {
            state
                .config
                .set_global_config_value(&key, &value)
                .map_err(|e| anyhow!("配置写入失败: {}", e))?;
            info!(key = %key, value = %value, "配置已写入");
        }
    }
    Ok(())
}
