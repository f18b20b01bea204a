mod app;
mod config;
mod draft;
mod effects;
mod logging;
mod render;
mod wizard;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use livescript_core::ScriptType;
use livescript_engine::{EngineConfig, EngineHandle};
use livescript_logging::script_info;

use crate::app::App;
use crate::config::{AppConfig, Overrides};
use crate::draft::DraftFile;

#[derive(Debug, Parser)]
#[command(name = "livescript", version, about = "Generate live-stream scripts from product drafts")]
struct Cli {
    /// RON config file (defaults to ./livescript.ron when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Gateway base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Number of storage checks before giving up.
    #[arg(long, global = true)]
    max_attempts: Option<u32>,
    /// Seconds between storage checks.
    #[arg(long, global = true)]
    interval_secs: Option<u64>,
    /// Use the long polling budget (60 checks) instead of the standard 20.
    #[arg(long, global = true)]
    extended_polling: bool,
    /// Save finished artifacts into this directory.
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one script from a draft file and wait for the result.
    Generate {
        #[arg(short = 't', long)]
        script_type: ScriptType,
        #[arg(short, long)]
        draft: PathBuf,
    },
    /// Look up product details by item id.
    Lookup { item_id: String },
    /// Interactive wizard with one tab per script type.
    Wizard {
        /// Draft loaded into the starting tab.
        #[arg(short, long)]
        draft: Option<PathBuf>,
        #[arg(short = 't', long, default_value = "single-product")]
        script_type: ScriptType,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply(&Overrides {
        base_url: cli.base_url,
        max_attempts: cli.max_attempts,
        interval_secs: cli.interval_secs,
        download_dir: cli.download_dir,
        extended_polling: cli.extended_polling,
        verbose: cli.verbose,
    });
    logging::initialize(config.logging.destination, config.log_level());
    script_info!("livescript starting with gateway {}", config.api.base_url);

    let engine = EngineHandle::new(EngineConfig {
        api: config.api_settings(),
        poll: config.poll_policy(),
        download: config.download_settings(),
    });
    let mut stdout = io::stdout();

    match cli.command {
        Command::Generate { script_type, draft } => {
            let draft = DraftFile::load(&draft)?.into_form();
            let mut app = App::new(
                engine,
                config.poll_policy().max_attempts,
                config.download.dir.clone(),
            );
            let outcome = app::run_generate(&mut app, script_type, draft, &mut stdout);
            app.shutdown();
            println!("{}", outcome?);
        }
        Command::Lookup { item_id } => {
            let timeout = config.api_settings().lookup_timeout + config.api_settings().connect_timeout;
            let outcome = app::run_lookup(&engine, &item_id, timeout, &mut stdout);
            engine.shutdown();
            outcome?;
        }
        Command::Wizard { draft, script_type } => {
            let mut app = App::new(
                engine,
                config.poll_policy().max_attempts,
                config.download.dir.clone(),
            );
            app.dispatch(livescript_core::Msg::TabSelected(script_type));
            if let Some(path) = draft {
                app.dispatch(livescript_core::Msg::DraftChanged {
                    script_type,
                    draft: DraftFile::load(&path)?.into_form(),
                });
            }
            let outcome = app::run_wizard(&mut app, &mut stdout);
            app.shutdown();
            outcome?;
        }
    }
    Ok(())
}
