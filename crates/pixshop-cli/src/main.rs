use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod context;
mod logging;

use context::AppContext;

#[derive(Parser)]
#[command(name = "pixshop")]
#[command(about = "Pixshop - AI photo editing with a persistent undo/redo history", long_about = None)]
struct Cli {
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the session store directory
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Debug logging for pixshop crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the persisted session
    Show,
    /// Write the current image to a file or directory
    Export { path: PathBuf },
    /// Append images to the session as uploads
    Import {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Step back one entry
    Undo,
    /// Step forward one entry
    Redo,
    /// Remove the persisted session
    Clear,
    /// Destroy the whole session store
    Reset,
    /// Generate a new image from a prompt
    Generate {
        prompt: String,
        #[command(flatten)]
        options: GenerationOptions,
    },
    /// Apply a prompt to the current image
    Edit {
        prompt: String,
        /// Kind of step to record
        #[arg(long, value_enum, default_value_t = EditKind::Edit)]
        kind: EditKind,
        #[command(flatten)]
        options: GenerationOptions,
    },
    /// Show or change application settings
    Settings {
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        #[arg(long, value_enum)]
        tier: Option<TierArg>,
        /// Feature toggle as `name=true|false`, repeatable
        #[arg(long = "toggle", value_parser = commands::settings::parse_toggle)]
        toggles: Vec<(String, bool)>,
    },
}

#[derive(clap::Args)]
struct GenerationOptions {
    /// Model override
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    /// Extra instruction appended to the prompt
    #[arg(long)]
    hint: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EditKind {
    Edit,
    Transformation,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
    System,
}

#[derive(Clone, Copy, ValueEnum)]
enum TierArg {
    Free,
    Pro,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = AppContext::load(cli.config.clone(), cli.store_dir.clone())?;
    logging::init(&ctx.config.log_level, cli.verbose)?;

    match cli.command {
        Commands::Show => commands::session::show(&ctx).await?,
        Commands::Export { path } => commands::session::export(&ctx, &path).await?,
        Commands::Import { images } => commands::session::import(&ctx, &images).await?,
        Commands::Undo => commands::session::undo(&ctx).await?,
        Commands::Redo => commands::session::redo(&ctx).await?,
        Commands::Clear => commands::session::clear(&ctx).await?,
        Commands::Reset => commands::session::reset(&ctx).await?,
        Commands::Generate { prompt, options } => {
            commands::generate::generate(&ctx, &prompt, options.into()).await?
        }
        Commands::Edit {
            prompt,
            kind,
            options,
        } => commands::generate::edit(&ctx, &prompt, kind.into(), options.into()).await?,
        Commands::Settings {
            theme,
            tier,
            toggles,
        } => {
            commands::settings::run(&ctx, theme.map(Into::into), tier.map(Into::into), toggles)
                .await?
        }
    }

    Ok(())
}

impl From<GenerationOptions> for pixshop_core::generation::GenerationConfig {
    fn from(options: GenerationOptions) -> Self {
        Self {
            model: options.model,
            temperature: options.temperature,
            style_hint: options.hint,
        }
    }
}

impl From<EditKind> for pixshop_core::history::EntryKind {
    fn from(kind: EditKind) -> Self {
        match kind {
            EditKind::Edit => Self::Edit,
            EditKind::Transformation => Self::Transformation,
        }
    }
}

impl From<ThemeArg> for pixshop_core::settings::Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Dark => Self::Dark,
            ThemeArg::Light => Self::Light,
            ThemeArg::System => Self::System,
        }
    }
}

impl From<TierArg> for pixshop_core::settings::Tier {
    fn from(tier: TierArg) -> Self {
        match tier {
            TierArg::Free => Self::Free,
            TierArg::Pro => Self::Pro,
        }
    }
}
