use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use dotenvy::dotenv;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

mod config;
mod llm;
mod store;
mod studio;
mod utils;

use config::CONFIG;
use llm::media::extension_for_mime;
use llm::{GeneratedImage, GeminiImageClient};
use store::StateStore;
use studio::options::{BackgroundType, Choice, Expression, Glasses, Template, Theme, PALETTE};
use studio::prompt::compile_persisted;
use studio::{HeadshotConfig, Studio, TriggerOutcome};
use utils::logging::init_logging;

const CAPTION_POLL_INTERVAL: Duration = Duration::from_millis(200);

fn usage() -> String {
    format!(
        "Usage:
  headshot-studio generate --image <path> [options] [--out <path>]
  headshot-studio prompt [options]
  headshot-studio theme

Options (each one is saved as the new default):
  --template <front-smiling|hand-to-chin|side-profile>
  --expression <smiling|neutral>
  --glasses <none|wayfarer|round|rectangular|cat-eye|aviator>
  --background <studio|plain|office>
  --color <#RRGGBB>          palette: {}
  --monochrome | --natural
  --tie | --no-tie
  --reset",
        PALETTE.join(" ")
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigEdit {
    Template(Template),
    Expression(Expression),
    Glasses(Glasses),
    Background(BackgroundType),
    Color(String),
    Monochrome(bool),
    Tie(bool),
    Reset,
}

impl ConfigEdit {
    fn apply(self, config: HeadshotConfig) -> HeadshotConfig {
        match self {
            ConfigEdit::Template(template) => config.with_template(template),
            ConfigEdit::Expression(expression) => config.with_expression(expression),
            ConfigEdit::Glasses(glasses) => config.with_glasses(glasses),
            ConfigEdit::Background(background) => config.with_background(background),
            ConfigEdit::Color(color) => config.with_background_color(color),
            ConfigEdit::Monochrome(is_monochrome) => config.with_monochrome(is_monochrome),
            ConfigEdit::Tie(has_tie) => config.with_tie(has_tie),
            ConfigEdit::Reset => HeadshotConfig::default(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CliCommand {
    Generate {
        image: PathBuf,
        out: Option<PathBuf>,
        edits: Vec<ConfigEdit>,
    },
    Prompt {
        edits: Vec<ConfigEdit>,
    },
    Theme,
    Help,
}

fn parse_color(value: &str) -> anyhow::Result<String> {
    let trimmed = value.trim();
    let hex = trimmed
        .strip_prefix('#')
        .ok_or_else(|| anyhow!("Invalid --color value: {value} (expected #RRGGBB)"))?;
    if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(anyhow!("Invalid --color value: {value} (expected #RRGGBB)"));
    }
    let color = format!("#{}", hex.to_ascii_uppercase());
    if !PALETTE.contains(&color.as_str()) {
        warn!("{color} is outside the studio palette; using it anyway");
    }
    Ok(color)
}

fn parse_cli_args(args: &[String]) -> anyhow::Result<CliCommand> {
    let subcommand = match args.get(1).map(|value| value.as_str()) {
        None | Some("--help") | Some("-h") | Some("help") => return Ok(CliCommand::Help),
        Some(value) => value,
    };
    if !matches!(subcommand, "generate" | "prompt" | "theme") {
        return Err(anyhow!("Unknown command: {subcommand}\n{}", usage()));
    }

    let mut image: Option<PathBuf> = None;
    let mut out: Option<PathBuf> = None;
    let mut edits = Vec::new();

    let mut index = 2;
    while index < args.len() {
        let flag = args[index].as_str();
        let mut value = || {
            index += 1;
            args.get(index)
                .map(|value| value.as_str())
                .ok_or_else(|| anyhow!("Missing value for {flag}"))
        };
        match flag {
            "--image" if subcommand == "generate" => {
                image = Some(PathBuf::from(value()?));
            }
            "--out" if subcommand == "generate" => {
                out = Some(PathBuf::from(value()?));
            }
            "--template" => edits.push(ConfigEdit::Template(Template::parse(value()?)?)),
            "--expression" => edits.push(ConfigEdit::Expression(Expression::parse(value()?)?)),
            "--glasses" => edits.push(ConfigEdit::Glasses(Glasses::parse(value()?)?)),
            "--background" => {
                edits.push(ConfigEdit::Background(BackgroundType::parse(value()?)?))
            }
            "--color" => edits.push(ConfigEdit::Color(parse_color(value()?)?)),
            "--monochrome" => edits.push(ConfigEdit::Monochrome(true)),
            "--natural" => edits.push(ConfigEdit::Monochrome(false)),
            "--tie" => edits.push(ConfigEdit::Tie(true)),
            "--no-tie" => edits.push(ConfigEdit::Tie(false)),
            "--reset" => edits.push(ConfigEdit::Reset),
            "--help" | "-h" => return Ok(CliCommand::Help),
            other => {
                return Err(anyhow!(
                    "Unknown {subcommand} argument: {other}\n{}",
                    usage()
                ));
            }
        }
        index += 1;
    }

    match subcommand {
        "generate" => Ok(CliCommand::Generate {
            image: image.ok_or_else(|| anyhow!("--image is required"))?,
            out,
            edits,
        }),
        "prompt" => Ok(CliCommand::Prompt { edits }),
        _ if edits.is_empty() => Ok(CliCommand::Theme),
        _ => Err(anyhow!("theme takes no options\n{}", usage())),
    }
}

fn open_studio(store: &StateStore) -> Studio {
    let service = Arc::new(GeminiImageClient::from_config(&CONFIG));
    Studio::new(service, &store.load(), CONFIG.caption_interval())
}

fn color_is_ignored(edits: &[ConfigEdit], config: &HeadshotConfig) -> bool {
    edits.iter().any(|edit| matches!(edit, ConfigEdit::Color(_)))
        && !config.background_type.uses_color()
}

fn apply_edits(studio: &Studio, store: &StateStore, edits: Vec<ConfigEdit>) -> anyhow::Result<()> {
    for edit in &edits {
        let persisted = studio.update_config(edit.clone().apply(studio.config()));
        store.save(&persisted)?;
    }
    if color_is_ignored(&edits, &studio.config()) {
        warn!("--color only affects the studio and plain backgrounds");
    }
    Ok(())
}

// Ctrl-C drops the generation future; the studio guard puts the phase back to Idle.
async fn until_interrupted<T>(
    work: impl Future<Output = T>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> anyhow::Result<T> {
    tokio::select! {
        output = work => Ok(output),
        _ = interrupt => Err(anyhow!("Interrupted; generation abandoned")),
    }
}

fn default_output_path(dir: &Path, image: &GeneratedImage) -> PathBuf {
    dir.join(format!(
        "headshot_{}.{}",
        Utc::now().timestamp_millis(),
        extension_for_mime(&image.mime_type)
    ))
}

// Mirrors the studio caption onto stderr while a generation runs.
fn spawn_caption_reporter(studio: Arc<Studio>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last: Option<String> = None;
        let mut ticker = tokio::time::interval(CAPTION_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            let current = studio.caption();
            if current != last {
                if let Some(caption) = &current {
                    eprintln!("{caption}");
                }
                last = current;
            }
        }
    })
}

async fn write_output(path: &Path, image: &GeneratedImage) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            anyhow!(
                "Failed to create output directory '{}': {}",
                parent.display(),
                err
            )
        })?;
    }
    tokio::fs::write(path, &image.bytes)
        .await
        .map_err(|err| anyhow!("Failed to write '{}': {}", path.display(), err))
}

async fn run_generate(
    store: &StateStore,
    image: PathBuf,
    out: Option<PathBuf>,
    edits: Vec<ConfigEdit>,
) -> anyhow::Result<()> {
    if CONFIG.gemini_api_key.is_empty() {
        return Err(anyhow!("GEMINI_API_KEY is required for generate"));
    }

    let bytes = tokio::fs::read(&image)
        .await
        .map_err(|err| anyhow!("Failed to read '{}': {}", image.display(), err))?;

    let studio = Arc::new(open_studio(store));
    apply_edits(&studio, store, edits)?;
    studio
        .upload_source(bytes)
        .map_err(|err| anyhow!(err.user_message()))?;

    info!(
        "Generating headshot with {} ({})",
        CONFIG.gemini_image_model,
        studio.config().template.label()
    );
    let reporter = spawn_caption_reporter(studio.clone());
    let outcome = until_interrupted(studio.trigger_generate(), tokio::signal::ctrl_c()).await;
    reporter.abort();
    let outcome = outcome?;

    match outcome {
        TriggerOutcome::Completed(Ok(generated)) => {
            let path = out.unwrap_or_else(|| default_output_path(&CONFIG.output_dir, &generated));
            write_output(&path, &generated).await?;
            info!(
                "Saved headshot to {} ({} bytes)",
                path.display(),
                generated.bytes.len()
            );
            println!("{}", path.display());
            Ok(())
        }
        TriggerOutcome::Completed(Err(err)) => {
            error!("Generation failed: {}", err);
            Err(anyhow!(err.user_message()))
        }
        TriggerOutcome::MissingSource => Err(anyhow!("Upload a source photo first")),
        TriggerOutcome::AlreadyInFlight => Err(anyhow!("A generation is already running")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_cli_args(&args)?;
    let store = StateStore::new(CONFIG.state_path.clone());

    match command {
        CliCommand::Help => {
            println!("{}", usage());
            Ok(())
        }
        CliCommand::Prompt { edits } => {
            let studio = open_studio(&store);
            apply_edits(&studio, &store, edits)?;
            println!("{}", compile_persisted(&studio.snapshot().config)?);
            Ok(())
        }
        CliCommand::Theme => {
            let studio = open_studio(&store);
            let persisted = studio.toggle_theme();
            store.save(&persisted)?;
            let theme = match persisted.theme {
                Theme::Light => "light",
                Theme::Dark => "dark",
            };
            info!("Theme set to {} in {}", theme, store.path().display());
            println!("{theme}");
            Ok(())
        }
        CliCommand::Generate { image, out, edits } => {
            run_generate(&store, image, out, edits).await
        }
    }
}
