//! Build consulting report templates from a JSON draft.
//!
//! Reads the API key from the `OPENAI_API_KEY` environment variable.
//!
//! # Examples
//!
//! ```sh
//! klarity init --context-file blueprint.md
//! klarity add-file --name "Budget" --type xlsx --description "FY budget sheet"
//! klarity show
//! klarity generate --output-dir out/
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use klarity_cli::{
    DEFAULT_DRAFT_PATH, FactoryConfig, FailureReport, ProgressHandler, failure_report,
    load_draft, position_to_index, save_draft, unexpected_failure,
};
use klarity_factory::prelude::*;
use klarity_factory::build_section_prompt;
use klarity_factory::document::DOCX_MIME;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Generate `.docx` report templates whose sections carry AI-written
/// configuration comments.
#[derive(Parser)]
#[command(name = "klarity", version)]
struct Cli {
    /// Path of the template draft.
    #[arg(long, global = true, default_value = DEFAULT_DRAFT_PATH)]
    draft: PathBuf,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the starter draft.
    Init {
        /// Master context text.
        #[arg(long, conflicts_with = "context_file")]
        context: Option<String>,
        /// Read the master context from a file.
        #[arg(long)]
        context_file: Option<PathBuf>,
        /// Overwrite an existing draft.
        #[arg(long)]
        force: bool,
    },
    /// Replace the master context.
    SetContext {
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Describe another input file.
    AddFile {
        #[arg(long)]
        name: String,
        /// PDF, DOCX, XLSX, MP4, TXT or CSV.
        #[arg(long = "type", default_value = "docx")]
        file_type: FileType,
        #[arg(long)]
        description: String,
    },
    /// Remove an input file by its position in `show`.
    RemoveFile { position: usize },
    /// Append a section.
    AddSection {
        #[arg(long)]
        title: String,
        /// freeform, bulleted or table.
        #[arg(long, default_value = "freeform")]
        format: SectionFormat,
        #[arg(long)]
        goal: String,
    },
    /// Remove a section by its position in `show`.
    RemoveSection { position: usize },
    /// Print the draft.
    Show,
    /// Print the prompt that would be sent for a section, without calling the API.
    Prompt {
        /// Section position; all sections when omitted.
        #[arg(long)]
        section: Option<usize>,
    },
    /// Generate the template document.
    Generate {
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        /// OpenAI-compatible API root.
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let draft = cli.draft.as_path();
    let result = match cli.command {
        Command::Generate {
            output_dir,
            model,
            temperature,
            base_url,
        } => {
            let defaults = FactoryConfig::default();
            let config = FactoryConfig {
                model: model.unwrap_or(defaults.model),
                temperature: temperature.unwrap_or(defaults.temperature),
                base_url: base_url.unwrap_or(defaults.base_url),
                output_dir,
            };
            generate(draft, &config).await
        }
        Command::Init {
            context,
            context_file,
            force,
        } => init(draft, context, context_file, force).map_err(FailureReport::error),
        Command::SetContext { text, file } => update(draft, |d| {
            d.master_context = read_context(text, file)?.unwrap_or_default();
            Ok(())
        }),
        Command::AddFile {
            name,
            file_type,
            description,
        } => update(draft, |d| {
            d.add_input_file(InputFileDescriptor::new(name, file_type, description));
            Ok(())
        }),
        Command::RemoveFile { position } => update(draft, |d| {
            let index = position_to_index(position, d.input_files.len())?;
            if let Some(removed) = d.remove_input_file(index) {
                println!("Removed input file '{}'", removed.name);
            }
            Ok(())
        }),
        Command::AddSection {
            title,
            format,
            goal,
        } => update(draft, |d| {
            d.add_section(SectionSpec::new(title, format, goal));
            Ok(())
        }),
        Command::RemoveSection { position } => update(draft, |d| {
            let index = position_to_index(position, d.sections.len())?;
            if let Some(removed) = d.remove_section(index) {
                println!("Removed section '{}'", removed.title);
            }
            Ok(())
        }),
        Command::Show => load_draft(draft).map(|d| show(&d)).map_err(FailureReport::error),
        Command::Prompt { section } => print_prompts(draft, section).map_err(FailureReport::error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{}", report.message);
            if let Some(hint) = report.hint {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init(
    path: &Path,
    context: Option<String>,
    context_file: Option<PathBuf>,
    force: bool,
) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!(
            "draft '{}' already exists (use --force to overwrite)",
            path.display()
        ));
    }
    let mut draft = TemplateDraft::starter();
    if let Some(text) = read_context(context, context_file)? {
        draft.master_context = text;
    }
    save_draft(path, &draft)?;
    println!("Wrote starter draft to {}", path.display());
    Ok(())
}

/// Load the draft, apply `change` and save it back.
fn update(
    path: &Path,
    change: impl FnOnce(&mut TemplateDraft) -> Result<(), String>,
) -> Result<(), FailureReport> {
    let mut draft = load_draft(path).map_err(FailureReport::error)?;
    change(&mut draft).map_err(FailureReport::error)?;
    save_draft(path, &draft).map_err(FailureReport::error)
}

fn print_prompts(path: &Path, section: Option<usize>) -> Result<(), String> {
    let draft = load_draft(path)?;
    let indices: Vec<usize> = match section {
        Some(position) => vec![position_to_index(position, draft.sections.len())?],
        None => (0..draft.sections.len()).collect(),
    };
    for index in indices {
        let Some(spec) = draft.sections.get(index) else {
            continue;
        };
        println!("===== Section {}: {} =====", index + 1, spec.title);
        println!(
            "{}\n",
            build_section_prompt(&draft.master_context, &draft.input_files, spec)
        );
    }
    Ok(())
}

fn read_context(text: Option<String>, file: Option<PathBuf>) -> Result<Option<String>, String> {
    match (text, file) {
        (Some(text), _) => Ok(Some(text)),
        (None, Some(file)) => std::fs::read_to_string(&file)
            .map(Some)
            .map_err(|e| format!("failed to read '{}': {e}", file.display())),
        (None, None) => Ok(None),
    }
}

fn show(draft: &TemplateDraft) {
    println!("Master Context:");
    if draft.master_context.trim().is_empty() {
        println!("  (empty)");
    } else {
        for line in draft.master_context.lines() {
            println!("  {line}");
        }
    }

    println!("\nInput Files:");
    for (i, file) in draft.input_files.iter().enumerate() {
        println!("  {}. {} ({}): {}", i + 1, file.name, file.file_type, file.description);
    }

    println!("\nSections:");
    for (i, section) in draft.sections.iter().enumerate() {
        println!("  {}. {} [{}]", i + 1, section.title, section.format);
        println!("     Goal: {}", section.goal);
    }
}

async fn generate(path: &Path, config: &FactoryConfig) -> Result<(), FailureReport> {
    let draft = load_draft(path).map_err(FailureReport::error)?;
    // Surface draft problems before asking for a key.
    draft
        .validate()
        .map_err(|e| failure_report(&GenerationError::from(e)))?;

    let api_key = FactoryConfig::api_key_from_env().map_err(unexpected_failure)?;
    let client = config
        .build_client(api_key)
        .map_err(|e| failure_report(&GenerationError::from(e)))?;

    // Before any model call.
    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        FailureReport::error(format!(
            "failed to create '{}': {e}",
            config.output_dir.display()
        ))
    })?;

    let handler = CompositeEventHandler::new()
        .with(ProgressHandler)
        .with(LoggingHandler);

    eprintln!(
        "Generating {} section(s) with {}...",
        draft.sections.len(),
        config.model
    );
    let template = Generator::new(&client)
        .with_event_handler(&handler)
        .run(&draft)
        .await
        .map_err(|e| failure_report(&e))?;

    let out_path = config.output_dir.join(&template.file_name);
    std::fs::write(&out_path, &template.document).map_err(|e| {
        FailureReport::error(format!("failed to write '{}': {e}", out_path.display()))
    })?;

    info!(path = %out_path.display(), mime = DOCX_MIME, "template written");
    println!("Template generated successfully: {}", out_path.display());
    if template.comment_count() < template.sections.len() {
        eprintln!(
            "{} of {} section(s) have no comment; see the errors above.",
            template.sections.len() - template.comment_count(),
            template.sections.len()
        );
    }
    Ok(())
}
