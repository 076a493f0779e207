use anyhow::Result;
use clap::{Parser, Subcommand};
use coderun_cli::{console, source};
use coderun_client::{ClientFactory, ExecutionClient, SnippetClient};
use coderun_core::{
    config::ConfigLoader, CoderunConfig, ExecutionMode, SessionController, SessionStatus,
    SnippetShelf, StartRequest,
};
use coderun_types::NewSnippet;
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(name = "coderun", author, version = "0.1.0", about = "Run code on a remote execution backend")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, global = true, help = "Configuration file (defaults to the user config directory)")]
    config: Option<PathBuf>,

    #[clap(long, global = true, help = "Log level, overrides logging.level")]
    log_level: Option<String>,

    #[clap(long, global = true, help = "Backend base URL, overrides backend.base_url")]
    server_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a source file and print its output
    Run {
        file: PathBuf,

        #[clap(long, short, help = "Python, C or C++; detected from the extension by default")]
        language: Option<String>,

        #[clap(long, conflicts_with = "input_file", help = "Stdin for the program (\\n separates lines)")]
        input: Option<String>,

        #[clap(long, help = "File whose contents are the program's stdin")]
        input_file: Option<PathBuf>,

        #[clap(long, short, help = "Answer prompts as the program runs")]
        interactive: bool,
    },
    /// Run a source file interactively (same as `run --interactive`)
    Interactive {
        file: PathBuf,

        #[clap(long, short)]
        language: Option<String>,
    },
    /// Manage saved snippets
    Snippet {
        #[clap(subcommand)]
        action: SnippetCommands,
    },
    /// Check that the backend is reachable
    Health,
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand, Debug)]
enum SnippetCommands {
    /// Save a source file as a snippet
    Save {
        file: PathBuf,

        #[clap(long, short, help = "Snippet title (defaults to the file name)")]
        title: Option<String>,

        #[clap(long, short)]
        language: Option<String>,

        #[clap(long)]
        public: bool,
    },
    /// List saved snippets
    List,
    /// Run a saved snippet
    Run {
        id: u64,

        #[clap(long, short)]
        interactive: bool,

        #[clap(long, help = "Stdin for a one-shot run (\\n separates lines)")]
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref()).await?;
    if let Some(server_url) = &cli.server_url {
        config.backend.base_url = server_url.clone();
        config.backend.interactive_url = None;
        config.validate()?;
    }

    // Interactive runs own the terminal, so logs go to a file.
    let interactive = match &cli.command {
        Commands::Run { interactive, .. } => {
            *interactive || config.session.default_mode == ExecutionMode::Interactive
        }
        Commands::Interactive { .. } => true,
        Commands::Snippet {
            action: SnippetCommands::Run { interactive, .. },
        } => *interactive,
        _ => false,
    };
    init_logging(&config, cli.log_level.as_deref(), interactive)?;

    match cli.command {
        Commands::Run {
            file,
            language,
            input,
            input_file,
            interactive,
        } => {
            let mode = if interactive {
                ExecutionMode::Interactive
            } else {
                config.session.default_mode
            };
            let code = source::read_source(&file).await?;
            let language =
                source::resolve_language(language.as_deref(), &file, &config.session.default_language)?;
            let mut request = request_for(mode, code, language.display_name());
            if let Some(input) = source::captured_input(input, input_file.as_deref()).await? {
                request = request.with_input(input);
            }
            run_session(&config, request).await
        }
        Commands::Interactive { file, language } => {
            let code = source::read_source(&file).await?;
            let language =
                source::resolve_language(language.as_deref(), &file, &config.session.default_language)?;
            let request = StartRequest::interactive(code, language.display_name());
            run_session(&config, request).await
        }
        Commands::Snippet { action } => handle_snippet_command(&config, action).await,
        Commands::Health => {
            check_backend(&config).await?;
            println!("Backend at {} is reachable.", config.backend.base_url);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            print!("{}", ConfigLoader::to_yaml(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(config: &CoderunConfig, override_level: Option<&str>, to_file: bool) -> Result<()> {
    let level = override_level.unwrap_or(&config.logging.level);
    let log_level_filter = level.parse().unwrap_or(LevelFilter::Info);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level_filter);

    if to_file {
        use std::fs::OpenOptions;

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.file)
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to open log file {}: {}",
                    config.logging.file.display(),
                    e
                )
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    builder.init();
    Ok(())
}

fn request_for(mode: ExecutionMode, code: String, language: &str) -> StartRequest {
    match mode {
        ExecutionMode::OneShot => StartRequest::one_shot(code, language),
        ExecutionMode::Interactive => StartRequest::interactive(code, language),
    }
}

async fn check_backend(config: &CoderunConfig) -> Result<()> {
    let client = ClientFactory::create_http_client(config.backend.base_url.clone());
    client.health_check().await.map_err(|e| {
        anyhow::anyhow!(
            "Backend at {} is not reachable: {}",
            config.backend.base_url,
            e
        )
    })
}

async fn run_session(config: &CoderunConfig, request: StartRequest) -> Result<ExitCode> {
    check_backend(config).await?;

    let mut controller = SessionController::from_config(config);
    let session_id = controller.start(request)?;
    log::info!("Session {} started", session_id);

    let status = console::drive(&mut controller).await?;
    log::info!("Session {} ended: {}", session_id, status);

    match status {
        SessionStatus::Completed => Ok(ExitCode::SUCCESS),
        SessionStatus::Stopped => Ok(ExitCode::from(130)),
        _ => Ok(ExitCode::FAILURE),
    }
}

fn snippet_client(config: &CoderunConfig) -> SnippetClient {
    SnippetClient::new(config.backend.base_url.clone())
        .with_snippets_path(config.backend.snippets_path.clone())
        .with_timeout(config.session.request_timeout())
}

async fn handle_snippet_command(config: &CoderunConfig, action: SnippetCommands) -> Result<ExitCode> {
    let client = snippet_client(config);
    let mut shelf = SnippetShelf::new();

    match action {
        SnippetCommands::Save {
            file,
            title,
            language,
            public,
        } => {
            let code = source::read_source(&file).await?;
            let language =
                source::resolve_language(language.as_deref(), &file, &config.session.default_language)?;
            let title = title.unwrap_or_else(|| source::default_title(&file));

            let mut snippet = NewSnippet::new(title, code, language);
            if public {
                snippet = snippet.public();
            }
            let saved = shelf.save(&client, snippet).await?;
            println!("Saved snippet {}: {}", saved.id, saved.title);
        }
        SnippetCommands::List => {
            shelf.refresh(&client).await?;
            if shelf.list().is_empty() {
                println!("No snippets saved.");
            } else {
                for snippet in shelf.list() {
                    println!("{:>5}  {:<7} {}", snippet.id, snippet.language_name, snippet.title);
                }
            }
        }
        SnippetCommands::Run {
            id,
            interactive,
            input,
        } => {
            shelf.refresh(&client).await?;
            let seed = shelf
                .select(id)
                .ok_or_else(|| anyhow::anyhow!("No snippet with id {}", id))?;
            let mode = if interactive {
                ExecutionMode::Interactive
            } else {
                ExecutionMode::OneShot
            };

            let mut request = seed.into_request(mode);
            if let Some(input) = source::captured_input(input, None).await? {
                request = request.with_input(input);
            }
            return run_session(config, request).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}
