//! parley - chat client with bounded conversation memory

mod config;
mod session;

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use base64::Engine;
use clap::Parser;

use parley_ai::{Message, Part, TokenEstimator, providers::OpenAIClient};
use parley_chat::{ConversationStore, MemoryConfig, MemoryManager, RequestBuilder, TurnOutcome};
use session::{SessionRecord, SessionStore};

const DEFAULT_MODEL: &str = "gpt-4o";

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an expert assistant specializing in programming, software \
engineering, math, physics and technology. Provide clear, concise and \
accurate technical answers. If code is requested, use best practices and \
explain your reasoning when appropriate.";

/// parley - chat client with bounded conversation memory
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o)
    #[arg(short, long)]
    model: Option<String>,

    /// Disable the hosted web search tool
    #[arg(long)]
    no_search: bool,

    /// System prompt for a fresh session (overrides system_prompt_file)
    #[arg(long)]
    system_prompt: Option<String>,

    /// Run in non-interactive mode with a single prompt
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Resume a saved session by ID
    #[arg(long)]
    resume: Option<String>,

    /// List saved sessions
    #[arg(long)]
    sessions: bool,

    /// Delete a saved session by ID
    #[arg(long)]
    delete_session: Option<String>,

    /// Human-readable name for this session
    #[arg(long)]
    name: Option<String>,

    /// List available chat models
    #[arg(long)]
    models: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Everything the interactive loop needs for one session
struct ChatSession {
    id: String,
    name: Option<String>,
    manager: MemoryManager,
    builder: RequestBuilder,
    last_sources: Vec<String>,
    pending_attachments: Vec<Part>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("parley_cli=debug,parley_chat=debug,parley_ai=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => println!("Config file created at: {}", path.display()),
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let store = SessionStore::new();

    // List sessions and exit
    if args.sessions {
        return list_sessions(&store);
    }

    // Delete a session and exit
    if let Some(id) = args.delete_session {
        store.delete(&id)?;
        println!("Deleted session {}", id);
        return Ok(());
    }

    let cfg = config::Config::load();
    let api_key = cfg
        .api_key()
        .ok_or_else(|| anyhow::anyhow!("No API key: set OPENAI_API_KEY or api_key in config"))?;
    let client = OpenAIClient::new(api_key);

    // List models and exit
    if args.models {
        let models = client.list_chat_models().await?;
        println!("=== {} Chat Models ===", models.len());
        for (n, id) in models.iter().enumerate() {
            println!("{}: {}", n + 1, id);
        }
        return Ok(());
    }

    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let summary_model = cfg.summary_model.clone().unwrap_or_else(|| model.clone());
    let web_search = if args.no_search {
        false
    } else {
        cfg.web_search.unwrap_or(true)
    };
    let memory_config = MemoryConfig {
        max_tokens: cfg.max_tokens.unwrap_or(20_000),
        protected_tail: cfg.protected_tail.unwrap_or(10),
    };

    let system_prompt =
        resolve_system_prompt(args.system_prompt, cfg.system_prompt_file.as_deref())?;

    // Resume or start fresh
    let (id, name, conversation) = match args.resume.as_deref() {
        Some(id) => {
            let record = store.load(id)?;
            println!(
                "Resumed session {} ({} messages)",
                short_id(id),
                record.messages.len()
            );
            (
                id.to_string(),
                record.session_name,
                ConversationStore::from_messages(record.messages),
            )
        }
        None => (
            SessionStore::new_id(),
            args.name.clone(),
            ConversationStore::new(&system_prompt),
        ),
    };

    let mut session = ChatSession {
        id,
        name,
        manager: MemoryManager::new(
            conversation,
            memory_config,
            TokenEstimator::for_model(&model),
            &summary_model,
        ),
        builder: RequestBuilder::new(&model, web_search),
        last_sources: vec![],
        pending_attachments: vec![],
    };

    // Non-interactive mode
    if let Some(command) = args.command {
        let outcome = session
            .manager
            .run_turn(&client, &session.builder, Message::user(command))
            .await?;
        print_outcome(&outcome);
        return Ok(());
    }

    run_interactive(&mut session, &client, &store).await
}

async fn run_interactive(
    session: &mut ChatSession,
    client: &OpenAIClient,
    store: &SessionStore,
) -> anyhow::Result<()> {
    if io::stderr().is_terminal() {
        eprintln!(
            "parley ({}) session: {}",
            session.builder.model(),
            short_id(&session.id)
        );
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        // Handle slash commands
        if let Some(command) = input.strip_prefix('/') {
            let (cmd, arg) = match command.split_once(' ') {
                Some((c, a)) => (c, a.trim()),
                None => (command, ""),
            };
            match cmd {
                "quit" | "exit" => break,
                "help" => print_help(),
                "new" => {
                    save_session(session, store);
                    let system = session
                        .manager
                        .store()
                        .system_text()
                        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
                    session.manager.reset(system);
                    session.id = SessionStore::new_id();
                    session.name = None;
                    session.last_sources.clear();
                    session.pending_attachments.clear();
                    println!("Started a new chat (previous session saved).");
                }
                "save" => {
                    if !arg.is_empty() {
                        session.name = Some(arg.to_string());
                    }
                    save_session(session, store);
                    println!("Saved session {}", short_id(&session.id));
                }
                "sources" => {
                    if session.last_sources.is_empty() {
                        println!("Sources: (none detected)");
                    } else {
                        println!("Sources:");
                        for (i, src) in session.last_sources.iter().enumerate() {
                            println!("  {}. {}", i + 1, src);
                        }
                    }
                }
                "attach" => match attach_file(arg) {
                    Ok(part) => {
                        session.pending_attachments.push(part);
                        println!("Attached {} (sent with your next message).", arg);
                    }
                    Err(e) => eprintln!("Could not attach {}: {}", arg, e),
                },
                "tokens" => {
                    println!(
                        "~{} tokens of {} budgeted",
                        session.manager.estimated_tokens(),
                        session.manager.config().max_tokens
                    );
                }
                other => println!("Unknown command: /{}", other),
            }
            continue;
        }

        let user_message = if session.pending_attachments.is_empty() {
            Message::user(input)
        } else {
            let mut parts = vec![Part::text(input)];
            parts.append(&mut session.pending_attachments);
            Message::user_with_parts(parts)
        };

        match session
            .manager
            .run_turn(client, &session.builder, user_message)
            .await
        {
            Ok(outcome) => {
                session.last_sources = outcome.sources.clone();
                print_outcome(&outcome);
            }
            Err(e) => {
                // The user message stays in the history; resubmitting works.
                eprintln!("Error: {}", e);
                if e.is_auth() {
                    eprintln!("Check your API key and try again.");
                }
            }
        }
    }

    // Autosave on exit
    save_session(session, store);
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    println!("Bot: {}", outcome.reply);
    println!();
    if outcome.used_fallback {
        tracing::info!("reply produced without the web search tool");
    }
    if let Some(compaction) = &outcome.compaction {
        println!(
            "[Compacted {} earlier messages: ~{} -> ~{} tokens]",
            compaction.summarized_messages, compaction.tokens_before, compaction.tokens_after
        );
    }
    if let Some(warning) = &outcome.compaction_warning {
        eprintln!("[Compaction skipped this turn: {}]", warning);
    }
}

fn save_session(session: &ChatSession, store: &SessionStore) {
    let record = SessionRecord::new(
        session.manager.store().snapshot(),
        session.builder.model(),
        session.builder.web_search_enabled(),
        session.name.clone(),
    );
    if let Err(e) = store.save(&session.id, &record) {
        eprintln!("Warning: failed to save session: {}", e);
    }
}

fn list_sessions(store: &SessionStore) -> anyhow::Result<()> {
    let sessions = store.list()?;
    if sessions.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }
    println!("{} saved session(s):", sessions.len());
    for info in sessions {
        println!(
            "  {}  {}  {}  {} messages{}",
            short_id(&info.id),
            info.saved_at_display(),
            info.model,
            info.message_count,
            info.session_name
                .map(|n| format!("  \"{}\"", n))
                .unwrap_or_default()
        );
    }
    Ok(())
}

/// System prompt for a fresh session; the CLI flag wins over the config file
fn resolve_system_prompt(flag: Option<String>, file: Option<&str>) -> io::Result<String> {
    match (flag, file) {
        (Some(prompt), _) => Ok(prompt),
        (None, Some(path)) => std::fs::read_to_string(path),
        (None, None) => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}

/// Short display form of a session id
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

fn attach_file(path: &str) -> io::Result<Part> {
    if path.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "usage: /attach <path>",
        ));
    }
    let bytes = std::fs::read(path)?;
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(Part::image(data, mime_for_path(path)))
}

/// Guess an image mime type from the file extension
fn mime_for_path(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /new           start a new chat (saves the current one)");
    println!("  /save [name]   save the session, optionally naming it");
    println!("  /sources       show URLs cited in the last reply");
    println!("  /attach <path> attach an image to your next message");
    println!("  /tokens        show the estimated history token cost");
    println!("  /quit          save and exit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path("shot.png"), "image/png");
        assert_eq!(mime_for_path("photo.JPG"), "image/jpeg");
        assert_eq!(mime_for_path("pic.jpeg"), "image/jpeg");
        assert_eq!(mime_for_path("anim.gif"), "image/gif");
        assert_eq!(mime_for_path("unknown.bin"), "application/octet-stream");
        assert_eq!(mime_for_path("noextension"), "application/octet-stream");
    }

    #[test]
    fn test_attach_requires_path() {
        assert!(attach_file("").is_err());
    }

    #[test]
    fn test_system_prompt_flag_parses() {
        let args = Args::try_parse_from(["parley", "--system-prompt", "be terse"]).unwrap();
        assert_eq!(args.system_prompt.as_deref(), Some("be terse"));
    }

    #[test]
    fn test_system_prompt_flag_wins_over_file() {
        // The file path is never touched when the flag is set.
        let prompt =
            resolve_system_prompt(Some("be terse".into()), Some("/no/such/file")).unwrap();
        assert_eq!(prompt, "be terse");
    }

    #[test]
    fn test_system_prompt_defaults_without_flag_or_file() {
        let prompt = resolve_system_prompt(None, None).unwrap();
        assert_eq!(prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_short_id_respects_char_boundaries() {
        assert_eq!(short_id("0123456789ab"), "01234567");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("ปารีส-notes"), "ปารีส-no");
    }
}
