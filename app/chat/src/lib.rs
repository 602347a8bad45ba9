pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use retail_advisor::chat::{engine::example_question, MessageRole};
use retail_advisor::{
    AdvisorConfig, ChatEngine, Domain, DomainResponder, OllamaClient, Responder, Supervisor,
    ABOUT_TEXT, EXAMPLE_QUESTIONS,
};

use commands::Command;

const TITLE: &str = "🛍️ Retail Decision Support System";

#[derive(Debug, Parser)]
#[command(name = "retail-advisor-chat", version, about = "Ask about demand, inventory, or pricing")]
pub struct Args {
    /// JSON config file; defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the domain CSV datasets
    #[arg(long)]
    pub datasets: Option<PathBuf>,

    /// Directory where vector indexes are stored
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Ollama server URL
    #[arg(long)]
    pub ollama: Option<String>,

    /// Re-index every dataset even if an index exists
    #[arg(long)]
    pub rebuild: bool,

    /// Talk to a single responder (demand, inventory or pricing)
    #[arg(long)]
    pub agent: Option<Domain>,
}

impl Args {
    pub fn load_config(&self) -> Result<AdvisorConfig> {
        let mut config = match &self.config {
            Some(path) => AdvisorConfig::from_file(path)?,
            None => AdvisorConfig::default(),
        };

        if let Some(dir) = &self.datasets {
            config.datasets_dir = dir.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(endpoint) = &self.ollama {
            config.ollama.endpoint = endpoint.clone();
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// What the binary runs once initialization succeeds.
pub enum Session {
    Chat(ChatEngine),
    Standalone(DomainResponder),
}

pub async fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let session = match initialize(&args).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Error initializing system: {:#}", e);
            std::process::exit(1);
        }
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = std::io::stdout();
    let result = match session {
        Session::Chat(engine) => chat_loop(engine, &mut lines, &mut out).await,
        Session::Standalone(responder) => standalone_loop(&responder, &mut lines, &mut out).await,
    };
    if let Err(e) = result {
        tracing::error!("Session ended with an error: {:#}", e);
        std::process::exit(1);
    }
}

pub async fn initialize(args: &Args) -> Result<Session> {
    let config = args.load_config()?;
    tracing::info!(
        datasets = %config.datasets_dir.display(),
        data_dir = %config.data_dir.display(),
        endpoint = %config.ollama.endpoint,
        "Configuration loaded"
    );

    let status = OllamaClient::from_config(&config.ollama)?.status().await;
    if status.available {
        tracing::info!(version = ?status.version, "Ollama is reachable");
    } else {
        tracing::warn!(
            endpoint = %status.endpoint,
            reason = status.message.as_deref().unwrap_or("unknown"),
            "Ollama is not reachable; requests will fail until it is started"
        );
    }

    match args.agent {
        Some(domain) => {
            let responder = DomainResponder::from_config(domain, &config, args.rebuild).await?;
            tracing::info!(domain = %domain, vectors = responder.vector_count(), "Responder ready");
            Ok(Session::Standalone(responder))
        }
        None => {
            tracing::info!("Initializing system");
            let supervisor = Supervisor::from_config(&config, args.rebuild).await?;
            tracing::info!("System initialized");
            Ok(Session::Chat(ChatEngine::new(supervisor)))
        }
    }
}

/// Next input line. End of input and unreadable input both end the session;
/// the latter is logged.
async fn read_line<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> Option<String> {
    match lines.next_line().await {
        Ok(line) => line,
        Err(e) => {
            tracing::error!("Failed to read input: {}", e);
            None
        }
    }
}

fn prompt(out: &mut impl Write, text: &str) -> Result<()> {
    write!(out, "{}", text)?;
    out.flush()?;
    Ok(())
}

fn print_examples(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Example questions:")?;
    for (i, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, question)?;
    }
    Ok(())
}

fn print_history(out: &mut impl Write, engine: &ChatEngine) -> Result<()> {
    if engine.session().is_empty() {
        writeln!(out, "(no messages yet)")?;
        return Ok(());
    }
    for message in engine.session().messages() {
        let who = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        };
        writeln!(out, "[{}] {}\n{}\n", message.timestamp, who, message.content)?;
    }
    Ok(())
}

fn report(out: &mut impl Write, answer: Result<String>) -> Result<()> {
    match answer {
        Ok(answer) => writeln!(out, "\n{}\n", answer)?,
        Err(e) => {
            tracing::error!("Failed to answer question: {:#}", e);
            writeln!(out, "Sorry, something went wrong: {}\n", e)?;
        }
    }
    Ok(())
}

pub async fn chat_loop<R: AsyncBufRead + Unpin>(
    mut engine: ChatEngine,
    lines: &mut Lines<R>,
    out: &mut impl Write,
) -> Result<()> {
    writeln!(out, "{}\n", TITLE)?;
    writeln!(out, "{}\n", ABOUT_TEXT)?;
    writeln!(out, "Type /examples for sample questions, /history for the transcript, exit to quit.\n")?;

    loop {
        prompt(out, "Ask about demand, inventory, or pricing: ")?;
        let Some(line) = read_line(lines).await else {
            break;
        };

        match commands::parse(&line) {
            Command::Exit => break,
            Command::Empty => continue,
            Command::Examples => print_examples(out)?,
            Command::About => writeln!(out, "{}\n", ABOUT_TEXT)?,
            Command::History => print_history(out, &engine)?,
            Command::Example(n) => {
                if let Some(question) = example_question(n) {
                    writeln!(out, "> {}\nProcessing your query...", question)?;
                }
                let answer = engine.ask_example(n).await;
                report(out, answer)?;
            }
            Command::Invalid(message) => writeln!(out, "{}", message)?,
            Command::Ask(question) => {
                writeln!(out, "Processing your query...")?;
                let answer = engine.ask(&question).await;
                report(out, answer)?;
            }
        }
    }

    writeln!(out, "Goodbye!")?;
    Ok(())
}

pub async fn standalone_loop<R: AsyncBufRead + Unpin>(
    responder: &dyn Responder,
    lines: &mut Lines<R>,
    out: &mut impl Write,
) -> Result<()> {
    let domain = responder.domain();
    loop {
        prompt(out, domain.standalone_prompt())?;
        let Some(line) = read_line(lines).await else {
            break;
        };
        let question = line.trim();
        if commands::is_exit(question) {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match responder.answer(question).await {
            Ok(answer) => writeln!(out, "\n{}\n", answer)?,
            Err(e) => tracing::error!(domain = %domain, "Failed to answer question: {:#}", e),
        }
    }

    writeln!(out, "Exiting. Goodbye!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use retail_advisor::rag::with_response_header;
    use retail_advisor::{GenerationConfig, LLMProvider, ProviderInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StaticLlm(&'static str);

    #[async_trait]
    impl LLMProvider for StaticLlm {
        async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "static".to_string(),
                model: "static".to_string(),
                endpoint: String::new(),
                is_local: true,
            }
        }

        async fn is_ready(&self) -> bool {
            true
        }
    }

    struct CountingResponder {
        domain: Domain,
        calls: AtomicUsize,
    }

    impl CountingResponder {
        fn new(domain: Domain) -> Arc<Self> {
            Arc::new(Self {
                domain,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Responder for CountingResponder {
        fn domain(&self) -> Domain {
            self.domain
        }

        async fn answer(&self, question: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(with_response_header(self.domain, &format!("Answer to {}", question)))
        }
    }

    fn input(bytes: &'static [u8]) -> Lines<BufReader<&'static [u8]>> {
        BufReader::new(bytes).lines()
    }

    #[tokio::test]
    async fn test_unreadable_input_ends_session() {
        let mut lines = input(b"first\n\xff\xfe\nsecond\n");
        assert_eq!(read_line(&mut lines).await.as_deref(), Some("first"));
        assert_eq!(read_line(&mut lines).await, None);
    }

    #[tokio::test]
    async fn test_standalone_answers_then_says_goodbye() {
        let responder = CountingResponder::new(Domain::PriceOptimization);
        let mut lines = input(b"Should we discount winter coats?\n\n  \nQUIT\nignored\n");
        let mut out = Vec::new();

        standalone_loop(responder.as_ref(), &mut lines, &mut out).await.unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(responder.calls.load(Ordering::SeqCst), 1);
        assert!(printed.contains("💰 Pricing Optimization Response:\n\nAnswer to Should we discount winter coats?"));
        assert!(printed.starts_with("Ask about pricing strategy: "));
        assert!(printed.ends_with("Exiting. Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_standalone_says_goodbye_at_end_of_input() {
        let responder = CountingResponder::new(Domain::DemandForecasting);
        let mut out = Vec::new();
        standalone_loop(responder.as_ref(), &mut input(b""), &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("Exiting. Goodbye!\n"));
    }

    #[tokio::test]
    async fn test_chat_example_command_asks_through_engine() {
        let inventory = CountingResponder::new(Domain::InventoryMonitoring);
        let supervisor = Supervisor::new(Arc::new(StaticLlm("Inventory Monitoring")), GenerationConfig::default())
            .with_responder(inventory.clone());
        let engine = ChatEngine::new(supervisor);
        let mut out = Vec::new();

        chat_loop(engine, &mut input(b"/example 2\n/example 9\n/history\nexit\n"), &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(inventory.calls.load(Ordering::SeqCst), 1);
        assert!(printed.contains(&format!("> {}", EXAMPLE_QUESTIONS[1])));
        assert!(printed.contains("### 📦 Inventory Monitoring"));
        assert!(printed.contains("No example question 9"));
        assert!(printed.contains("] you\n"));
        assert!(printed.ends_with("Goodbye!\n"));
    }

    #[test]
    fn test_cli_overrides_apply() {
        let args = Args::parse_from([
            "retail-advisor-chat",
            "--datasets",
            "/srv/retail/csv",
            "--data-dir",
            "/srv/retail/indexes",
            "--ollama",
            "http://gpu-box:11434",
            "--rebuild",
        ]);
        assert!(args.rebuild);
        assert!(args.agent.is_none());

        let config = args.load_config().unwrap();
        assert_eq!(config.datasets_dir, PathBuf::from("/srv/retail/csv"));
        assert_eq!(config.data_dir, PathBuf::from("/srv/retail/indexes"));
        assert_eq!(config.ollama.endpoint, "http://gpu-box:11434");
    }

    #[test]
    fn test_agent_flag_parses_domain() {
        let args = Args::parse_from(["retail-advisor-chat", "--agent", "inventory"]);
        assert_eq!(args.agent, Some(Domain::InventoryMonitoring));

        assert!(Args::try_parse_from(["retail-advisor-chat", "--agent", "marketing"]).is_err());
    }

    #[test]
    fn test_empty_endpoint_override_is_rejected() {
        let args = Args::parse_from(["retail-advisor-chat", "--ollama", " "]);
        assert!(args.load_config().is_err());
    }
}
