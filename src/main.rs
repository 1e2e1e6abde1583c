use anyhow::{bail, Context, Result};
use callprobe::{
    create_router, AppState, CallRunner, CallServices, ChatOracleFactory, Config,
    ElevenLabsSynthesizer, JsonTranscriptStore, NatsTranscriber, RunnerSettings, ScenarioCatalog,
    SessionRegistry, TwilioClient,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "callprobe", version, about = "Voice QA caller for phone agents")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, global = true, default_value = "config/callprobe")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the webhook and media stream endpoints
    Serve,
    /// Place test calls (all scenarios unless one is named)
    Run {
        #[arg(long)]
        scenario: Option<String>,
    },
    /// List available scenarios
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    let scenarios = Arc::new(ScenarioCatalog::builtin());

    match cli.command {
        Command::List => {
            for scenario in scenarios.all() {
                println!("{:<22} {}", scenario.name, scenario.description);
            }
            Ok(())
        }
        Command::Serve => {
            let services = build_services(&cfg, scenarios).await?;
            serve(&cfg, services).await
        }
        Command::Run { scenario } => run_calls(&cfg, scenarios, scenario).await,
    }
}

async fn build_services(cfg: &Config, scenarios: Arc<ScenarioCatalog>) -> Result<CallServices> {
    let transcriber = NatsTranscriber::connect(&cfg.transcription.nats_url)
        .await
        .context("Failed to connect to NATS")?;

    Ok(CallServices {
        transcriber: Arc::new(transcriber),
        oracles: Arc::new(ChatOracleFactory::new(cfg.dialogue.clone())?),
        synthesizer: Arc::new(ElevenLabsSynthesizer::new(cfg.synthesis.clone())?),
        store: Arc::new(JsonTranscriptStore::new(&cfg.transcripts.output_dir)),
        registry: Arc::new(SessionRegistry::new()),
        scenarios,
        config: cfg.session.to_session_config(),
    })
}

async fn serve(cfg: &Config, services: CallServices) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let router = create_router(AppState::new(services, &cfg.service.public_host));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("{} listening on {}", cfg.service.name, addr);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn run_calls(
    cfg: &Config,
    scenarios: Arc<ScenarioCatalog>,
    only: Option<String>,
) -> Result<()> {
    let missing = cfg.missing_credentials();
    if !missing.is_empty() {
        bail!("Missing required settings: {}", missing.join(", "));
    }

    let names = match only {
        Some(name) if scenarios.contains(&name) => vec![name],
        Some(name) => bail!(
            "Unknown scenario '{}'. Available: {}",
            name,
            scenarios.names().join(", ")
        ),
        None => scenarios.names(),
    };

    let services = build_services(cfg, scenarios).await?;
    let registry = Arc::clone(&services.registry);

    let server_cfg = cfg.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = serve(&server_cfg, services).await {
            error!("HTTP server failed: {:#}", e);
        }
    });

    let placer = TwilioClient::new(cfg.telephony.clone(), &cfg.service.public_host)?;
    let runner = CallRunner::new(
        Arc::new(placer),
        registry,
        RunnerSettings::from(&cfg.telephony),
    );

    let results = runner.run_all(&names).await;
    for result in &results {
        info!(
            "{}: call {} ({})",
            result.scenario,
            result.call_sid,
            if result.completed { "completed" } else { "timed out" }
        );
    }
    info!("Transcripts saved to {}", cfg.transcripts.output_dir);

    server.abort();
    Ok(())
}
