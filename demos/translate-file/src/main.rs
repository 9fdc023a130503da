use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use clap::Parser;
use tandem::engine::echo::EchoLoader;
use tandem::{DecodingParams, ServiceConfig, ServiceHandle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Translate a text file, or a few inline sentences, with the echo model.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON settings file; TANDEM_* environment variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model directory, overrides the configured one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Source file, one whitespace-tokenized sentence per line.
    #[arg(long, requires = "output")]
    input: Option<PathBuf>,

    #[arg(long)]
    output: Option<PathBuf>,

    /// Inline sentence; may be repeated. Each one is sent as its own request.
    #[arg(long = "sentence", conflicts_with = "input")]
    sentences: Vec<String>,

    #[arg(long, default_value_t = 1)]
    num_hypotheses: usize,

    #[arg(long)]
    with_scores: bool,

    #[arg(long)]
    attention: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "translation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> tandem::Result<()> {
    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if let Some(model) = args.model {
        config.model_path = model;
    }
    let service = Arc::new(ServiceHandle::from_config(&EchoLoader::default(), &config)?);

    let params = DecodingParams {
        num_hypotheses: args.num_hypotheses,
        with_scores: args.with_scores,
        return_attention: args.attention,
        ..Default::default()
    };

    if let (Some(input), Some(output)) = (args.input, args.output) {
        let lines = service
            .translate_file(&input, &output, config.max_batch_size, params)
            .await?;
        info!(lines, output = %output.display(), "file translated");
    } else {
        let handles = args
            .sentences
            .into_iter()
            .map(|sentence| {
                let service = service.clone();
                let params = params.clone();
                tokio::spawn(async move {
                    let tokens: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();
                    service.translate_batch(vec![tokens], params).await
                })
            })
            .collect::<Vec<_>>();

        for handle in futures::future::join_all(handles).await {
            match handle {
                Ok(result) => match serde_json::to_string(&result?) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(error = %e, "could not serialize result"),
                },
                Err(e) => error!(error = %e, "translation task failed"),
            }
        }
    }

    if let Some(service) = Arc::into_inner(service) {
        service.shutdown().await;
    }
    Ok(())
}
