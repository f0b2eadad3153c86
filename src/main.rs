use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;

use kinetic_flow::adk::model::gateway::{pricing_from_models, GatewayClient};
use kinetic_flow::adk::model::generator_from_config;
use kinetic_flow::flow::config::FlowConfig;
use kinetic_flow::flow::engine::{NodeExecutionLog, NodeExecutionStatus};
use kinetic_flow::flow::loader::GraphLoader;
use kinetic_flow::flow::server;
use kinetic_flow::flow::session::FlowSession;
use kinetic_flow::flow::templates::{find_template, templates};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a flow graph file
    Run {
        /// Path to the graph file (JSON or YAML)
        #[arg(short, long)]
        file: PathBuf,

        /// Only run this node with its upstream and downstream nodes
        #[arg(short, long)]
        start: Option<String>,

        /// Write the graph, with outputs filled in, back to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remote execute endpoint, overrides FLOW_EXECUTE_URL
        #[arg(long)]
        execute_url: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        /// Port to listen on, overrides FLOW_SERVER_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List built-in templates, or print one as JSON
    Templates {
        /// Template id to print
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();
    let mut config = FlowConfig::from_env()?;

    match args.command {
        Commands::Run {
            file,
            start,
            output,
            execute_url,
        } => {
            env_logger::init();
            if execute_url.is_some() {
                config.execute_url = execute_url;
            }

            let loader = GraphLoader::new();
            let graph = loader
                .load_graph(&file)
                .with_context(|| format!("failed to load graph from {:?}", file))?;

            let generator = generator_from_config(&config)?;
            let mut session = FlowSession::new(graph, generator);

            match GatewayClient::from_config(&config) {
                Ok(gateway) => match gateway.list_models().await {
                    Ok(models) => session.set_pricing(Some(pricing_from_models(&models))),
                    Err(e) => log::warn!("Failed to load model pricing: {}", e),
                },
                Err(_) => log::info!("No gateway key configured, costs will be omitted"),
            }

            let on_log_update = |logs: Vec<NodeExecutionLog>| {
                if let Some(entry) = logs.last().filter(|l| l.status.is_terminal()) {
                    print_log(entry);
                }
            };

            let run = match start.as_deref() {
                Some(node_id) => session.run_from(node_id, on_log_update).await,
                None => session.run(on_log_update).await,
            };

            println!(
                "Run {} {:?} in {}ms",
                run.id,
                run.status,
                run.total_duration_ms.unwrap_or_default()
            );
            if let (Some(input), Some(output)) = (run.total_input_tokens, run.total_output_tokens) {
                println!("Tokens: {} in / {} out", input, output);
            }
            if let Some(cost) = run.total_cost_usd.filter(|c| *c > 0.0) {
                println!("Cost: ${:.6}", cost);
            }

            if let Some(path) = output {
                loader
                    .save_graph(&path, session.graph())
                    .with_context(|| format!("failed to write graph to {:?}", path))?;
                println!("Wrote graph to {:?}", path);
            }

            if run.has_errors() {
                anyhow::bail!("run {} finished with errors", run.id);
            }
        }
        Commands::Serve { port } => {
            tracing_subscriber::fmt::init();
            if let Some(port) = port {
                config.server_port = port;
            }
            server::serve(&config).await?;
        }
        Commands::Templates { id } => {
            env_logger::init();
            match id {
                Some(id) => {
                    let template = find_template(&id)
                        .with_context(|| format!("unknown template: {}", id))?;
                    println!("{}", serde_json::to_string_pretty(template)?);
                }
                None => {
                    for template in templates() {
                        println!("{:<20} {}", template.id, template.description);
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_log(entry: &NodeExecutionLog) {
    match entry.status {
        NodeExecutionStatus::Error => println!(
            "[{}] {} failed: {}",
            entry.node_type,
            entry.node_label,
            entry.error.as_deref().unwrap_or("unknown error")
        ),
        _ => println!(
            "[{}] {} ({}ms): {}",
            entry.node_type,
            entry.node_label,
            entry.duration_ms.unwrap_or_default(),
            entry.output.as_deref().unwrap_or("")
        ),
    }
}
