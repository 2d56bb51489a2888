//! CLI entry point for the kgraph knowledge graph.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use kgraph_api::request::IdArg;
use kgraph_api::{GraphApi, Response};
use kgraph_core::KgConfig;

#[derive(Parser)]
#[command(name = "kgraph")]
#[command(about = "A small directed knowledge graph with token-gated access")]
struct Cli {
    /// Config file prefix (default: kgraph).
    #[arg(short, long, default_value = "kgraph", global = true)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer JSON request envelopes read line by line from stdin.
    Exec,

    /// Node operations.
    #[command(subcommand)]
    Node(NodeCommand),

    /// Link two nodes.
    Link {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Relationship type, e.g. RELATES_TO or depends-on.
        #[arg(long = "type", default_value = "RELATES_TO")]
        relationship_type: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show a relationship with both endpoints resolved.
    ShowLink { id: String },

    /// Delete a relationship by id.
    Unlink { id: String },

    /// List everything connected to a node, in both directions.
    Connections { id: String },
}

#[derive(Subcommand)]
enum NodeCommand {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Get {
        id: String,
    },
    /// Case-insensitive title substring search.
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = KgConfig::load(&cli.config)?;
    let api = Arc::new(GraphApi::from_config(&config)?);

    match cli.command {
        Command::Exec => run_exec(api).await,
        Command::Node(node) => emit(run_node(&api, node)),
        Command::Link {
            from,
            to,
            relationship_type,
            notes,
        } => emit(
            (|| {
                let from = id_arg(from).node_id()?;
                let to = id_arg(to).node_id()?;
                api.link_nodes(from, to, &relationship_type, notes.as_deref())
            })()
            .into(),
        ),
        Command::ShowLink { id } => emit(
            id_arg(id)
                .relationship_id()
                .and_then(|id| api.get_link(id))
                .into(),
        ),
        Command::Unlink { id } => emit(
            id_arg(id)
                .relationship_id()
                .and_then(|id| api.delete_link(id).map(|()| serde_json::json!({ "deleted": id })))
                .into(),
        ),
        Command::Connections { id } => emit(
            id_arg(id)
                .node_id()
                .and_then(|id| api.connections_for(id))
                .into(),
        ),
    }
}

fn run_node(api: &GraphApi, command: NodeCommand) -> Response {
    match command {
        NodeCommand::Add { title, description } => {
            api.add_node(&title, description.as_deref()).into()
        }
        NodeCommand::Get { id } => id_arg(id).node_id().and_then(|id| api.get_node(id)).into(),
        NodeCommand::Search { query } => api.search_nodes(&query).into(),
        NodeCommand::Delete { id } => id_arg(id)
            .node_id()
            .and_then(|id| api.delete_node(id))
            .into(),
    }
}

/// Read request lines until EOF, answering each on stdout in order.
async fn run_exec(api: Arc<GraphApi>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let api = api.clone();
        let response = tokio::task::spawn_blocking(move || api.handle_line(&line)).await?;

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
        handled += 1;
    }

    tracing::info!(requests = handled, "Input closed");
    Ok(())
}

fn id_arg(raw: String) -> IdArg {
    IdArg::Text(raw)
}

/// Print the response; a failure also becomes a non-zero exit.
fn emit(response: Response) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    match response.error {
        Some(err) => anyhow::bail!("{:?}: {}", err.code, err.message),
        None => Ok(()),
    }
}
