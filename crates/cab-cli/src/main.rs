use anyhow::{Context, Result, bail};
use cab_client::{CabSession, ClientConfig, HttpBackend, decode_response, parse_page_query};
use cab_core::{ActionTree, ComplexActionQuery, Scalar, TreeSchema, build_tree};
use cab_view::{TreeView, ViewConfig};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::{Path, PathBuf};
use url::Url;

/// Far enough past every transition that the frame is settled.
const SETTLED_MS: f64 = 1e9;

#[derive(Parser)]
#[command(name = "cab")]
#[command(about = "Complex Action Browser: fetch and render train-number and complex-action trees")]
struct Cli {
    /// CAB server root
    #[arg(long, env = "CAB_SERVER_URL", default_value = "http://127.0.0.1:8000/", global = true)]
    server: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a saved server response to SVG
    Render {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "train-number")]
        schema: Schema,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Upload a database and list its train numbers
    Trains {
        #[arg(long)]
        db: PathBuf,
    },
    /// Upload a database and render the actions of one train number
    Actions {
        #[arg(long)]
        db: PathBuf,

        /// Picker label (`'IR 2318' (Id=4711)`) or bare train number id
        train_number: String,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Upload a database and render one complex action
    Complex {
        #[arg(long)]
        db: PathBuf,

        /// Complex-action page URL to take the action from
        #[arg(long, conflicts_with_all = ["action_id", "action_type"])]
        page: Option<Url>,

        #[arg(long)]
        action_id: Option<i64>,
        #[arg(long)]
        action_list_id: Option<i64>,
        #[arg(long)]
        action_detail_id: Option<i64>,
        #[arg(long)]
        action_type: Option<String>,
        #[arg(long)]
        media_type: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Schema {
    TrainNumber,
    ComplexAction,
}

impl From<Schema> for TreeSchema {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::TrainNumber => TreeSchema::TrainNumber,
            Schema::ComplexAction => TreeSchema::ComplexAction,
        }
    }
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Collapse every node at or below this depth
    #[arg(long)]
    collapse_depth: Option<usize>,

    /// Write the SVG here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClientConfig {
        base_url: cli.server,
        timeout_secs: cli.timeout,
    };

    match cli.command {
        Commands::Render {
            file,
            schema,
            output,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let value: Value = decode_response("render", &text)?;
            let tree = build_tree(&value, schema.into())?;
            write_svg(&render_settled(tree, output.collapse_depth), output.output.as_deref())
        }
        Commands::Trains { db } => {
            let mut session = connect(&config, &db)?;
            let catalog = upload(&mut session, &db).await?;
            for label in catalog.labels() {
                println!("{label}");
            }
            Ok(())
        }
        Commands::Actions {
            db,
            train_number,
            output,
        } => {
            let mut session = connect(&config, &db)?;
            upload(&mut session, &db).await?;
            let tree = match train_number.parse::<i64>() {
                Ok(id) => session.load_actions(&Scalar::Int(id)).await?,
                Err(_) => session.select_train_number(&train_number).await?,
            };
            write_svg(&render_settled(tree, output.collapse_depth), output.output.as_deref())
        }
        Commands::Complex {
            db,
            page,
            action_id,
            action_list_id,
            action_detail_id,
            action_type,
            media_type,
            output,
        } => {
            let query = match page {
                Some(url) => parse_page_query(&url),
                None => ComplexActionQuery {
                    action_id: action_id.map(Scalar::Int),
                    action_list_id: action_list_id.map(Scalar::Int),
                    action_detail_id: action_detail_id.map(Scalar::Int),
                    action_type,
                    media_type,
                },
            };
            if query.action_id.is_none() {
                bail!("an action id is required (--action-id or --page)");
            }
            let mut session = connect(&config, &db)?;
            upload(&mut session, &db).await?;
            let tree = session.load_complex_action(&query).await?;
            write_svg(&render_settled(tree, output.collapse_depth), output.output.as_deref())
        }
    }
}

fn connect(config: &ClientConfig, db: &Path) -> Result<CabSession<HttpBackend>> {
    log::debug!("connecting to {} for {}", config.base_url, db.display());
    let backend = HttpBackend::new(config)
        .with_context(|| format!("cannot reach {}", config.base_url))?;
    Ok(CabSession::new(backend))
}

async fn upload<'s>(
    session: &'s mut CabSession<HttpBackend>,
    db: &Path,
) -> Result<&'s cab_core::Catalog> {
    let bytes = std::fs::read(db).with_context(|| format!("cannot read {}", db.display()))?;
    let file_name = db
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cab.db".to_string());
    Ok(session.upload_db(&file_name, bytes).await?)
}

/// Lay the tree out and render the frame after every transition has finished.
fn render_settled(tree: ActionTree, collapse_depth: Option<usize>) -> String {
    let config = ViewConfig::for_schema(tree.schema);
    let mut view = TreeView::new(tree, config, 0.0);
    if let Some(depth) = collapse_depth {
        view.collapse_to_depth(depth, 0.0);
    }
    view.tick(SETTLED_MS);
    view.render_svg(SETTLED_MS)
}

fn write_svg(svg: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, svg).with_context(|| format!("cannot write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        None => println!("{svg}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    const COMPLEX: &str = include_str!("../../cab-core/tests/fixtures/complex_action.json");

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "cab",
            "render",
            "tree.json",
            "--schema",
            "complex-action",
            "--collapse-depth",
            "2",
        ])
        .unwrap();
        let Commands::Render { schema, output, .. } = cli.command else {
            panic!("expected render");
        };
        assert!(matches!(schema, Schema::ComplexAction));
        assert_eq!(output.collapse_depth, Some(2));
    }

    #[test]
    fn settled_render_drops_collapsed_nodes() {
        let value: Value = serde_json::from_str(COMPLEX).unwrap();
        let tree = build_tree(&value, TreeSchema::ComplexAction).unwrap();
        let total = tree.len();

        let boxes = |svg: &str| svg.matches("transform=\"translate(").count();

        let full = render_settled(tree.clone(), None);
        assert_eq!(boxes(&full), total);

        // Root plus its two direct children.
        let collapsed = render_settled(tree, Some(1));
        assert_eq!(boxes(&collapsed), 3);
        assert!(!collapsed.contains("node exiting"));
    }
}
