//! fraudring CLI: generate the demo graph, verify it and walk the scenarios
//!
//! `mem://` runs against an in-process store that lives for one command, so
//! read commands populate it first.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use fraudring::backend::GraphBackend;
use fraudring::view::format_currency;
use fraudring::{
    Catalog, FraudRingError, GeneratorConfig, Generator, GraphQuery, GraphView, QueryResult, StoreConfig, Walkthrough,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fraudring", version, about = "Fraud ring detection demo graph")]
struct Cli {
    /// Store URI: mem:// or http(s)://host:port
    #[arg(long, default_value = "mem://", global = true, env = "FRAUDRING_URI")]
    uri: String,

    #[arg(long, global = true, env = "FRAUDRING_USER")]
    user: Option<String>,

    #[arg(long, global = true, env = "FRAUDRING_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, default_value = "neo4j", global = true, env = "FRAUDRING_DATABASE")]
    database: String,

    /// Seed for background data
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the store and generate every scenario
    Generate {
        /// Number of background claims
        #[arg(long)]
        background_claims: Option<usize>,
    },
    /// Check the generated scenarios against their design counts
    Verify,
    /// Node, relationship and claim counts
    Stats,
    /// Delete every node and relationship
    Clear,
    /// List the walkthroughs
    Scenarios,
    /// Walk through one scenario
    Walk {
        /// Scenario id (1-4)
        scenario: u8,
        /// Show only this step (1-based)
        #[arg(long)]
        step: Option<usize>,
    },
    /// Show the neighborhood of one entity
    Explore {
        /// Entity label, e.g. Provider
        label: String,
        /// Entity id, e.g. PROV_S3_SUNRISE
        id: String,
        #[arg(long, default_value_t = 2)]
        hops: u8,
        /// Keep only these display types
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,
    },
    /// List entities of one label
    Entities {
        /// Entity label; lists labels when omitted
        label: Option<String>,
    },
}

impl Commands {
    /// Commands that read generated data
    fn reads_graph(&self) -> bool {
        !matches!(self, Commands::Generate { .. } | Commands::Clear | Commands::Scenarios)
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = StoreConfig {
        uri: cli.uri.clone(),
        user: cli.user.clone(),
        password: cli.password.clone(),
        database: cli.database.clone(),
    };
    let mut config = GeneratorConfig {
        seed: cli.seed,
        ..GeneratorConfig::default()
    };
    if let Commands::Generate {
        background_claims: Some(claims),
    } = &cli.command
    {
        config.background_claims = *claims;
    }

    if matches!(cli.command, Commands::Scenarios) {
        return run_scenarios(&cli.format);
    }

    let backend = store.connect().await.context("cannot open graph store")?;
    if store.is_embedded() && cli.command.reads_graph() {
        info!("Populating the in-process store");
        Generator::new(backend.clone(), config.clone()).generate_all().await?;
    }

    match &cli.command {
        Commands::Generate { .. } => run_generate(backend, config, &cli.format).await,
        Commands::Verify => run_verify(backend.as_ref(), &cli.format).await,
        Commands::Stats => run_stats(backend.as_ref(), &cli.format).await,
        Commands::Clear => {
            backend.clear().await?;
            println!("Cleared {}", backend.describe());
            Ok(())
        }
        Commands::Scenarios => Ok(()),
        Commands::Walk { scenario, step } => run_walk(backend.as_ref(), *scenario, *step, &cli.format).await,
        Commands::Explore { label, id, hops, types } => {
            run_explore(backend.as_ref(), label, id, *hops, types, &cli.format).await
        }
        Commands::Entities { label } => run_entities(backend.as_ref(), label.as_deref(), &cli.format).await,
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.to_vec());
    table
}

async fn run_generate(backend: Arc<dyn GraphBackend>, config: GeneratorConfig, format: &OutputFormat) -> Result<()> {
    let stats = Generator::new(backend, config).generate_all().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Table => {
            let mut table = new_table(&["Step", "Claims"]);
            for (step, claims) in stats.iter() {
                table.add_row(vec![step.to_string(), claims.to_string()]);
            }
            table.add_row(vec!["total".to_string(), stats.total().to_string()]);
            println!("{}", table);
        }
    }
    Ok(())
}

async fn run_verify(backend: &dyn GraphBackend, format: &OutputFormat) -> Result<()> {
    let catalog = Catalog::load()?;
    let results = fraudring::verify(backend, &catalog).await;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Table => {
            let mut table = new_table(&["Scenario", "Check", "Expected", "Actual", ""]);
            for r in &results {
                table.add_row(vec![
                    r.scenario.clone(),
                    r.check.clone(),
                    r.expected.clone(),
                    r.actual.clone(),
                    if r.passed { "PASS" } else { "FAIL" }.to_string(),
                ]);
            }
            println!("{}", table);
            let passed = results.iter().filter(|r| r.passed).count();
            println!("{}/{} checks passed", passed, results.len());
            if passed < results.len() {
                println!("Regenerate the data with `fraudring generate` to restore the scenarios.");
            }
        }
    }
    Ok(())
}

async fn run_stats(backend: &dyn GraphBackend, format: &OutputFormat) -> Result<()> {
    let stats = backend.stats().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Table => {
            println!("Nodes:         {}", stats.total_nodes);
            println!("Relationships: {}", stats.total_relationships);
            println!("Claims:        {}", stats.claims);
            println!("Fraud claims:  {}", stats.fraud_claims);
        }
    }
    Ok(())
}

fn run_scenarios(format: &OutputFormat) -> Result<()> {
    let catalog = Catalog::load()?;
    if *format == OutputFormat::Json {
        let all: Vec<_> = catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }
    let mut table = new_table(&["Id", "Title", "Starting point", "Steps", "Checks"]);
    for s in catalog.iter() {
        table.add_row(vec![
            s.id.to_string(),
            format!("{}\n{}", s.title, s.subtitle),
            format!("{} {}", s.anchor.label, s.anchor.name),
            s.steps.len().to_string(),
            s.checks.len().to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

async fn run_walk(backend: &dyn GraphBackend, id: u8, only: Option<usize>, format: &OutputFormat) -> Result<()> {
    let catalog = Catalog::load()?;
    let mut walk = catalog.walkthrough(id)?;
    let scenario = walk.scenario();
    let steps = scenario.steps.len();
    if let Some(n) = only {
        if n == 0 || walk.seek(n - 1).is_none() {
            bail!("scenario {} has steps 1..={}", id, steps);
        }
    }

    if *format == OutputFormat::Table {
        println!("== {}: {} ==", scenario.title, scenario.subtitle);
        println!("{}", scenario.trigger.trim());
    }
    loop {
        show_step(backend, &walk, format).await;
        if only.is_some() || walk.next().is_none() {
            break;
        }
    }
    if walk.is_complete() && *format == OutputFormat::Table {
        let c = &scenario.conclusion;
        println!("\n== Investigation summary ==");
        println!("Exposure:          {}", c.exposure);
        println!("Traditional time:  {}", c.traditional_time);
        println!("Graph time:        {}", c.graph_time);
        println!("{}", c.key_finding.trim());
        for item in &c.action_items {
            println!("  - {}", item);
        }
    }
    Ok(())
}

/// Print one step; a failing query is reported and the walk goes on
async fn show_step(backend: &dyn GraphBackend, walk: &Walkthrough<'_>, format: &OutputFormat) {
    let step = walk.current();
    let anchor = &walk.scenario().anchor;
    let result = walk.run(backend).await;
    if *format == OutputFormat::Json {
        let view = result.as_ref().ok().map(|r| GraphView::from_result(r, Some(anchor.id.as_str()), None));
        let error = result.as_ref().err().map(FraudRingError::truncated);
        let out = serde_json::json!({
            "step": walk.position() + 1,
            "title": step.title,
            "view": view,
            "error": error,
        });
        println!("{}", out);
        return;
    }

    println!("\n-- Step {} of {}: {} --", walk.position() + 1, walk.scenario().steps.len(), step.title);
    println!("{}", step.narrative.trim());
    println!("Traditional approach: {}", step.traditional.trim());
    match result {
        Ok(result) => {
            print_view(&GraphView::from_result(&result, Some(anchor.id.as_str()), None));
            if let Some(discovery) = &step.discovery {
                println!("Discovery: {}", discovery.trim());
            }
        }
        Err(e) => eprintln!("Query failed: {}", e.truncated()),
    }
}

fn print_view(view: &GraphView) {
    let mut counts: Vec<(&str, usize)> = view.type_counts().into_iter().collect();
    counts.sort();
    let summary: Vec<String> = counts.iter().map(|(t, n)| format!("{} {}", n, t)).collect();
    println!(
        "{} entities, {} connections, {} flagged: {}",
        view.nodes.len(),
        view.edges.len(),
        view.fraud_count(),
        summary.join(", ")
    );
}

async fn run_explore(
    backend: &dyn GraphBackend,
    label: &str,
    id: &str,
    hops: u8,
    types: &[String],
    format: &OutputFormat,
) -> Result<()> {
    let query = GraphQuery::neighborhood(label, id, hops)?;
    let result = backend.query(&query).await.map_err(|e| anyhow::anyhow!(e.truncated()))?;
    if result.is_empty() {
        bail!("no {} with id {}", label, id);
    }
    let filter: Option<HashSet<String>> = (!types.is_empty()).then(|| types.iter().cloned().collect());
    let view = GraphView::from_result(&result, Some(id), filter.as_ref());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Table => {
            print_view(&view);
            print_nodes(&result, &view);
        }
    }
    Ok(())
}

fn print_nodes(result: &QueryResult, view: &GraphView) {
    let mut table = new_table(&["Type", "Id", "Name", "Amount"]);
    for node in &view.nodes {
        let source = result.node(&node.id);
        let amount = source
            .and_then(|n| n.get("claim_amount"))
            .and_then(|v| v.as_float())
            .map(format_currency)
            .unwrap_or_default();
        table.add_row(vec![
            format!("{}{}", node.display_type, if node.is_fraud { " (fraud)" } else { "" }),
            source.and_then(|n| n.external_id()).unwrap_or_default().to_string(),
            node.label.clone(),
            amount,
        ]);
    }
    println!("{}", table);
}

async fn run_entities(backend: &dyn GraphBackend, label: Option<&str>, format: &OutputFormat) -> Result<()> {
    let Some(label) = label else {
        let labels = backend.labels().await?;
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&labels)?),
            OutputFormat::Table => labels.iter().for_each(|l| println!("{}", l)),
        }
        return Ok(());
    };
    let entities = backend.entities(label).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entities)?),
        OutputFormat::Table => {
            let mut table = new_table(&["Id", "Name"]);
            for e in &entities {
                table.add_row(vec![e.id.clone(), e.display.clone()]);
            }
            println!("{}", table);
            println!("{} {} entities", entities.len(), label);
        }
    }
    Ok(())
}
