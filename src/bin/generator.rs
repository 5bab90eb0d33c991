use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use parallel_rmat_graph_generator::config::{self, Params};
use tracing_subscriber::EnvFilter;

/// Generate large R-MAT graphs in parallel under a bounded memory budget.
///
/// The output is a text file with one `src<TAB>dst` edge per line, in
/// arbitrary order by default or sorted on the source index with --sorted.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of edges to generate
    #[arg(long = "nEdges")]
    n_edges: u64,

    /// Number of vertices in the graph
    #[arg(long = "nVertices")]
    n_vertices: u64,

    /// Output file path
    #[arg(long, default_value = "out.txt")]
    output: PathBuf,

    /// R-MAT a parameter
    #[arg(long, default_value_t = 0.45)]
    a: f64,

    /// R-MAT b parameter
    #[arg(long, default_value_t = 0.22)]
    b: f64,

    /// R-MAT c parameter
    #[arg(long, default_value_t = 0.22)]
    c: f64,

    /// Number of worker threads (default: hardware threads minus one)
    #[arg(long)]
    threads: Option<usize>,

    /// Sort the output on the source vertex index
    #[arg(long)]
    sorted: bool,

    /// Fraction of physical RAM the generator may use
    #[arg(long = "memUsage", default_value_t = 0.5)]
    mem_usage: f64,

    /// Disallow edges whose endpoints coincide
    #[arg(long = "noEdgeToSelf")]
    no_edge_to_self: bool,

    /// Disallow duplicate edges
    #[arg(long = "noDuplicateEdges")]
    no_duplicate_edges: bool,

    /// Generate an undirected graph (lower triangle plus diagonal only)
    #[arg(long)]
    undirected: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let cfg = Params {
        n_edges: args.n_edges,
        n_vertices: args.n_vertices,
        a: args.a,
        b: args.b,
        c: args.c,
        threads: args.threads,
        sorted: args.sorted,
        ram_portion: args.mem_usage,
        allow_self_loops: !args.no_edge_to_self,
        allow_duplicate_edges: !args.no_duplicate_edges,
        directed: !args.undirected,
    }
    .validate(config::total_system_memory())
    .context("invalid command line arguments")?;

    println!(
        "Requested graph will have {} edges and {} vertices.",
        cfg.n_edges, cfg.n_vertices
    );
    println!(
        "Its a, b, and c parameters will be respectively {}, {}, and {}.",
        cfg.a, cfg.b, cfg.c
    );
    println!(
        "There can be up to {} worker thread(s) making the graph.",
        cfg.threads
    );
    println!(
        "The graph will{}necessarily be sorted.",
        if cfg.sorted { " " } else { " NOT " }
    );
    println!(
        "Up to about {} percent of RAM can be used by this program.",
        cfg.ram_portion * 100.0
    );
    println!(
        "Specified graph may{}contain edges that have the same source and destination index.",
        if cfg.allow_self_loops { " " } else { " NOT " }
    );
    println!(
        "Specified graph may{}contain duplicate edges.",
        if cfg.allow_duplicate_edges { " " } else { " NOT " }
    );
    println!(
        "Specified graph will be {}.",
        if cfg.directed { "DIRECTED" } else { "UNDIRECTED" }
    );
    println!("Each thread capacity is {} edges.", cfg.standard_capacity);

    let out = File::create(&args.output)
        .with_context(|| format!("failed to open {} for writing", args.output.display()))?;

    parallel_rmat_graph_generator::generate(&cfg, out).context("graph generation failed")?;

    println!("Done.");
    Ok(())
}
