use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::time::Instant;

use absent_seq::io::output::SequenceWriter;
use absent_seq::reference::{self, PackMeta, ReferencePack, PACK_EXT};
use absent_seq::search::{AbsenceSearch, SearchOpt, SearchPhase, SeededGenerator, WindowScorer};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "absent-seq",
    author,
    version,
    about = "Find random nucleotide sequences absent from a reference genome",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for sequences whose homology to every reference stays at or below the threshold
    Search {
        /// Reference FASTA file, or a .refs pack built with `pack`
        reference: String,
        /// Number of absent sequences to find
        #[arg(short = 'n', long = "count")]
        count: usize,
        /// Candidate length in bases (more than 12 recommended)
        #[arg(short = 'l', long = "length")]
        length: usize,
        /// Seed for candidate generation
        #[arg(short = 's', long = "seed", default_value_t = 0)]
        seed: u64,
        /// Maximum homology percentage (0-100); candidates strictly above it are rejected
        #[arg(short = 'p', long = "threshold")]
        threshold: f64,
        /// Drop references whose label contains this text (repeatable), e.g. mitochondrion
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
        /// Output path for absent sequences ("-" for stdout)
        #[arg(short, long, default_value = "absent_sequences.txt")]
        out: String,
        #[arg(short = 't', long = "threads", default_value_t = 1)]
        threads: usize,
        /// Give up after this many candidates
        #[arg(long = "max-attempts")]
        max_attempts: Option<u64>,
        /// Report the best homology against each reference for every candidate
        #[arg(short, long)]
        verbose: bool,
    },
    /// Parse a reference FASTA once and save it as a binary pack
    Pack {
        /// Reference FASTA file
        reference: String,
        /// Output prefix; the pack is written to <prefix>.refs
        #[arg(short, long, default_value = "ref")]
        output: String,
        /// Drop references whose label contains this text (repeatable)
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Search {
            reference,
            count,
            length,
            seed,
            threshold,
            exclude,
            out,
            threads,
            max_attempts,
            verbose,
        } => {
            let opt = SearchOpt {
                count,
                length,
                seed,
                threshold,
                threads,
                max_attempts,
                verbose,
            };
            run_search(&reference, &exclude, &out, &opt)
        }
        Commands::Pack { reference, output, exclude } => run_pack(&reference, &output, &exclude),
    }
}

fn run_search(reference_path: &str, exclude: &[String], out_path: &str, opt: &SearchOpt) -> Result<()> {
    opt.validate()?;

    let start = Instant::now();
    let store = reference::load_reference(reference_path, exclude)?;
    let stats = store.stats();
    log::info!(
        "reference: {} ({} sequences, {} bp, shortest {} bp)",
        reference_path,
        stats.n_seqs,
        stats.total_len,
        stats.min_len
    );
    log::info!("time taken to load genome into memory: {} ms", start.elapsed().as_millis());

    let mut writer = SequenceWriter::create(out_path)?;
    let generator = SeededGenerator::new(opt.seed);
    log::info!(
        "searching {} x {} bp at <= {}% homology, seed {}",
        opt.count,
        opt.length,
        opt.threshold,
        generator.seed()
    );
    let search = AbsenceSearch::new(&store, generator, WindowScorer, opt)?;
    let report = search.run(|q| writer.write_sequence(q))?;
    let written = writer.finish()?;

    log::info!(
        "found {}/{} absent sequences in {} attempts ({} rejected), written to {}",
        written,
        opt.count,
        report.attempts,
        report.rejected,
        out_path
    );
    log::info!("time taken to find absent sequences: {} ms", report.elapsed.as_millis());

    if report.phase == SearchPhase::Exhausted {
        anyhow::bail!(
            "only {} of {} absent sequences found within {} attempts",
            written,
            opt.count,
            report.attempts
        );
    }
    Ok(())
}

fn run_pack(reference_path: &str, output: &str, exclude: &[String]) -> Result<()> {
    let store = reference::load_reference(reference_path, exclude)?;
    let stats = store.stats();
    if stats.n_seqs == 0 {
        anyhow::bail!("FASTA file '{}' contains no usable sequences", reference_path);
    }
    log::info!("sequences: {}, total_len: {}", stats.n_seqs, stats.total_len);

    let meta = PackMeta {
        source_file: Some(reference_path.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        excluded: exclude.to_vec(),
    };
    let out_path = format!("{}.{}", output, PACK_EXT);
    ReferencePack::new(store, meta).save_to_file(&out_path)?;
    log::info!("reference pack saved: {}", out_path);
    Ok(())
}
