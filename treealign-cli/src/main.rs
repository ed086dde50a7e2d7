use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use treealign::{generate_folds, normalize_corpus, validate_alignment, Config, FoldInputs, Side};
use treealign_tiger::ParallelCorpus;

/// Parallel treebank tools: cross-validation folds, alignment validation
/// and node-id normalization.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (missing file means defaults)
    #[arg(short, long, value_name = "FILE", default_value = "treealign.toml", global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split an aligned corpus into k train/test copies
    Folds {
        /// STA-XML alignment file
        #[arg(short, long, value_name = "FILE")]
        align: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        outdir: PathBuf,

        /// Number of folds
        #[arg(short = 'k', long)]
        folds: Option<usize>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,

        /// Keep alignment order instead of shuffling
        #[arg(long)]
        noshuffle: bool,

        /// Skip the sentence order check of every output treebank
        #[arg(long)]
        no_verify: bool,

        /// Do not write train_folds.txt / test_folds.txt
        #[arg(long)]
        no_listings: bool,
    },

    /// Check that referenced treebanks exist and every aligned node resolves
    Validate {
        /// STA-XML alignment file
        #[arg(short, long, value_name = "FILE")]
        align: PathBuf,

        /// Source treebank (default: as referenced by the alignment)
        #[arg(long, value_name = "FILE")]
        source: Option<PathBuf>,

        /// Target treebank (default: as referenced by the alignment)
        #[arg(long, value_name = "FILE")]
        target: Option<PathBuf>,
    },

    /// Repair non-canonical node ids and write `<stem>_normalized.xml` files
    Normalize {
        /// STA-XML alignment file
        #[arg(short, long, value_name = "FILE")]
        align: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        outdir: PathBuf,

        /// Renumber sentences with leading zeros starting at this number
        #[arg(long, value_name = "N")]
        renumber_from: Option<u64>,

        /// Only renumber, leave node ids inside sentences as they are
        #[arg(long)]
        no_reconcile: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn load_corpus(
    align: &Path,
    source: Option<&Path>,
    target: Option<&Path>,
) -> anyhow::Result<ParallelCorpus> {
    ParallelCorpus::load_with(align, source, target)
        .with_context(|| format!("failed to load parallel treebank from {}", align.display()))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Folds {
            align,
            outdir,
            folds,
            seed,
            noshuffle,
            no_verify,
            no_listings,
        } => {
            if let Some(folds) = folds {
                config.folds.count = folds;
            }
            if seed.is_some() {
                config.folds.seed = seed;
            }
            config.folds.shuffle &= !noshuffle;
            config.folds.verify_positions &= !no_verify;
            config.folds.write_listings &= !no_listings;

            let corpus = load_corpus(&align, None, None)?;
            let stems = corpus.stems();
            let inputs = FoldInputs {
                source: &corpus.source.treebank,
                target: &corpus.target.treebank,
                alignment: &corpus.alignment.alignment,
                stems: &stems,
            };

            let seed = match config.folds.seed {
                Some(seed) => seed,
                None => {
                    let seed = rand::thread_rng().gen();
                    if config.folds.shuffle {
                        info!(seed, "no seed configured, drew one (pass --seed to reproduce)");
                    }
                    seed
                }
            };
            let mut rng = StdRng::seed_from_u64(seed);

            let run = generate_folds(inputs, &config.folds, &mut rng)
                .context("failed to generate folds")?;
            println!(
                "{} sentence pairs ({} source / {} target sentences, {} alignments) in {} folds",
                run.pairs.len(),
                run.pairs.source_count,
                run.pairs.target_count,
                run.pairs.total_rows(),
                run.copies.len()
            );

            let written = corpus
                .write_folds(&run, &outdir, config.folds.write_listings)
                .with_context(|| format!("failed to write folds to {}", outdir.display()))?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate {
            align,
            source,
            target,
        } => {
            let corpus = load_corpus(&align, source.as_deref(), target.as_deref())?;
            for side in Side::BOTH {
                let census = corpus.document(side).treebank.census();
                if !census.duplicate_ids.is_empty() {
                    warn!(%side, duplicates = ?census.duplicate_ids, "duplicate sentence ids");
                }
                if !census.mixed_id_sentences.is_empty() {
                    warn!(%side, sentences = ?census.mixed_id_sentences, "sentences with non-canonical node ids (run `treealign normalize`)");
                }
            }

            let report = validate_alignment(
                &corpus.alignment.alignment,
                &corpus.source.treebank,
                &corpus.target.treebank,
            );
            eprint!("{}", report.render());
            Ok(ExitCode::from(report.exit_code() as u8))
        }

        Commands::Normalize {
            align,
            outdir,
            renumber_from,
            no_reconcile,
        } => {
            if renumber_from.is_some() {
                config.normalize.renumber_from = renumber_from;
            }
            config.normalize.reconcile &= !no_reconcile;

            let mut corpus = load_corpus(&align, None, None)?;
            let ParallelCorpus {
                alignment, source, target, ..
            } = &mut corpus;
            let report = normalize_corpus(
                &mut source.treebank,
                &mut target.treebank,
                &mut alignment.alignment,
                &config.normalize,
            )
            .context("failed to normalize corpus")?;

            for side in Side::BOTH {
                let summary = report.side(side);
                println!(
                    "{}: {} sentence(s) renumbered, {} sentence(s) reconciled, {} node id(s) renamed, {} alignment reference(s) updated",
                    side,
                    summary.renumbered_sentences.len(),
                    summary.reconciled_sentences.len(),
                    summary.renamed_nodes,
                    summary.patched_references
                );
            }
            if report.is_unchanged() {
                info!("corpus already normalized");
            }

            let written = corpus
                .write_normalized(&outdir)
                .with_context(|| format!("failed to write normalized files to {}", outdir.display()))?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
