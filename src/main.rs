use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueHint};
use tracing_subscriber::EnvFilter;

use gridprep::config::{ConvertConfig, SubsetConfig};
use gridprep::convert::{Sentinels, SourceFormat, SourceLayout, SubsetExtractor};
use gridprep::inspect::summarize_split;
use gridprep::{Result, run};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Decompose multi-channel grid-map tensors into per-field .npy datasets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full conversion described by a JSON config file
    Run {
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
    },

    /// Decompose source maps into the six field arrays
    Convert(ConvertArgs),

    /// Copy the first COUNT samples of every field of a converted split
    Subset {
        #[arg(long, value_hint = ValueHint::DirPath)]
        source: PathBuf,
        #[arg(long, value_hint = ValueHint::DirPath)]
        dest: PathBuf,
        #[arg(long)]
        count: usize,
    },

    /// Print dtype, shape and true-cell counts of a converted split
    Inspect {
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Source layout: channels4 (4 channels + cf.npy) or coded (start/goal codes)
    #[arg(long)]
    format: SourceFormat,

    /// Root with one directory per split, or a single map file
    #[arg(long, value_hint = ValueHint::AnyPath)]
    source: PathBuf,

    /// Output dataset root
    #[arg(long, value_hint = ValueHint::DirPath)]
    dest: PathBuf,

    /// Split to convert; repeat for several. Defaults depend on the format
    #[arg(long = "split")]
    splits: Vec<String>,

    /// Value of channel 0 that marks free space
    #[arg(long)]
    free: Option<f64>,

    /// Value that marks the start cell
    #[arg(long)]
    start: Option<f64>,

    /// Value that marks the goal cell
    #[arg(long)]
    goal: Option<f64>,

    /// Also write default-sized subsets under this root
    #[arg(long, value_hint = ValueHint::DirPath)]
    subset_dest: Option<PathBuf>,

    /// Convert splits concurrently
    #[arg(long)]
    parallel: bool,
}

impl ConvertArgs {
    fn into_config(self) -> ConvertConfig {
        let source = if self.source.is_dir() {
            SourceLayout::SplitDirs { root: self.source }
        } else {
            SourceLayout::SingleFile { path: self.source }
        };
        let defaults = self.format.default_sentinels();
        let sentinels = Sentinels {
            free: self.free.unwrap_or(defaults.free),
            start: self.start.unwrap_or(defaults.start),
            goal: self.goal.unwrap_or(defaults.goal),
        };

        let mut config = ConvertConfig::new(self.format, source, self.dest)
            .with_splits(self.splits)
            .with_sentinels(sentinels)
            .with_parallel(self.parallel);
        if let Some(dir) = self.subset_dest {
            config = config.with_subset(SubsetConfig::new(dir));
        }
        config
    }
}

fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run { config } => {
            let config = ConvertConfig::from_json_file(&config)?;
            report(&run(&config)?);
        }
        Command::Convert(args) => {
            report(&run(&args.into_config())?);
        }
        Command::Subset {
            source,
            dest,
            count,
        } => {
            let taken = SubsetExtractor::new(count).extract(&source, &dest)?;
            println!("{}: {taken} samples", dest.display());
        }
        Command::Inspect { dir } => {
            for summary in summarize_split(&dir)? {
                println!("{summary}");
            }
        }
    }
    Ok(())
}

fn report(reports: &[gridprep::SplitReport]) {
    for r in reports {
        print!("{:<6} {} samples -> {}", r.split, r.num_samples, r.output_dir.display());
        if let Some((dir, taken)) = &r.subset {
            print!(" (subset {taken} -> {})", dir.display());
        }
        println!();
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
