use clap::{Args, Parser, Subcommand};
use git_istage::{Direction, GitIStage, View, parse};
use log::{LevelFilter, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "git-istage")]
#[command(about = "Stage, unstage or discard individual lines of a git diff")]
#[command(version)]
struct Cli {
    /// Any path inside the repository
    #[arg(long, global = true, env = "GIT_ISTAGE_REPO", default_value = ".")]
    repo: PathBuf,

    /// Git executable to run
    #[arg(long, global = true, env = "GIT_ISTAGE_GIT", default_value = "git")]
    git: PathBuf,

    /// Increase logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the diff with the index of every line
    Show {
        /// Show staged instead of unstaged changes
        #[arg(long)]
        staged: bool,
    },
    /// Stage lines of the unstaged diff (e.g., 7,9..12)
    Stage(LineArgs),
    /// Unstage lines of the staged diff
    Unstage(LineArgs),
    /// Discard lines of the unstaged diff from the working tree
    Reset(LineArgs),
    /// Stage whole files
    AddFile {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Unstage whole files
    UnstageFile {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Args)]
struct LineArgs {
    /// Line indices as printed by `show` (e.g., "12" or "7..9,15")
    #[arg(required = true)]
    selections: Vec<String>,

    /// Take every added and removed line of the hunks the selection touches
    #[arg(long)]
    hunk: bool,

    /// Print the patch instead of applying it
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let istage = GitIStage::discover(&cli.repo, cli.git)?;

    match cli.command {
        Commands::Show { staged } => {
            let view = if staged { View::Staged } else { View::Unstaged };
            print!("{}", istage.document(view)?);
        }
        Commands::Stage(args) => apply(&istage, Direction::Stage, &args)?,
        Commands::Unstage(args) => apply(&istage, Direction::Unstage, &args)?,
        Commands::Reset(args) => apply(&istage, Direction::Reset, &args)?,
        Commands::AddFile { paths } => {
            istage.stage_files(&paths)?;
            info!("staged {}", paths.join(", "));
        }
        Commands::UnstageFile { paths } => {
            istage.unstage_files(&paths)?;
            info!("unstaged {}", paths.join(", "));
        }
    }

    Ok(())
}

fn apply(
    istage: &GitIStage,
    direction: Direction,
    args: &LineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = parse::parse_selections(&args.selections)?;

    if args.dry_run {
        print!("{}", istage.preview(direction, &selection, args.hunk)?);
    } else {
        let patch = istage.apply_lines(direction, &selection, args.hunk)?;
        info!(
            "{direction:?}: applied {} hunk(s)",
            patch.lines().filter(|line| line.starts_with("@@")).count()
        );
    }

    Ok(())
}
