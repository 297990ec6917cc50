// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use arcadia::{
    calendar::utc_day,
    config::Config,
    path::default_config_path,
    preview, remote,
    replay::Replayer,
    snapshot::{Metadata, Snapshot},
    store::StoreError,
    GridStore, Intensity, Target, YearKey,
};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Text;
use rand::{rngs::StdRng, SeedableRng};
use std::{
    fs,
    path::{Path, PathBuf},
    process::exit,
    time::Duration,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "arcadia [options] <command> <pattern> [args]...",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Treat this UTC day as today instead of reading the system clock.
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    pub today: Option<NaiveDate>,

    /// Path to configuration file.
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let session = Session::new(self.today, self.config)?;
        match self.command {
            Command::New(opts) => run_new(&session, opts),
            Command::Select(opts) => run_select(&session, opts),
            Command::Deselect(opts) => run_deselect(&session, opts),
            Command::Paint(opts) => run_paint(&session, opts),
            Command::Clear(opts) => run_clear(&session, opts),
            Command::Show(opts) => run_show(&session, opts),
            Command::Import(opts) => run_import(&session, opts),
            Command::Generate(opts) => run_generate(&session, opts).await,
            Command::Replay(opts) => run_replay(&session, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create new pattern file.
    #[command(override_usage = "arcadia new [options] <pattern>")]
    New(NewOptions),

    /// Select year windows of a pattern.
    #[command(override_usage = "arcadia select [options] <pattern> <year>...")]
    Select(SelectOptions),

    /// Deselect year windows of a pattern.
    #[command(override_usage = "arcadia deselect [options] <pattern> <year>...")]
    Deselect(SelectOptions),

    /// Paint a day with an intensity level.
    #[command(override_usage = "arcadia paint [options] <pattern> <date> <level>")]
    Paint(PaintOptions),

    /// Clear one year window, or the whole pattern.
    #[command(override_usage = "arcadia clear [options] <pattern>")]
    Clear(ClearOptions),

    /// Show a year window as text.
    #[command(override_usage = "arcadia show [options] <pattern> <year>")]
    Show(ShowOptions),

    /// Replace pattern with grids from another pattern file.
    #[command(override_usage = "arcadia import [options] <pattern> <file>")]
    Import(ImportOptions),

    /// Compile pattern into a shell script.
    #[command(override_usage = "arcadia generate [options] <pattern>")]
    Generate(GenerateOptions),

    /// Apply pattern to a local repository.
    #[command(override_usage = "arcadia replay [options] <pattern> <repository>")]
    Replay(ReplayOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct NewOptions {
    /// Path to pattern file to create.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// Year window to select, "current" or a four digit year.
    #[arg(short, long = "year", value_name = "year")]
    pub years: Vec<YearKey>,

    /// Overwrite existing pattern file.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct SelectOptions {
    /// Path to pattern file.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// Year windows, "current" or a four digit year.
    #[arg(required = true, value_name = "year")]
    pub years: Vec<YearKey>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PaintOptions {
    /// Path to pattern file.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// Day to paint.
    #[arg(required = true, value_name = "YYYY-MM-DD")]
    pub date: NaiveDate,

    /// Intensity level from 0 to 4.
    #[arg(required = true, value_name = "level")]
    pub level: Intensity,

    /// Paint through this year window instead of the first one holding the day.
    #[arg(short, long = "year", value_name = "year")]
    pub year: Option<YearKey>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ClearOptions {
    /// Path to pattern file.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// Only clear days covered by this year window.
    #[arg(short, long = "year", value_name = "year")]
    pub year: Option<YearKey>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ShowOptions {
    /// Path to pattern file.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// Year window to show.
    #[arg(required = true, value_name = "year")]
    pub year: YearKey,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ImportOptions {
    /// Path to pattern file.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// Pattern file to import grids from.
    #[arg(required = true, value_name = "file")]
    pub file: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct GenerateOptions {
    /// Path to pattern file.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// GitHub username owning the target repository.
    #[arg(short, long, value_name = "name")]
    pub username: Option<String>,

    /// Target repository name.
    #[arg(short, long, value_name = "name")]
    pub repository: Option<String>,

    /// Branch to push to.
    #[arg(short, long, value_name = "branch")]
    pub branch: Option<String>,

    /// Path to write script to.
    #[arg(short, long, value_name = "path")]
    pub output: Option<PathBuf>,

    /// Seed commit message selection for a reproducible script.
    #[arg(long, value_name = "number")]
    pub seed: Option<u64>,

    /// Do not check that the target repository exists.
    #[arg(long)]
    pub skip_check: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ReplayOptions {
    /// Path to pattern file.
    #[arg(required = true, value_name = "pattern")]
    pub pattern: PathBuf,

    /// Path to local repository, created if missing.
    #[arg(required = true, value_name = "repository")]
    pub repository: PathBuf,

    /// Branch a freshly created repository starts on.
    #[arg(short, long, value_name = "branch")]
    pub branch: Option<String>,

    /// Seed commit message selection.
    #[arg(long, value_name = "number")]
    pub seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

/// Settings shared by every command.
struct Session {
    today: NaiveDate,
    config: Config,
}

impl Session {
    fn new(today: Option<NaiveDate>, config: Option<PathBuf>) -> Result<Self> {
        // INVARIANT: Today is read from the clock once, and threaded everywhere.
        let today = today.unwrap_or_else(|| utc_day(&Utc::now()));
        let config = match config {
            Some(path) if !path.exists() => bail!("no configuration at {:?}", path.display()),
            Some(path) => Config::load(path)?,
            None => Config::load(default_config_path()?)?,
        };

        Ok(Self { today, config })
    }
}

/// Pattern file opened for a single command.
struct Pattern {
    path: PathBuf,
    store: GridStore,
    metadata: Metadata,
}

impl Pattern {
    fn create(path: PathBuf, today: NaiveDate) -> Self {
        Self {
            path,
            store: GridStore::new(today),
            metadata: Metadata::default(),
        }
    }

    fn open(path: PathBuf, today: NaiveDate) -> Result<Self> {
        let snapshot = read_snapshot(&path)?;
        let metadata = snapshot.metadata().cloned().unwrap_or_default();
        let grids = snapshot
            .into_grids()
            .with_context(|| format!("pattern {:?} is corrupt", path.display()))?;
        let store = GridStore::restore(today, grids, metadata.imported);

        Ok(Self {
            path,
            store,
            metadata,
        })
    }

    fn save(&self) -> Result<()> {
        let data = Snapshot::capture(&self.store, self.metadata.clone()).encode()?;
        write_file(&self.path, data)?;
        info!("saved pattern to {:?}", self.path.display());

        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read pattern {:?}", path.display()))?;

    Snapshot::decode(&data).with_context(|| format!("cannot load {:?}", path.display()))
}

fn write_file(path: &Path, data: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        mkdirp::mkdirp(parent)?;
    }
    fs::write(path, data).with_context(|| format!("failed to write {:?}", path.display()))?;

    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn run_new(session: &Session, opts: NewOptions) -> Result<()> {
    if opts.pattern.exists() && !opts.force {
        bail!(
            "pattern {:?} already exists, use --force to overwrite it",
            opts.pattern.display()
        );
    }

    let mut pattern = Pattern::create(opts.pattern, session.today);
    let years = if opts.years.is_empty() {
        vec![YearKey::Current]
    } else {
        opts.years
    };
    for key in years {
        pattern.store.select_year(key)?;
    }
    pattern.save()?;

    Ok(())
}

fn run_select(session: &Session, opts: SelectOptions) -> Result<()> {
    let mut pattern = Pattern::open(opts.pattern, session.today)?;
    for key in opts.years {
        pattern.store.select_year(key)?;
    }
    pattern.save()?;

    Ok(())
}

fn run_deselect(session: &Session, opts: SelectOptions) -> Result<()> {
    let mut pattern = Pattern::open(opts.pattern, session.today)?;
    for key in opts.years {
        pattern.store.deselect_year(key);
    }
    pattern.save()?;

    Ok(())
}

fn run_paint(session: &Session, opts: PaintOptions) -> Result<()> {
    let mut pattern = Pattern::open(opts.pattern, session.today)?;
    let changed = match opts.year {
        Some(key) => {
            let grid = pattern
                .store
                .grid(key)
                .ok_or(StoreError::UnknownYear(key))?;
            let Some(index) = grid.index_of(opts.date) else {
                bail!("{} is not on grid {key}", opts.date);
            };
            pattern.store.paint_cell(key, index, opts.level)?
        }
        None => pattern.store.paint_date(opts.date, opts.level)?,
    };

    if changed == 0 {
        warn!("{} left unchanged", opts.date);
        return Ok(());
    }
    info!("painted {} with intensity {}", opts.date, opts.level);
    pattern.save()?;

    Ok(())
}

fn run_clear(session: &Session, opts: ClearOptions) -> Result<()> {
    let mut pattern = Pattern::open(opts.pattern, session.today)?;
    match opts.year {
        Some(key) => pattern.store.clear_year(key)?,
        None => pattern.store.clear_all(),
    };
    pattern.save()?;

    Ok(())
}

fn run_show(session: &Session, opts: ShowOptions) -> Result<()> {
    let pattern = Pattern::open(opts.pattern, session.today)?;
    let grid = pattern
        .store
        .grid(opts.year)
        .ok_or(StoreError::UnknownYear(opts.year))?;

    println!("{} ({} to {})", grid.key(), grid.year_start(), grid.year_end());
    print!("{}", preview::render(grid));

    Ok(())
}

fn run_import(session: &Session, opts: ImportOptions) -> Result<()> {
    let mut pattern = Pattern::open(opts.pattern, session.today)?;

    // INVARIANT: Every grid must restore before the store is touched.
    let grids = read_snapshot(&opts.file)?
        .into_grids()
        .with_context(|| format!("cannot import {:?}", opts.file.display()))?;
    pattern.store.import(grids);
    pattern.save()?;

    Ok(())
}

async fn run_generate(session: &Session, opts: GenerateOptions) -> Result<()> {
    let mut pattern = Pattern::open(opts.pattern.clone(), session.today)?;
    let compiler = session.config.compiler()?;
    let target = resolve_target(session, &pattern.metadata, &opts)?;

    if opts.skip_check {
        warn!("skip check of {}", target.slug());
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        bar.enable_steady_tick(Duration::from_millis(100));
        let result = remote::check_in_background(target.clone(), bar.clone()).await;
        bar.finish_and_clear();
        result?;
    }

    let plan = compiler.plan(pattern.store.grids().values());
    if plan.is_empty() {
        warn!("pattern has no painted days, script only bootstraps the repository");
    }
    let script = compiler.compile_plan(&plan, &target, &mut seeded_rng(opts.seed));

    let output = match opts.output {
        Some(path) => path,
        None => {
            let directory = session
                .config
                .output
                .directory
                .as_ref()
                .map(|directory| directory.as_path().to_path_buf())
                .unwrap_or_default();
            directory.join(format!("{}-{}.sh", target.username(), target.repository()))
        }
    };
    write_file(&output, script)?;
    make_executable(&output)?;
    info!(
        "wrote {} commits over {} days to {:?}",
        plan.total_commits(),
        plan.days().len(),
        output.display()
    );

    pattern.metadata.username = Some(target.username().into());
    pattern.metadata.repository = Some(target.repository().into());
    pattern.metadata.branch = Some(target.branch().into());
    pattern.save()?;

    Ok(())
}

// Flags win over the pattern's last target, which wins over configuration.
// Whatever is still missing is asked for.
fn resolve_target(session: &Session, metadata: &Metadata, opts: &GenerateOptions) -> Result<Target> {
    let defaults = &session.config.target;
    let username = match pick(&opts.username, &metadata.username, &defaults.username) {
        Some(username) => username,
        None => Text::new("GitHub username").prompt()?,
    };
    let repository = match pick(&opts.repository, &metadata.repository, &defaults.repository) {
        Some(repository) => repository,
        None => Text::new("repository").prompt()?,
    };
    let branch = match pick(&opts.branch, &metadata.branch, &defaults.branch) {
        Some(branch) => branch,
        None => Text::new("branch").with_default("main").prompt()?,
    };

    Ok(Target::new(username, repository, branch)?)
}

fn pick(
    flag: &Option<String>,
    saved: &Option<String>,
    configured: &Option<String>,
) -> Option<String> {
    flag.as_ref()
        .or(saved.as_ref())
        .or(configured.as_ref())
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)?;

    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn run_replay(session: &Session, opts: ReplayOptions) -> Result<()> {
    let pattern = Pattern::open(opts.pattern, session.today)?;
    let compiler = session.config.compiler()?;
    let branch = pick(
        &opts.branch,
        &pattern.metadata.branch,
        &session.config.target.branch,
    )
    .unwrap_or_else(|| "main".into());

    let plan = compiler.plan(pattern.store.grids().values());
    let commits = plan.schedule(compiler.messages(), &mut seeded_rng(opts.seed));
    let replayer = Replayer::open_or_init(&opts.repository, &branch)?;

    let bar = ProgressBar::new(commits.len() as u64);
    let style = ProgressStyle::with_template(
        "{elapsed_precise:.green}  {msg:<30}  [{wide_bar:.yellow/blue}]  {pos}/{len}",
    )?
    .progress_chars("-Cco.");
    bar.set_style(style);
    bar.set_message(opts.repository.display().to_string());

    let made = replayer.replay(&commits, &bar)?;
    info!(
        "replayed {made} commits into {:?}, push it when ready",
        opts.repository.display()
    );

    Ok(())
}
