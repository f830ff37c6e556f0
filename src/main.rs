use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use sudoku_carousel::config::{self, PublisherConfig};
use sudoku_carousel::credentials::{
    CredentialBundle, CredentialStore, FileSecretBackend, TokenRefresher,
};
use sudoku_carousel::engagement::SocialEngagement;
use sudoku_carousel::graph::GraphClient;
use sudoku_carousel::hosting::build_host;
use sudoku_carousel::http::{ReqwestTransport, Transport};
use sudoku_carousel::imaging::{BoardRenderer, GlyphSource, Quality};
use sudoku_carousel::output;
use sudoku_carousel::publish::Publisher;
use sudoku_carousel::puzzle::{DifficultyModel, PuzzleFactory, SudokuLibrary};
use sudoku_carousel::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use sudoku_carousel::serve::{self, FETCH_ATTEMPTS, FETCH_INTERVAL, ImageKind, ServeError};
use sudoku_carousel::studio::Studio;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sudoku-carousel")]
#[command(about = "Daily Sudoku puzzle/solution carousel publisher")]
#[command(long_about = "\
Daily Sudoku puzzle/solution carousel publisher

Each cycle samples a cluster shape and difficulty, draws the puzzle and an
upside-down noisy solution, hosts both images publicly, and publishes them as
a two-image carousel through the Graph API. The access token is exchanged for
a fresh one when it has less than a week left.

Credentials live in a versioned JSON file (see `secrets import`) with the keys
access_token, app_id, app_secret, instagram_user_id, imgbb_token and
free_image_token.

Run 'sudoku-carousel gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (stock defaults when absent)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a full cycle: generate → render → host → publish → verify token
    Publish,
    /// Generate and render a pair without touching the network
    Render,
    /// Check the access token and rotate it if close to expiry
    VerifyToken,
    /// Write the latest rendered image to a file or stdout
    Fetch {
        #[arg(value_enum)]
        kind: ImageKind,
        /// Destination file; raw JPEG on stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manage stored credential versions
    #[command(subcommand)]
    Secrets(SecretsCommand),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum SecretsCommand {
    /// Store a JSON credential bundle as the only live version
    Import { file: PathBuf },
    /// List stored versions
    List,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn studio(config: &PublisherConfig) -> Result<Studio<SudokuLibrary>, Box<dyn std::error::Error>> {
    let difficulty =
        DifficultyModel::new(config.puzzle.difficulty_mean, config.puzzle.difficulty_stddev)?;
    Ok(Studio {
        factory: PuzzleFactory::new(SudokuLibrary::new(config.puzzle.node_budget), difficulty),
        renderer: BoardRenderer::new(
            config.render.params(),
            GlyphSource::load(config.render.font.as_deref()),
        ),
        quality: Quality::new(config.render.quality),
        output_dir: config.storage.output_dir.clone(),
    })
}

fn refresher<'a>(config: &PublisherConfig, graph: GraphClient<'a>) -> TokenRefresher<'a> {
    TokenRefresher::new(graph, TimeDelta::days(config.graph.refresh_threshold_days))
}

fn publisher<'a>(
    config: &PublisherConfig,
    transport: &'a dyn Transport,
    sleeper: &'a dyn Sleeper,
    backend: &'a FileSecretBackend,
) -> Result<Publisher<'a, SudokuLibrary>, Box<dyn std::error::Error>> {
    let graph = GraphClient::new(transport, &config.graph.base_url);
    let engagement = config.engagement.enabled.then(|| {
        let mut e = SocialEngagement::new(graph.clone());
        e.post_limit = config.engagement.post_limit;
        e.comment_limit = config.engagement.comment_limit;
        e.replies = config.engagement.replies.clone();
        e
    });
    let host = build_host(
        config.hosting.provider,
        transport,
        sleeper,
        RetryPolicy::exponential(config.hosting.attempts, config.hosting.backoff_base()),
        Quality::new(config.render.quality),
        config.hosting.imgbb_expiration_secs,
    );
    Ok(Publisher {
        studio: studio(config)?,
        store: CredentialStore::new(backend),
        host,
        graph: graph.clone(),
        engagement,
        refresher: refresher(config, graph),
    })
}

fn fetch(dir: &Path, kind: ImageKind, out: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = match serve::fetch_latest(dir, kind, FETCH_ATTEMPTS, FETCH_INTERVAL, &ThreadSleeper) {
        Ok(bytes) => bytes,
        Err(ServeError::NotFound(_)) => {
            eprintln!("Image not found");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    match out {
        Some(path) => std::fs::write(path, &bytes)?,
        None => std::io::stdout().lock().write_all(&bytes)?,
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Publish => {
            let config = config::load_config(&cli.config)?;
            let backend = FileSecretBackend::new(&config.storage.secrets_file);
            let transport = ReqwestTransport::new(config.hosting.timeout())?;
            let publisher = publisher(&config, &transport, &ThreadSleeper, &backend)?;
            let report = publisher.run(&mut rand::thread_rng())?;
            output::print_run_report(&report);
            println!("{}", report.status_line());
            if !report.published() {
                std::process::exit(1);
            }
        }
        Command::Render => {
            let config = config::load_config(&cli.config)?;
            let studio = studio(&config)?;
            let mut rng = rand::thread_rng();
            let spec = studio.sample_spec(&mut rng);
            let puzzle = studio.generate(&spec, &mut rng)?;
            let pair = studio.render(&puzzle, &mut rng)?;
            output::print_render_output(&puzzle, &pair);
        }
        Command::VerifyToken => {
            let config = config::load_config(&cli.config)?;
            let backend = FileSecretBackend::new(&config.storage.secrets_file);
            let transport = ReqwestTransport::new(config.hosting.timeout())?;
            let store = CredentialStore::new(&backend);
            let bundle = store.load()?;
            let graph = GraphClient::new(&transport, &config.graph.base_url);
            let outcome = refresher(&config, graph).verify_and_rotate(&store, &bundle)?;
            output::print_verify_outcome(&outcome);
        }
        Command::Fetch { kind, out } => {
            let config = config::load_config(&cli.config)?;
            fetch(&config.storage.output_dir, kind, out.as_deref())?;
        }
        Command::Secrets(SecretsCommand::Import { file }) => {
            let config = config::load_config(&cli.config)?;
            let backend = FileSecretBackend::new(&config.storage.secrets_file);
            let payload = std::fs::read_to_string(&file)?;
            let bundle = CredentialBundle::from_payload(&payload)?;
            let report = CredentialStore::new(&backend).replace(&bundle)?;
            println!(
                "Imported {} as version {}",
                file.display(),
                report.new_version
            );
        }
        Command::Secrets(SecretsCommand::List) => {
            let config = config::load_config(&cli.config)?;
            let backend = FileSecretBackend::new(&config.storage.secrets_file);
            output::print_versions(&CredentialStore::new(&backend).versions()?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
