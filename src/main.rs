use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use chart_index::config::{self, Config};
use chart_index::repo::{ChartLocator, HttpFetcher, RepositoryConnection, ResolutionCache};

#[derive(Parser)]
#[command(name = "chart-index")]
#[command(version, about = "Chart repository index maintenance and lookup")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an index file for a directory of packaged charts
    Index {
        dir: PathBuf,
        /// URL of the chart repository
        #[arg(long, default_value = "")]
        url: String,
        /// Merge the generated index into the given index
        #[arg(long)]
        merge: Option<PathBuf>,
    },
    /// Print the download URL of a chart in a repository
    Resolve {
        repo_url: String,
        chart: String,
        /// Version or version range; newest stable version when omitted
        #[arg(long, default_value = "")]
        version: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        cert_file: Option<PathBuf>,
        #[arg(long)]
        key_file: Option<PathBuf>,
        #[arg(long)]
        ca_file: Option<PathBuf>,
        #[arg(long)]
        insecure_skip_tls_verify: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = chart_index::logging::init(&config::log_path())?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Index { dir, url, merge } => {
            let dir = std::path::absolute(&dir)?;
            let out = chart_index::repo::update_index(&dir, &url, merge.as_deref())?;
            println!("{}", out.display());
            Ok(())
        }
        Command::Resolve {
            repo_url,
            chart,
            version,
            username,
            password,
            cert_file,
            key_file,
            ca_file,
            insecure_skip_tls_verify,
        } => {
            let mut connection = RepositoryConnection::new(&repo_url)
                .with_tls_files(cert_file, key_file, ca_file)
                .with_insecure_skip_tls_verify(insecure_skip_tls_verify);
            connection.username = username;
            connection.password = password;

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(async {
                    let cache = Arc::new(ResolutionCache::new(Duration::from_millis(
                        config.cache.ttl,
                    )));
                    let _sweeper = cache.spawn_sweeper();
                    let locator = ChartLocator::new(
                        cache,
                        Arc::new(HttpFetcher::new()),
                        config.repository_cache_dir(),
                    );
                    let url = locator.resolve(&connection, &chart, &version).await?;
                    println!("{}", url);
                    Ok::<(), anyhow::Error>(())
                })
        }
    }
}
