#[macro_use]
extern crate log;

use chapterwatch::{
    application::worker::updates::UpdatesWorker,
    infrastructure::{
        config::{Config, DEFAULT_STATE_PATH},
        source::tencent::Tencent,
        state::StateStore,
    },
};
use chapterwatch_notifier::discord::Discord;
use clap::Parser;

#[derive(Parser)]
#[clap(version, about = "Notify a Discord webhook about new comic chapters")]
struct Opts {
    /// Path to config file
    #[clap(long)]
    config: Option<String>,
    /// Path to state file
    #[clap(long, default_value = DEFAULT_STATE_PATH)]
    state: String,
}

fn init_logger() {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        let level = std::env::var("CHAPTERWATCH_LOG").unwrap_or_else(|_| "info".to_string());
        builder.parse_filters(&format!(
            "chapterwatch={level},chapterwatch_notifier={level}"
        ));
    }
    builder.init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    init_logger();

    let opts: Opts = Opts::parse();

    let config = match Config::open(opts.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    };

    info!(
        "loaded {} series from {:?}",
        config.series.len(),
        config.path()
    );
    debug!("config: {:?}", config);

    let state = StateStore::open(&opts.state);
    let source = Tencent::new(config.numbering)?;
    let notifier = Discord::new(config.webhook_url.clone());

    let mut worker = UpdatesWorker::new(&config, source, notifier, state);
    worker.run().await;

    Ok(())
}
