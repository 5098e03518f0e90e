use std::{env, error::Error};

use mirage::{
    config::{MirageConfig, MirageConfigLoadError},
    logging::MirageLogger,
    Mirage,
};
use tokio::sync::broadcast;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    #[cfg(debug_assertions)]
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::init();

    let config_file = env::current_dir()?.join("settings.toml");

    let mut config = match MirageConfig::load(&config_file) {
        Ok(config) => {
            // Save config to fill missing fields
            let _ = config.save(&config_file);
            Ok(config)
        }
        Err(error) => match error {
            MirageConfigLoadError::Io(_) => {
                // If config loading fails we generate a default config
                let default_config = MirageConfig::default();
                let _ = default_config.save(&config_file);
                Ok(default_config)
            }
            MirageConfigLoadError::Parse(parse_error) => Err(parse_error),
        },
    }?;
    config.apply_env()?;

    let (stop, _) = broadcast::channel(1);
    let mirage = Mirage::new(config, stop.clone());
    let mut server = tokio::spawn(async move {
        if let Err(e) = mirage.start().await {
            log::error!("{e}");
        }
    });

    {
        use futures::future::{select_all, FutureExt};
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let sigint_fut = sigint.recv().boxed();
        let sigterm_fut = sigterm.recv().boxed();

        tokio::select! {
            _ = select_all([sigint_fut, sigterm_fut]) => {
                MirageLogger::shutting_down();
                let _ = stop.send(());
            }
            // listener failed to start
            finished = &mut server => return Ok(finished?),
        }
    }
    server.await?;
    Ok(())
}
