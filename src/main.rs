use runner_confirmation_server::api::ApiExtension;
use runner_confirmation_server::audit::StoreAuditLog;
use runner_confirmation_server::config::{Backend, Config};
use runner_confirmation_server::registry::{HttpRegistry, InMemoryRegistry, Registry};
use tiered_server::server::serve;
use tracing::{error, info};

async fn run<R: Registry + 'static>(config: Config, registry: R) {
    serve(Box::leak(Box::new(ApiExtension::new(
        config,
        registry,
        StoreAuditLog,
    ))))
    .await;
}

#[tokio::main]
async fn main() {
    #[cfg(debug_assertions)]
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .without_time()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            "runner_confirmation_server=debug,tiered_server=debug,zip_static_handler=info,hyper=info",
        ))
        .init();
    #[cfg(not(debug_assertions))]
    tracing_subscriber::fmt()
        .compact()
        .with_ansi(true)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .without_time()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            "runner_confirmation_server=info,tiered_server=info,zip_static_handler=info,hyper=info",
        ))
        .init();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };
    match config.backend.clone() {
        Backend::Http(url) => {
            info!("using registry at {url}");
            match HttpRegistry::new(url, config.timeout) {
                Ok(registry) => run(config, registry).await,
                Err(err) => {
                    error!("{err}");
                    std::process::exit(1);
                }
            }
        }
        Backend::Memory => {
            info!("using the in-memory demo registry");
            let registry = InMemoryRegistry::demo(&config.phone_prefix);
            run(config, registry).await
        }
    }
}
