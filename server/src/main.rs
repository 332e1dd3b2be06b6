use clap::Parser;
use log::{error, info};
use server::config::WorldConfig;
use server::network::{BoxError, Server, ServerSettings};
use shared::{FOOD_COUNT, TICK_MILLIS, WORLD_HEIGHT, WORLD_WIDTH};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Simulation period in milliseconds
    #[arg(short, long, default_value_t = TICK_MILLIS)]
    tick_millis: u64,

    /// Maximum number of concurrent connections
    #[arg(short, long, default_value = "64")]
    max_clients: usize,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value = "5")]
    timeout_secs: u64,

    /// Number of food particles kept in the world
    #[arg(short, long, default_value_t = FOOD_COUNT)]
    food_count: usize,

    /// World width
    #[arg(long, default_value_t = WORLD_WIDTH)]
    width: f32,

    /// World height
    #[arg(long, default_value_t = WORLD_HEIGHT)]
    height: f32,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let settings = ServerSettings {
        tick_duration: Duration::from_millis(args.tick_millis.max(1)),
        max_clients: args.max_clients,
        client_timeout: Duration::from_secs(args.timeout_secs),
        world: WorldConfig {
            width: args.width,
            height: args.height,
            food_count: args.food_count,
            ..WorldConfig::default()
        },
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, settings).await?;
    let handle = server.handle();

    info!(
        "World {}x{} with {} food, ticking every {}ms",
        args.width, args.height, args.food_count, args.tick_millis
    );

    let server_task = tokio::spawn(async move { server.run().await });

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Server stopped with error: {}", e);
                    return Err(e);
                }
                Err(e) => error!("Server task panicked: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            handle.shutdown();
        }
    }

    Ok(())
}
