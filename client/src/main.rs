use clap::Parser;
use log::info;
use match3_client::network::Client;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Number of moves to play before disconnecting
    #[arg(short = 'm', long, default_value = "20")]
    moves: u32,

    /// Delay before each move in milliseconds
    #[arg(short = 't', long, default_value = "500")]
    think_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting bot client...");
    info!("Connecting to: {}", args.server);

    let mut client = Client::new(&args.server, args.think_ms, args.moves).await?;

    tokio::select! {
        result = client.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, leaving");
        }
    }

    client.disconnect().await
}
