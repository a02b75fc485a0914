use clap::Parser;
use log::error;

use artboard_export::server::ExportServer;
use artboard_export::ExportConfig;

/// Artboard export service: renders artboard scene graphs to near-4K PNGs
/// and serves them as a zip archive.
#[derive(Parser, Debug)]
#[command(name = "artboard-exportd", version, about)]
struct Args {
    /// Port to listen on (falls back to the PORT environment variable)
    #[arg(short, long, default_value_t = default_port())]
    port: u16,

    /// Page-load timeout for the rendering host, in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
}

fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = ExportConfig {
        timeout_ms: args.timeout_ms,
        ..Default::default()
    };

    match ExportServer::bind(&format!("0.0.0.0:{}", args.port), config) {
        Ok(server) => server.run(),
        Err(e) => {
            error!("failed to start server: {}", e);
            std::process::exit(1);
        }
    }
}
