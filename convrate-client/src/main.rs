//! Conversion rate form on the command line.
//!
//! # Usage
//!
//! ```bash
//! # Against a local daemon
//! cargo run -p convrate-client -- 50 200
//!
//! # Against another server
//! CONVRATE_URL=http://10.0.0.5:5001 cargo run -p convrate-client -- 10 0
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use convrate_client::http::DEFAULT_BASE_URL;
use convrate_client::{ClientRequestController, ConversionForm, HttpTransport};
use convrate_telemetry::{install_subscriber_with_writer, LogFormat, TracingSink};

/// Calculate a conversion rate using a running convrated server.
#[derive(Debug, Parser)]
#[command(name = "convrate", version)]
struct Cli {
    /// Number of conversions
    #[arg(allow_hyphen_values = true)]
    conversions: String,

    /// Number of visitors
    #[arg(allow_hyphen_values = true)]
    visitors: String,

    /// Server base URL
    #[arg(long, env = "CONVRATE_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_subscriber_with_writer(LogFormat::Pretty, "convrate_client=warn", std::io::stderr)?;

    let cli = Cli::parse();

    let transport = Arc::new(
        HttpTransport::new(cli.url).with_timeout(Duration::from_secs(cli.timeout_secs)),
    );
    let controller = ClientRequestController::new(transport, Arc::new(TracingSink));
    let form = ConversionForm::new(cli.conversions, cli.visitors);

    let failed = form.submit(&controller).await.is_err();
    if let Some(line) = ConversionForm::render(&controller.state()) {
        if failed {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
