//! Container health checker: probes the gateway's `/health` endpoint on
//! localhost with a 2-second budget. Exit 0 on HTTP 200, exit 1 on any
//! failure or timeout.

use std::process::ExitCode;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/health", port);

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("HEALTHCHECK ERROR: {}", e);
            return ExitCode::from(1);
        }
    };

    match client.get(&url).send().await {
        Ok(response) => {
            println!("HEALTHCHECK STATUS: {}", response.status().as_u16());
            if response.status().is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) if e.is_timeout() => {
            eprintln!("HEALTHCHECK TIMEOUT");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("HEALTHCHECK ERROR: {}", e);
            ExitCode::from(1)
        }
    }
}
