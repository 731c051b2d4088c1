//! `giftpool status` — Query the status of a running Giftpool node.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    gift_count: usize,
    settlement_count: usize,
    float_cache_age_secs: Option<i64>,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/status", args.endpoint);
    let resp = reqwest::get(&url).await;

    match resp {
        Ok(r) if r.status().is_success() => {
            let data: StatusResponse = r.json().await?;
            println!("Node Status:");
            println!("  Version:      {}", data.version);
            println!("  Uptime:       {}s", data.uptime_secs);
            println!("  Gifts:        {}", data.gift_count);
            println!("  Settlements:  {}", data.settlement_count);
            match data.float_cache_age_secs {
                Some(age) => println!("  Float cache:  {age}s old"),
                None => println!("  Float cache:  (never fetched)"),
            }
        }
        Ok(r) => {
            anyhow::bail!("status request failed (HTTP {})", r.status());
        }
        Err(e) => {
            println!("Could not reach node at {}", args.endpoint);
            println!("  Error: {}", e);
            println!();
            println!("Is the node running? Start it with: giftpool-node");
        }
    }

    Ok(())
}
