//! `giftpool contribute` — Record a contribution toward a gift.

use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug)]
pub struct ContributeArgs {
    /// Gift identifier (UUID).
    #[arg(short, long)]
    pub gift: String,

    /// Contribution amount (e.g. 25.00).
    #[arg(short, long)]
    pub amount: f64,

    /// Contributor display name; omit to contribute anonymously.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Contributor email.
    #[arg(long)]
    pub email: Option<String>,

    /// Message to show on the contribution feed.
    #[arg(short, long)]
    pub message: Option<String>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub endpoint: String,
}

#[derive(Serialize)]
struct RecordContributionRequest {
    amount: f64,
    contributor_name: Option<String>,
    contributor_email: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct RecordContributionResponse {
    gift_total: f64,
    message: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(args: &ContributeArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/gifts/{}/contributions", args.endpoint, args.gift);
    let body = RecordContributionRequest {
        amount: args.amount,
        contributor_name: args.name.clone(),
        contributor_email: args.email.clone(),
        message: args.message.clone(),
    };

    println!("Recording contribution...");
    println!("  Gift:    {}", args.gift);
    println!("  Amount:  {:.2}", args.amount);
    println!();

    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&body).send().await?;

    if resp.status().is_success() {
        let data: RecordContributionResponse = resp.json().await?;
        println!("Contribution recorded!");
        println!("  Pool total:  {:.2}", data.gift_total);
        println!("  {}", data.message);
    } else {
        let status = resp.status();
        if let Ok(err) = resp.json::<ErrorResponse>().await {
            anyhow::bail!("contribution failed (HTTP {}): {}", status, err.error);
        } else {
            anyhow::bail!("contribution failed (HTTP {})", status);
        }
    }

    Ok(())
}
