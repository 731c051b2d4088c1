//! `giftpool settle` — Fetch the settlement offer for a gift, or settle it.

use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug)]
pub struct SettleArgs {
    /// Gift identifier (UUID).
    #[arg(short, long)]
    pub gift: String,

    /// Settlement method (gift_card or credits). Omit to only show the offer.
    #[arg(short, long)]
    pub method: Option<String>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct OfferResponse {
    surplus: f64,
    methods: Vec<String>,
    balance: Option<f64>,
}

#[derive(Serialize)]
struct SettleRequest {
    method: String,
}

#[derive(Deserialize)]
struct SettlementResponse {
    id: String,
    method: String,
    payable: f64,
    currency_code: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(args: &SettleArgs) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/gifts/{}/settlement", args.endpoint, args.gift);

    // Always show the offer first.
    let resp = client.get(&url).send().await?;
    if !resp.status().is_success() {
        let status = resp.status();
        if let Ok(err) = resp.json::<ErrorResponse>().await {
            anyhow::bail!("offer request failed (HTTP {}): {}", status, err.error);
        }
        anyhow::bail!("offer request failed (HTTP {})", status);
    }
    let offer: OfferResponse = resp.json().await?;

    println!("Settlement offer for gift {}:", args.gift);
    println!("  Surplus:  {:.2}", offer.surplus);
    match offer.balance {
        Some(balance) => println!("  Float:    {balance:.2}"),
        None => println!("  Float:    (unavailable)"),
    }
    println!("  Methods:  {}", offer.methods.join(", "));

    let Some(method) = &args.method else {
        return Ok(());
    };

    println!();
    println!("Settling via {method}...");

    let resp = client
        .post(&url)
        .json(&SettleRequest {
            method: method.clone(),
        })
        .send()
        .await?;

    if resp.status().is_success() {
        let data: SettlementResponse = resp.json().await?;
        println!("Settled!");
        println!("  Settlement:  {}", data.id);
        println!("  Method:      {}", data.method);
        println!("  Payable:     {:.2} {}", data.payable, data.currency_code);
    } else {
        let status = resp.status();
        if let Ok(err) = resp.json::<ErrorResponse>().await {
            anyhow::bail!("settlement failed (HTTP {}): {}", status, err.error);
        } else {
            anyhow::bail!("settlement failed (HTTP {})", status);
        }
    }

    Ok(())
}
