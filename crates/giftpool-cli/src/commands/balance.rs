//! `giftpool balance` — Check the gift card float against a requested amount.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Gift identifier (UUID).
    #[arg(short, long)]
    pub gift: String,

    /// Requested settlement amount (e.g. 20.00).
    #[arg(short, long)]
    pub amount: f64,

    /// API endpoint of the node.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct BalanceCheckResponse {
    balance: Option<f64>,
    currency_code: Option<String>,
    requested_amount: f64,
    can_fulfill_gift_card: bool,
}

pub async fn run(args: &BalanceArgs) -> anyhow::Result<()> {
    let url = format!(
        "{}/api/v1/gifts/{}/balance-check?amount={}",
        args.endpoint, args.gift, args.amount
    );

    let resp = reqwest::get(&url).await?;
    let status = resp.status();
    let data: BalanceCheckResponse = resp.json().await?;

    println!("Balance check (HTTP {status}):");
    match (data.balance, data.currency_code) {
        (Some(balance), Some(currency)) => {
            println!("  Float:      {balance:.2} {currency}");
        }
        _ => println!("  Float:      (unavailable)"),
    }
    println!("  Requested:  {:.2}", data.requested_amount);
    println!(
        "  Gift card:  {}",
        if data.can_fulfill_gift_card {
            "available"
        } else {
            "not available"
        }
    );

    Ok(())
}
