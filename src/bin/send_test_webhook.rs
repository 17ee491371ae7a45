// credits_webhook_backend/src/bin/send_test_webhook.rs
// Sends a signed mock `order_created` delivery to a running webhook endpoint.
//
// Usage: send_test_webhook <user_id>
// Env:   WEBHOOK_URL (default http://localhost:3000/webhook),
//        LEMON_SQUEEZY_WEBHOOK_SECRET (signs the body when set)

use dotenv::dotenv;
use reqwest::Client;

use credits_webhook_backend::event::ORDER_CREATED;
use credits_webhook_backend::signature::{sign_body, SIGNATURE_HEADER};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let user_id = std::env::args()
        .nth(1)
        .ok_or("usage: send_test_webhook <user_id>")?;
    let url = std::env::var("WEBHOOK_URL")
        .unwrap_or_else(|_| "http://localhost:3000/webhook".to_string());

    let payload = serde_json::json!({
        "meta": {
            "event_name": ORDER_CREATED,
            "custom_data": { "user_id": user_id }
        },
        "data": {
            "id": "123",
            "attributes": { "total": 1000, "currency": "USD", "status": "paid" }
        }
    });
    // Sign exactly the bytes we send.
    let body = serde_json::to_vec(&payload)?;

    let mut req = Client::new()
        .post(&url)
        .header("Content-Type", "application/json");
    match std::env::var("LEMON_SQUEEZY_WEBHOOK_SECRET") {
        Ok(secret) if !secret.is_empty() => {
            req = req.header(SIGNATURE_HEADER, sign_body(&secret, &body));
        }
        _ => tracing::warn!("No secret set, sending unsigned delivery"),
    }

    tracing::info!(%url, %user_id, "Sending test webhook");
    let resp = req.body(body).send().await?;
    println!("Status Code: {}", resp.status());
    println!("Response: {}", resp.text().await?);

    Ok(())
}
