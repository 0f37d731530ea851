use mongodb::Client;
use mongodb::bson::doc;
use std::time::Instant;

/// Pings the `admin` database.
pub async fn check_health(client: &Client) -> bool {
    let start = Instant::now();
    let result = client.database("admin").run_command(doc! { "ping": 1 }).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => {
            tracing::debug!(elapsed_ms, "MongoDB ping succeeded");
            true
        }
        Err(e) => {
            tracing::warn!(elapsed_ms, error = %e, "MongoDB ping failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a running MongoDB
    async fn test_check_health() {
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        assert!(check_health(&client).await);
    }
}
