use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use common::{
    Candle, Error, MarketGateway, OrderResult, OrderSide, Position, Quote, Result,
};

/// REST client for the broker bridge running next to the bot.
///
/// The bridge wraps the broker's session-bound desktop API behind plain
/// HTTP. Requests are signed with a shared secret so a stray process on the
/// same host cannot place orders.
pub struct BridgeClient {
    base_url: String,
    secret: String,
    http: Client,
}

impl BridgeClient {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            secret: secret.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    fn timestamp_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64
    }

    /// HMAC-SHA256 over `{timestamp}{method}{path}{body}`, hex-encoded.
    fn sign(&self, ts: u64, method: &str, path: &str, body: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(format!("{ts}{method}{path}{body}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn signed_get(&self, path: &str) -> Result<String> {
        let ts = Self::timestamp_ms();
        let signature = self.sign(ts, "GET", path, "");
        let url = format!("{}{path}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .header("X-Timestamp", ts.to_string())
            .header("X-Signature", signature)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Gateway(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }

    async fn signed_post(&self, path: &str, body: String) -> Result<String> {
        let ts = Self::timestamp_ms();
        let signature = self.sign(ts, "POST", path, &body);
        let url = format!("{}{path}", self.base_url);

        let resp = self
            .http
            .post(&url)
            .header("X-Timestamp", ts.to_string())
            .header("X-Signature", signature)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Gateway(format!("HTTP {status}: {text}")));
        }
        Ok(text)
    }
}

#[async_trait]
impl MarketGateway for BridgeClient {
    async fn is_connected(&self) -> bool {
        let Ok(body) = self.signed_get("/api/session").await else {
            return false;
        };
        serde_json::from_str::<SessionResponse>(&body)
            .map(|s| s.connected)
            .unwrap_or(false)
    }

    async fn quote(&self, code: &str) -> Result<Quote> {
        let body = self.signed_get(&format!("/api/quote/{code}")).await?;
        let quote: Quote =
            serde_json::from_str(&body).map_err(|e| Error::Gateway(e.to_string()))?;
        Ok(quote)
    }

    async fn daily_candles(&self, code: &str, count: usize) -> Result<Vec<Candle>> {
        let body = self
            .signed_get(&format!("/api/candles/{code}?count={count}"))
            .await?;
        let candles: Vec<Candle> =
            serde_json::from_str(&body).map_err(|e| Error::Gateway(e.to_string()))?;
        Ok(candles)
    }

    async fn cash_available(&self) -> Result<i64> {
        let body = self.signed_get("/api/account/cash").await?;
        let cash: CashResponse =
            serde_json::from_str(&body).map_err(|e| Error::Gateway(e.to_string()))?;
        Ok(cash.cash)
    }

    async fn holdings(&self) -> Result<Vec<Position>> {
        let body = self.signed_get("/api/account/holdings").await?;
        let holdings: Vec<Position> =
            serde_json::from_str(&body).map_err(|e| Error::Gateway(e.to_string()))?;
        Ok(holdings)
    }

    async fn submit_order(
        &self,
        side: OrderSide,
        code: &str,
        qty: i64,
        price: i64,
    ) -> Result<OrderResult> {
        let payload = serde_json::json!({
            "side": side,
            "code": code,
            "qty": qty,
            "price": price,
        });

        debug!(code, %side, qty, price, "Submitting order to bridge");
        let body = self.signed_post("/api/order", payload.to_string()).await?;

        let resp: OrderResponse =
            serde_json::from_str(&body).map_err(|e| Error::Gateway(e.to_string()))?;

        if resp.accepted {
            Ok(OrderResult::Accepted)
        } else {
            Ok(OrderResult::Rejected(
                resp.reason.unwrap_or_else(|| "unspecified".to_string()),
            ))
        }
    }
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SessionResponse {
    connected: bool,
}

#[derive(Deserialize)]
struct CashResponse {
    cash: i64,
}

#[derive(Deserialize)]
struct OrderResponse {
    accepted: bool,
    #[serde(default)]
    reason: Option<String>,
}
