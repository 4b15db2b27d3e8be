use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tracing::{info, warn};
use url::Url;

use common::{ConditionEvent, Result};

/// WebSocket stream of screening-condition membership events from the
/// broker bridge.
///
/// Parses each text frame into a `ConditionEvent` and forwards it to the
/// controller's condition channel. Reconnects automatically with
/// exponential backoff.
pub struct ConditionStream {
    ws_url: String,
    condition_tx: mpsc::Sender<ConditionEvent>,
}

impl ConditionStream {
    pub fn new(ws_url: impl Into<String>, condition_tx: mpsc::Sender<ConditionEvent>) -> Self {
        Self {
            ws_url: ws_url.into(),
            condition_tx,
        }
    }

    /// Run the stream loop forever, reconnecting on failure.
    /// Call this inside a `tokio::spawn`.
    pub async fn run(self) {
        let mut backoff = Duration::from_secs(1);
        const MAX_BACKOFF: Duration = Duration::from_secs(60);

        loop {
            info!(url = %self.ws_url, "Connecting to condition feed");
            match self.connect_once().await {
                Ok(()) => {
                    info!("Condition feed closed cleanly");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    backoff = Duration::from_secs(1);
                }
                Err(e) => {
                    warn!(error = %e, backoff = ?backoff, "Condition feed error, reconnecting");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    async fn connect_once(&self) -> Result<()> {
        let url =
            Url::parse(&self.ws_url).map_err(|e| common::Error::WebSocket(e.to_string()))?;

        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| common::Error::WebSocket(e.to_string()))?;

        let (_, mut read) = ws_stream.split();

        while let Some(msg) = read.next().await {
            let msg = msg.map_err(|e| common::Error::WebSocket(e.to_string()))?;

            if let tokio_tungstenite::tungstenite::Message::Text(text) = msg {
                match parse_condition_event(&text) {
                    Ok(event) => {
                        // A closed receiver means the controller is gone.
                        if self.condition_tx.send(event).await.is_err() {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to parse condition event");
                    }
                }
            }
        }

        Ok(())
    }
}

fn parse_condition_event(text: &str) -> Result<ConditionEvent> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entered_and_exited_frames_parse() {
        let ev = parse_condition_event(r#"{"event":"entered","code":"005930"}"#).unwrap();
        assert!(matches!(ev, ConditionEvent::Entered { code } if code == "005930"));

        let ev = parse_condition_event(r#"{"event":"exited","code":"035720"}"#).unwrap();
        assert!(matches!(ev, ConditionEvent::Exited { code } if code == "035720"));
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(parse_condition_event("not json").is_err());
        assert!(parse_condition_event(r#"{"event":"unknown","code":"005930"}"#).is_err());
    }
}
