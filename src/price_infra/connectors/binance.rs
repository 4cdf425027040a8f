use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::{WebSocketStream, connect_async, tungstenite::Message};
use tracing::Instrument;

use crate::config::StreamingConfig;
use crate::error::{Error, Result};
use crate::observability::metrics::{STREAM_MESSAGES, STREAM_RECONNECTS};
use crate::observability::tracing::trace_stream_session;
use crate::types::price::is_valid_price;

/// Last pushed price per stream symbol (`BTCUSDT`, ...). Overwrite only, no history.
#[derive(Clone, Debug, Default)]
pub struct StreamTable {
    inner: Arc<DashMap<String, f64>>,
}

impl StreamTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, symbol: &str, price: f64) {
        if !is_valid_price(price) {
            return;
        }
        self.inner.insert(symbol.to_ascii_uppercase(), price);
    }

    pub fn latest(&self, symbol: &str) -> Option<f64> {
        self.inner.get(&symbol.to_ascii_uppercase()).map(|q| *q)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub price: f64,
}

#[async_trait]
pub trait StreamConnector: Send {
    async fn connect(&mut self) -> Result<()>;
    async fn next_trade(&mut self) -> Result<Trade>;
    fn source_id(&self) -> &str;
}

/// Binance combined trade stream for a fixed symbol set.
pub struct BinanceConnector {
    source_id: String,
    ws_url: String,
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

impl BinanceConnector {
    pub fn new(base_url: &str, symbols: &[String]) -> Self {
        let streams = symbols
            .iter()
            .map(|s| format!("{}@trade", s.to_lowercase()))
            .collect::<Vec<_>>()
            .join("/");
        BinanceConnector {
            source_id: "binance".to_string(),
            ws_url: format!("{}/stream?streams={}", base_url.trim_end_matches('/'), streams),
            stream: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.ws_url
    }
}

#[async_trait]
impl StreamConnector for BinanceConnector {
    async fn connect(&mut self) -> Result<()> {
        self.stream = None;
        let (ws_stream, _) = connect_async(self.ws_url.as_str()).await?;
        self.stream = Some(ws_stream);
        tracing::info!("Connected to Binance: {}", self.ws_url);
        Ok(())
    }

    async fn next_trade(&mut self) -> Result<Trade> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        loop {
            let Some(msg) = stream.next().await else {
                self.stream = None;
                return Err(Error::ConnectionClosed);
            };

            match msg? {
                Message::Text(text) => {
                    if let Some(trade) = parse_trade(&text)? {
                        return Ok(trade);
                    }
                }
                Message::Close(_) => {
                    self.stream = None;
                    return Err(Error::ConnectionClosed);
                }
                _ => {}
            }
        }
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }
}

#[derive(Deserialize)]
struct CombinedEnvelope {
    data: BinanceTradeData,
}

#[derive(Deserialize)]
struct BinanceTradeData {
    #[serde(rename = "e")]
    event: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
}

/// Decode one combined-stream frame. Non-trade events yield `None`.
pub fn parse_trade(text: &str) -> Result<Option<Trade>> {
    let envelope: CombinedEnvelope = serde_json::from_str(text)
        .map_err(|e| Error::DeserializationError(e.to_string()))?;
    if envelope.data.event != "trade" {
        return Ok(None);
    }
    let price = envelope
        .data
        .price
        .parse::<f64>()
        .map_err(|_| Error::InvalidNumber(envelope.data.price.clone()))?;
    Ok(Some(Trade {
        symbol: envelope.data.symbol.to_ascii_uppercase(),
        price,
    }))
}

/// Capped exponential backoff: `base * 2^failures`, never above `max`.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn delay(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures.min(31)).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FeedState {
    Connecting { failures: u32 },
    Streaming { failures: u32 },
    Waiting { failures: u32, delay: Duration },
    Stopped,
}

/// Keeps a [`StreamTable`] fed from a connector, reconnecting until shut down.
pub struct StreamingFeed<C: StreamConnector> {
    connector: C,
    table: StreamTable,
    backoff: Backoff,
}

impl StreamingFeed<BinanceConnector> {
    pub fn binance(config: &StreamingConfig, ws_base: &str, table: StreamTable) -> Self {
        StreamingFeed::new(
            BinanceConnector::new(ws_base, &config.symbols),
            table,
            Backoff {
                base: Duration::from_millis(config.backoff_base_ms.max(1)),
                max: Duration::from_millis(config.backoff_max_ms.max(config.backoff_base_ms).max(1)),
            },
        )
    }
}

impl<C: StreamConnector> StreamingFeed<C> {
    pub fn new(connector: C, table: StreamTable, backoff: Backoff) -> Self {
        StreamingFeed { connector, table, backoff }
    }

    /// Drive the reconnect state machine until `shutdown` flips to true (or its
    /// sender goes away).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let span = trace_stream_session(self.connector.source_id());
        let mut state = FeedState::Connecting { failures: 0 };

        async move {
            loop {
                if *shutdown.borrow() {
                    state = FeedState::Stopped;
                }
                state = match state {
                    FeedState::Connecting { failures } => tokio::select! {
                        _ = shutdown.changed() => FeedState::Stopped,
                        result = self.connector.connect() => match result {
                            Ok(()) => FeedState::Streaming { failures },
                            Err(e) => {
                                tracing::warn!(error = %e, failures, "Stream connect failed");
                                FeedState::Waiting {
                                    failures: failures + 1,
                                    delay: self.backoff.delay(failures),
                                }
                            }
                        },
                    },
                    FeedState::Streaming { failures } => tokio::select! {
                        _ = shutdown.changed() => FeedState::Stopped,
                        (received, e) = self.pump() => {
                            tracing::warn!(error = %e, received, "Stream session ended");
                            // a session that delivered data resets the backoff
                            let failures = if received > 0 { 0 } else { failures };
                            FeedState::Waiting {
                                failures: failures + 1,
                                delay: self.backoff.delay(failures),
                            }
                        }
                    },
                    FeedState::Waiting { failures, delay } => {
                        STREAM_RECONNECTS.inc();
                        tokio::select! {
                            _ = shutdown.changed() => FeedState::Stopped,
                            _ = tokio::time::sleep(delay) => FeedState::Connecting { failures },
                        }
                    }
                    FeedState::Stopped => {
                        tracing::info!("Streaming feed stopped");
                        return;
                    }
                };
            }
        }
        .instrument(span)
        .await
    }

    /// Apply trades until the connection errors. Returns how many were applied.
    async fn pump(&mut self) -> (u64, Error) {
        let mut received = 0;
        loop {
            match self.connector.next_trade().await {
                Ok(trade) => {
                    self.table.record(&trade.symbol, trade.price);
                    STREAM_MESSAGES.inc();
                    received += 1;
                }
                Err(e) => return (received, e),
            }
        }
    }
}
