//! REST exchange client (Bybit v5 API).

use crate::balance::AccountMode;
use crate::client::{BoxFuture, ExchangeClient, SubmitAck};
use crate::error::{ExchangeError, RejectCode};
use arb_core::{InstrumentRules, OrderPrice, OrderRequest, OrderSide, Price, Size};
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Venue receive window in milliseconds.
const RECV_WINDOW_MS: u64 = 5000;

/// API credentials.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

/// Order creation request body (v5/order/create).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderBody {
    category: &'static str,
    symbol: String,
    side: &'static str,
    order_type: &'static str,
    qty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_in_force: Option<&'static str>,
    order_link_id: String,
}

/// Common v5 response envelope.
#[derive(Debug, Deserialize)]
struct V5Response {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    #[serde(default)]
    result: Value,
}

/// REST client for a Bybit v5 style derivatives venue.
pub struct RestExchangeClient {
    client: Client,
    base_url: String,
    credentials: ApiCredentials,
    timeout: Duration,
}

impl RestExchangeClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: ApiCredentials,
    ) -> Result<Self, ExchangeError> {
        Self::with_timeout(base_url, credentials, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        credentials: ApiCredentials,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
            timeout,
        })
    }

    /// v5 signature: HMAC-SHA256 over `timestamp + api_key + recv_window + payload`.
    fn sign(&self, timestamp_ms: i64, payload: &str) -> Result<String, ExchangeError> {
        let message = format!(
            "{timestamp_ms}{}{RECV_WINDOW_MS}{payload}",
            self.credentials.api_key
        );
        let mut mac = HmacSha256::new_from_slice(self.credentials.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Transport(format!("failed to init signer: {e}")))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ExchangeError {
        if e.is_timeout() {
            ExchangeError::Timeout(self.timeout)
        } else {
            ExchangeError::Transport(e.to_string())
        }
    }

    async fn signed_post(&self, path: &str, body: &impl Serialize) -> Result<Value, ExchangeError> {
        let raw_body = serde_json::to_string(body)
            .map_err(|e| ExchangeError::Transport(format!("failed to encode body: {e}")))?;
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let signature = self.sign(timestamp_ms, &raw_body)?;

        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("X-BAPI-API-KEY", &self.credentials.api_key)
            .header("X-BAPI-SIGN", signature)
            .header("X-BAPI-TIMESTAMP", timestamp_ms.to_string())
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW_MS.to_string())
            .header("Content-Type", "application/json")
            .body(raw_body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        self.unwrap_envelope(response).await
    }

    async fn signed_get(&self, path: &str, query: &str) -> Result<Value, ExchangeError> {
        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let signature = self.sign(timestamp_ms, query)?;

        let response = self
            .client
            .get(format!("{}{path}?{query}", self.base_url))
            .header("X-BAPI-API-KEY", &self.credentials.api_key)
            .header("X-BAPI-SIGN", signature)
            .header("X-BAPI-TIMESTAMP", timestamp_ms.to_string())
            .header("X-BAPI-RECV-WINDOW", RECV_WINDOW_MS.to_string())
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        self.unwrap_envelope(response).await
    }

    async fn public_get(&self, path: &str, query: &str) -> Result<Value, ExchangeError> {
        let response = self
            .client
            .get(format!("{}{path}?{query}", self.base_url))
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        self.unwrap_envelope(response).await
    }

    /// Parse the v5 envelope, mapping non-zero retCodes to rejections.
    async fn unwrap_envelope(&self, response: reqwest::Response) -> Result<Value, ExchangeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExchangeError::Transport(format!("HTTP {status}: {body}")));
        }

        let envelope: V5Response = response
            .json()
            .await
            .map_err(|e| ExchangeError::MalformedResponse(e.to_string()))?;

        if envelope.ret_code != 0 {
            let code = RejectCode::from_ret_code(envelope.ret_code);
            debug!(
                ret_code = envelope.ret_code,
                ret_msg = %envelope.ret_msg,
                classified = %code,
                "venue rejected request"
            );
            return Err(ExchangeError::Rejected(code));
        }

        Ok(envelope.result)
    }
}

fn side_str(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "Buy",
        OrderSide::Sell => "Sell",
    }
}

fn field_str<'a>(value: &'a Value, path: &[&str]) -> Result<&'a str, ExchangeError> {
    let mut current = value;
    for key in path {
        current = current
            .get(key)
            .ok_or_else(|| ExchangeError::MalformedResponse(format!("missing field {key}")))?;
    }
    current
        .as_str()
        .ok_or_else(|| ExchangeError::MalformedResponse(format!("field {path:?} is not a string")))
}

fn field_decimal(value: &Value, path: &[&str]) -> Result<Decimal, ExchangeError> {
    let raw = field_str(value, path)?;
    Decimal::from_str(raw)
        .map_err(|e| ExchangeError::MalformedResponse(format!("bad decimal {raw:?}: {e}")))
}

impl ExchangeClient for RestExchangeClient {
    fn submit_order(
        &self,
        request: &OrderRequest,
    ) -> BoxFuture<'_, Result<SubmitAck, ExchangeError>> {
        let body = CreateOrderBody {
            category: "linear",
            symbol: request.symbol.clone(),
            side: side_str(request.side),
            order_type: match request.price {
                OrderPrice::Limit(_) => "Limit",
                OrderPrice::Market { .. } => "Market",
            },
            qty: request.quantity.inner().to_string(),
            price: match request.price {
                OrderPrice::Limit(p) => Some(p.inner().to_string()),
                OrderPrice::Market { .. } => None,
            },
            time_in_force: match request.price {
                OrderPrice::Limit(_) => Some("GTC"),
                OrderPrice::Market { .. } => None,
            },
            order_link_id: request.cloid.to_string(),
        };

        Box::pin(async move {
            let result = self.signed_post("/v5/order/create", &body).await?;
            let order_id = field_str(&result, &["orderId"])?.to_string();
            info!(order_id = %order_id, cloid = %body.order_link_id, "order accepted");
            Ok(SubmitAck { order_id })
        })
    }

    fn query_balance(&self, mode: AccountMode) -> BoxFuture<'_, Result<Decimal, ExchangeError>> {
        Box::pin(async move {
            let query = format!("accountType={}", mode.as_str());
            let result = self
                .signed_get("/v5/account/wallet-balance", &query)
                .await?;

            let account = result
                .get("list")
                .and_then(|l| l.get(0))
                .ok_or_else(|| ExchangeError::MalformedResponse("empty account list".into()))?;

            match mode {
                // Unified accounts report a single cross-margin figure.
                AccountMode::Unified => field_decimal(account, &["totalAvailableBalance"]),
                // Contract accounts report per-coin; settlement is USDT.
                AccountMode::Contract => {
                    let coins = account
                        .get("coin")
                        .and_then(|c| c.as_array())
                        .ok_or_else(|| {
                            ExchangeError::MalformedResponse("missing coin list".into())
                        })?;
                    let usdt = coins
                        .iter()
                        .find(|c| c.get("coin").and_then(|v| v.as_str()) == Some("USDT"))
                        .ok_or_else(|| {
                            ExchangeError::MalformedResponse("no USDT entry in coin list".into())
                        })?;
                    field_decimal(usdt, &["availableToWithdraw"])
                }
            }
        })
    }

    fn fetch_instrument_rules(
        &self,
        symbol: &str,
    ) -> BoxFuture<'_, Result<InstrumentRules, ExchangeError>> {
        let query = format!("category=linear&symbol={symbol}");
        Box::pin(async move {
            let result = self.public_get("/v5/market/instruments-info", &query).await?;

            let instrument = result
                .get("list")
                .and_then(|l| l.get(0))
                .ok_or_else(|| ExchangeError::MalformedResponse("empty instrument list".into()))?;

            Ok(InstrumentRules {
                qty_step: Size::new(field_decimal(instrument, &["lotSizeFilter", "qtyStep"])?),
                min_qty: Size::new(field_decimal(instrument, &["lotSizeFilter", "minOrderQty"])?),
                min_notional: field_decimal(instrument, &["lotSizeFilter", "minNotionalValue"])?,
                price_tick: Price::new(field_decimal(instrument, &["priceFilter", "tickSize"])?),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_body_serialization() {
        let body = CreateOrderBody {
            category: "linear",
            symbol: "BTCUSDT".into(),
            side: "Buy",
            order_type: "Limit",
            qty: "0.012".into(),
            price: Some("60000.5".into()),
            time_in_force: Some("GTC"),
            order_link_id: "arb_123_abcd".into(),
        };
        let json: Value = serde_json::from_str(&serde_json::to_string(&body).unwrap()).unwrap();
        assert_eq!(json["category"], "linear");
        assert_eq!(json["orderType"], "Limit");
        assert_eq!(json["timeInForce"], "GTC");
        assert_eq!(json["orderLinkId"], "arb_123_abcd");
    }

    #[test]
    fn test_market_body_omits_price_and_tif() {
        let body = CreateOrderBody {
            category: "linear",
            symbol: "BTCUSDT".into(),
            side: "Sell",
            order_type: "Market",
            qty: "0.01".into(),
            price: None,
            time_in_force: None,
            order_link_id: "arb_456_efgh".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("price"));
        assert!(!json.contains("timeInForce"));
    }

    #[test]
    fn test_instrument_rules_parsing() {
        let result: Value = serde_json::json!({
            "list": [{
                "lotSizeFilter": {
                    "qtyStep": "0.001",
                    "minOrderQty": "0.001",
                    "minNotionalValue": "5"
                },
                "priceFilter": { "tickSize": "0.1" }
            }]
        });
        let instrument = result.get("list").and_then(|l| l.get(0)).unwrap();
        assert_eq!(
            field_decimal(instrument, &["lotSizeFilter", "qtyStep"]).unwrap(),
            dec!(0.001)
        );
        assert_eq!(
            field_decimal(instrument, &["priceFilter", "tickSize"]).unwrap(),
            dec!(0.1)
        );
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let value: Value = serde_json::json!({"a": {"b": "1"}});
        assert!(matches!(
            field_decimal(&value, &["a", "missing"]),
            Err(ExchangeError::MalformedResponse(_))
        ));
        assert!(matches!(
            field_decimal(&value, &["a", "b"]),
            Ok(d) if d == dec!(1)
        ));
    }

    #[test]
    fn test_envelope_error_classification() {
        let envelope: V5Response =
            serde_json::from_str(r#"{"retCode":110007,"retMsg":"ab not enough","result":{}}"#)
                .unwrap();
        assert_eq!(
            RejectCode::from_ret_code(envelope.ret_code),
            RejectCode::InsufficientBalance
        );
    }
}
