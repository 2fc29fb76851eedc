//! # Exchange Rate Commands

use lonestar_core::CurrencyRate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ApiResponse, CommandResult};
use crate::currency::RateUpdate;
use crate::Engine;

/// New LRD-per-USD rate, e.g. `{ "rate": 198.5 }`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub rate: f64,
}

pub async fn get_rate(engine: &Engine) -> CommandResult<CurrencyRate> {
    let rate = engine.currency().get_current_rate().await?;
    Ok(ApiResponse::ok(rate))
}

pub async fn update_rate(engine: &Engine, request: RateRequest) -> CommandResult<RateUpdate> {
    let update = engine.currency().update_rate(request.rate).await?;
    Ok(ApiResponse::ok(update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;

    #[tokio::test]
    async fn test_rate_commands() {
        let engine = Engine::in_memory(EngineConfig::default()).await.unwrap();

        let current = get_rate(&engine).await.unwrap();
        assert_eq!(current.status, 200);
        assert_eq!(current.body.rate.as_decimal(), 197.0);

        let updated = update_rate(&engine, RateRequest { rate: 200.0 }).await.unwrap();
        assert_eq!(updated.body.rate.rate.as_decimal(), 200.0);

        let invalid = update_rate(&engine, RateRequest { rate: 0.0 }).await.unwrap_err();
        assert_eq!(invalid.status(), 400);
        assert_eq!(get_rate(&engine).await.unwrap().body.rate.as_decimal(), 200.0);
    }
}
