use std::sync::Arc;

use crate::{
    error::ApiResult,
    main_lib::AppState,
    models::{NewStockAlert, TrackedStock, TrackedStocksResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use moex_market_data::QuoteMap;
use moex_quote_cache::{evaluate_all, StockAlert};

/// Fresh prices if any, otherwise an empty map so alerts still list.
async fn current_prices(state: &AppState) -> QuoteMap {
    match state.quote_cache.get_prices().await {
        Ok(prices) => prices,
        Err(e) => {
            tracing::debug!("Listing alerts without prices: {}", e);
            QuoteMap::new()
        }
    }
}

async fn list_tracked_stocks(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<TrackedStocksResponse>> {
    let alerts = state.alert_store.list().await?;
    let prices = current_prices(&state).await;
    let prices_updated_at = if prices.is_empty() {
        None
    } else {
        state.quote_cache.get_last_update_time().await
    };

    let stocks = evaluate_all(alerts, &prices)
        .into_iter()
        .map(|(alert, price, signal)| TrackedStock::new(alert, price, signal))
        .collect();
    Ok(Json(TrackedStocksResponse {
        stocks,
        prices_updated_at,
    }))
}

async fn add_stock_alert(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewStockAlert>,
) -> ApiResult<(StatusCode, Json<TrackedStock>)> {
    let alert = StockAlert::new(&body.ticker, body.buy_price, body.sell_price)?;
    state.alert_store.upsert(&alert).await?;

    let price = current_prices(&state).await.get(&alert.ticker).copied();
    let signal = alert.evaluate(price);
    Ok((
        StatusCode::CREATED,
        Json(TrackedStock::new(alert, price, signal)),
    ))
}

async fn delete_stock_alert(
    Path(ticker): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    state.alert_store.remove(&ticker).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracked-stocks", get(list_tracked_stocks))
        .route("/stock-alerts", post(add_stock_alert))
        .route("/stock-alerts/{ticker}", delete(delete_stock_alert))
}
