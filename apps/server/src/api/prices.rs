use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{PricesResponse, TickerPrice},
};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

/// All cached prices with their write time.
async fn get_prices(State(state): State<Arc<AppState>>) -> ApiResult<Json<PricesResponse>> {
    let prices = state.quote_cache.get_prices().await?;
    let updated_at = state.quote_cache.get_last_update_time().await;
    Ok(Json(PricesResponse { prices, updated_at }))
}

/// Cached price of one ticker (case-insensitive).
async fn get_ticker_price(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<TickerPrice>> {
    let ticker = ticker.trim().to_uppercase();
    let prices = state.quote_cache.get_prices().await?;
    let price = prices.get(&ticker).copied().ok_or(ApiError::NotFound)?;
    let updated_at = state.quote_cache.get_last_update_time().await;
    Ok(Json(TickerPrice {
        ticker,
        price,
        updated_at,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prices", get(get_prices))
        .route("/prices/{ticker}", get(get_ticker_price))
}
