use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{failed, internal};
use crate::journal::JournalEntry;
use crate::state::AppState;
use crate::types::{Bet, CreateBetRequest, DeclareWinnerRequest, PlaceBetRequest, Receipt};

pub async fn list_bets(State(state): State<AppState>) -> Json<Vec<Bet>> {
    Json(state.bets())
}

pub async fn create_bet(
    State(state): State<AppState>,
    Json(payload): Json<CreateBetRequest>,
) -> Result<Json<Receipt>, (StatusCode, String)> {
    let receipt = state
        .ledger
        .create_bet(payload.caller, payload.question, payload.choices)
        .await
        .map_err(failed("create bet"))?;

    state.after_call(&receipt).await;
    tracing::info!("Bet created by {:?} in {}", payload.caller, receipt.tx_hash);

    Ok(Json(receipt))
}

pub async fn get_bet(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Bet>, (StatusCode, String)> {
    let bet = state.ledger.get_bet(id).await.map_err(failed("load bet"))?;
    Ok(Json(bet))
}

pub async fn bet_events(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<JournalEntry>>, (StatusCode, String)> {
    state.ledger.get_bet(id).await.map_err(failed("load bet"))?;
    let entries = state.journal.events_for_bet(id).await.map_err(internal)?;
    Ok(Json(entries))
}

pub async fn place_bet(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<PlaceBetRequest>,
) -> Result<Json<Receipt>, (StatusCode, String)> {
    let receipt = state
        .ledger
        .place_bet(payload.caller, id, payload.choice, payload.amount)
        .await
        .map_err(failed("place bet"))?;

    state.after_call(&receipt).await;
    tracing::info!(
        "Bet {} wagered: {} wei on choice {} by {:?}",
        id,
        payload.amount,
        payload.choice,
        payload.caller
    );

    Ok(Json(receipt))
}

pub async fn declare_winner(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<DeclareWinnerRequest>,
) -> Result<Json<Receipt>, (StatusCode, String)> {
    let receipt = state
        .ledger
        .declare_winner(payload.caller, id, payload.choice)
        .await
        .map_err(failed("declare winner"))?;

    state.after_call(&receipt).await;
    tracing::info!("Bet {} resolved: choice {}", id, payload.choice);

    Ok(Json(receipt))
}
