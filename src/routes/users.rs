use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use ethers::types::Address;

use super::{failed, internal};
use crate::state::AppState;
use crate::types::{Receipt, RegisterRequest, UserBet, UserSummary};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Receipt>, (StatusCode, String)> {
    let receipt = state
        .ledger
        .register_user(payload.address)
        .await
        .map_err(failed("register user"))?;

    state.after_call(&receipt).await;
    tracing::info!("User {:?} registered", payload.address);

    Ok(Json(receipt))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(address): Path<Address>,
) -> Result<Json<UserSummary>, (StatusCode, String)> {
    let registered = state
        .ledger
        .registered_users(address)
        .await
        .map_err(failed("load user"))?;
    let winnings = state
        .ledger
        .winnings(address)
        .await
        .map_err(failed("load winnings"))?;

    Ok(Json(UserSummary {
        address,
        registered,
        winnings,
    }))
}

pub async fn user_bets(
    State(state): State<AppState>,
    Path(address): Path<Address>,
) -> Result<Json<Vec<UserBet>>, (StatusCode, String)> {
    Ok(Json(user_bets_for(&state, address).await?))
}

/// Board bets the address has a wager on, with the wager detail the journal holds.
pub async fn user_bets_for(
    state: &AppState,
    address: Address,
) -> Result<Vec<UserBet>, (StatusCode, String)> {
    let mut wagers: HashMap<u64, _> = state
        .journal
        .user_wagers(address)
        .await
        .map_err(internal)?
        .into_iter()
        .map(|w| (w.bet_id, w))
        .collect();

    let mut out = Vec::new();
    for bet in state.bets() {
        let placed = state
            .ledger
            .user_bet_placed(address, bet.id)
            .await
            .map_err(failed("load user bets"))?;
        if placed {
            let wager = wagers.remove(&bet.id);
            out.push(UserBet { bet, wager });
        }
    }
    Ok(out)
}
