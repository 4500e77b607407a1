use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use uuid::Uuid;

use super::{failed, users::user_bets_for};
use crate::error::{LedgerError, reject};
use crate::session::{Board, CreateBetForm, Session, SessionError, Transition};
use crate::state::AppState;
use crate::types::{Receipt, RegisterRequest, WalletView};

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub session: Session,
    pub board: Board,
}

#[derive(Debug, Serialize)]
pub struct ConnectView {
    pub wallet: WalletView,
    pub view: SessionView,
}

#[derive(Debug, Serialize)]
pub struct ActionView {
    pub receipt: Receipt,
    pub view: SessionView,
}

fn invalid(e: SessionError) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Session not found".to_string())
}

fn load(state: &AppState, id: Uuid) -> Result<Session, (StatusCode, String)> {
    state.session(id).ok_or_else(not_found)
}

fn update(state: &AppState, id: Uuid, t: Transition) -> Result<Session, (StatusCode, String)> {
    state.update_session(id, t).ok_or_else(not_found)
}

async fn render(
    state: &AppState,
    id: Uuid,
    session: Session,
) -> Result<SessionView, (StatusCode, String)> {
    let user_bets = match session.wallet {
        Some(address) => user_bets_for(state, address).await?,
        None => Vec::new(),
    };

    Ok(SessionView {
        id,
        session,
        board: Board {
            bets: state.bets(),
            user_bets,
        },
    })
}

pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let (id, session) = state.open_session();
    tracing::debug!("Session {} opened", id);
    Ok(Json(render(&state, id, session).await?))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = load(&state, id)?;
    Ok(Json(render(&state, id, session).await?))
}

pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if !state.close_session(id) {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a wallet, registering it with the ledger on first sight.
pub async fn connect(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ConnectView>, (StatusCode, String)> {
    load(&state, id)?;
    let address = payload.address;

    if let Some(signer) = state.ledger.signer() {
        if signer != address {
            return Err(reject(LedgerError::SignerMismatch));
        }
    }

    let registered = state
        .ledger
        .registered_users(address)
        .await
        .map_err(failed("connect wallet"))?;

    let newly_registered = if registered {
        false
    } else {
        let receipt = state
            .ledger
            .register_user(address)
            .await
            .map_err(failed("register user"))?;
        state.after_call(&receipt).await;
        tracing::info!("User {:?} registered successfully", address);
        true
    };

    let session = update(&state, id, Transition::Connected(address))?;

    Ok(Json(ConnectView {
        wallet: WalletView {
            address,
            registered: true,
            newly_registered,
        },
        view: render(&state, id, session).await?,
    }))
}

pub async fn transition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(transition): Json<Transition>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = update(&state, id, transition)?;
    Ok(Json(render(&state, id, session).await?))
}

pub async fn create_bet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CreateBetForm>,
) -> Result<Json<ActionView>, (StatusCode, String)> {
    let session = load(&state, id)?;
    let caller = session.wallet().map_err(invalid)?;
    let (question, choices) = form.parse();

    let receipt = state
        .ledger
        .create_bet(caller, question, choices)
        .await
        .map_err(failed("create bet"))?;
    state.after_call(&receipt).await;

    let session = state
        .update_session(id, Transition::CloseCreateModal)
        .unwrap_or_else(|| session.apply(Transition::CloseCreateModal));

    Ok(Json(ActionView {
        receipt,
        view: render(&state, id, session).await?,
    }))
}

pub async fn place(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionView>, (StatusCode, String)> {
    let session = load(&state, id)?;
    let form = session.wager().map_err(invalid)?;

    let receipt = state
        .ledger
        .place_bet(form.caller, form.bet_id, form.choice, form.amount)
        .await
        .map_err(failed("place bet"))?;
    state.after_call(&receipt).await;
    let session = state.session(id).unwrap_or(session);

    Ok(Json(ActionView {
        receipt,
        view: render(&state, id, session).await?,
    }))
}

pub async fn declare(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionView>, (StatusCode, String)> {
    let session = load(&state, id)?;
    let form = session.declaration().map_err(invalid)?;

    let receipt = state
        .ledger
        .declare_winner(form.caller, form.bet_id, form.winning_choice)
        .await
        .map_err(failed("declare winner"))?;
    state.after_call(&receipt).await;
    let session = state.session(id).unwrap_or(session);

    Ok(Json(ActionView {
        receipt,
        view: render(&state, id, session).await?,
    }))
}
