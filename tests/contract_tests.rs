//! Contract Backend Tests
//!
//! Runs the contract-backed ledger against a minimal JSON-RPC node that only
//! answers `eth_call` for `totalBets` and `getBet`, counting every request.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use ethers::abi::{Token, encode};
use ethers::types::{Address, U256};
use ethers::utils::id;
use serde_json::{Value, json};

use betcontract_gateway::config::ContractSettings;
use betcontract_gateway::error::LedgerError;
use betcontract_gateway::eth::{client::bet_contract, contract::BetContractLedger};
use betcontract_gateway::journal::Journal;
use betcontract_gateway::ledger::Ledger;
use betcontract_gateway::routes::{session, users};
use betcontract_gateway::state::AppState;
use betcontract_gateway::types::RegisterRequest;

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

struct Node {
    total_bets: U256,
    serve_bets: bool,
    requests: AtomicUsize,
}

fn selector(signature: &str) -> String {
    hex::encode(id(signature))
}

async fn rpc(State(node): State<Arc<Node>>, Json(req): Json<Value>) -> Json<Value> {
    node.requests.fetch_add(1, Ordering::SeqCst);
    let request_id = req["id"].clone();

    let call = &req["params"][0];
    let data = call["data"]
        .as_str()
        .or_else(|| call["input"].as_str())
        .unwrap_or_default()
        .trim_start_matches("0x")
        .to_string();

    let output = if data.starts_with(&selector("totalBets()")) {
        Some(encode(&[Token::Uint(node.total_bets)]))
    } else if data.starts_with(&selector("getBet(uint256)")) && node.serve_bets {
        let bet_id = U256::from_str_radix(&data[8..72], 16).unwrap();
        Some(encode(&[
            Token::String(format!("question {bet_id}")),
            Token::Array(vec![
                Token::String("yes".into()),
                Token::String("no".into()),
            ]),
            Token::Address(Address::repeat_byte(0xcc)),
            Token::Uint(U256::zero()),
            Token::Bool(false),
            Token::Uint(U256::zero()),
        ]))
    } else {
        None
    };

    match output {
        Some(bytes) => Json(json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "result": format!("0x{}", hex::encode(bytes)),
        })),
        None => Json(json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "error": { "code": 3, "message": "execution reverted" },
        })),
    }
}

async fn spawn_node(total_bets: U256, serve_bets: bool) -> (String, Arc<Node>) {
    let node = Arc::new(Node {
        total_bets,
        serve_bets,
        requests: AtomicUsize::new(0),
    });
    let app = Router::new().route("/", post(rpc)).with_state(node.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (url, node)
}

fn contract_ledger(rpc_url: &str) -> (Ledger, Address) {
    let settings = ContractSettings {
        rpc_url: rpc_url.to_string(),
        private_key: DEV_KEY.to_string(),
        contract_address: Address::repeat_byte(0x5f),
        chain_id: 1337,
    };
    let (contract, signer) = bet_contract(&settings).unwrap();
    let ledger = Ledger::Contract(Arc::new(BetContractLedger::new(contract, signer)));
    (ledger, signer)
}

// ============================================================================
// SIGNER CHECKS
// ============================================================================

#[tokio::test]
async fn test_foreign_caller_is_refused_before_any_rpc() {
    // Nothing listens here; a network call would fail with Remote instead.
    let (ledger, signer) = contract_ledger("http://127.0.0.1:9");
    let stranger = Address::repeat_byte(0x77);
    assert_ne!(stranger, signer);

    let err = ledger.register_user(stranger).await.unwrap_err();
    assert!(matches!(err, LedgerError::SignerMismatch));

    let err = ledger
        .place_bet(stranger, 0, 0, U256::one())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::SignerMismatch));

    let journal = Journal::connect("sqlite::memory:").await.unwrap();
    let state = AppState::new(ledger, journal);

    let err = users::register(State(state.clone()), Json(RegisterRequest { address: stranger }))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::FORBIDDEN);

    let Json(view) = session::create_session(State(state.clone())).await.unwrap();
    let err = session::connect(
        State(state.clone()),
        Path(view.id),
        Json(RegisterRequest { address: stranger }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::FORBIDDEN);

    let Json(view) = session::get_session(State(state), Path(view.id)).await.unwrap();
    assert!(view.session.wallet.is_none());
}

// ============================================================================
// BET LOADING
// ============================================================================

#[tokio::test]
async fn test_load_bets_reads_total_once() {
    let (url, node) = spawn_node(U256::from(3), true).await;
    let (ledger, _) = contract_ledger(&url);

    let bets = ledger.load_bets().await.unwrap();

    let ids: Vec<u64> = bets.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(bets[2].question, "question 2");
    assert_eq!(bets[0].choices, vec!["yes", "no"]);
    assert_eq!(bets[0].winning_choice, None);
    // One totalBets plus one getBet per bet.
    assert_eq!(node.requests.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_single_bet_lookup_checks_bounds() {
    let (url, node) = spawn_node(U256::from(1), true).await;
    let (ledger, _) = contract_ledger(&url);

    let err = ledger.get_bet(5).await.unwrap_err();
    assert!(matches!(err, LedgerError::BetNotFound(5)));
    assert_eq!(node.requests.load(Ordering::SeqCst), 1);

    let bet = ledger.get_bet(0).await.unwrap();
    assert_eq!(bet.question, "question 0");
}

#[tokio::test]
async fn test_huge_total_does_not_preallocate() {
    let (url, node) = spawn_node(U256::from(u64::MAX), false).await;
    let (ledger, _) = contract_ledger(&url);

    let err = ledger.load_bets().await.unwrap_err();
    assert!(matches!(err, LedgerError::Remote(_)));
    assert_eq!(node.requests.load(Ordering::SeqCst), 2);
}
