// src/eth/mod.rs

use ethers::prelude::*;

pub mod client;
pub mod contract;

abigen!(
    BetContract,
    "./abi/BetContract.json"
);
