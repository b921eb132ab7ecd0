//! Santa ledger server: gift requests paid for in behavior points, parent
//! approvals, fulfilment tracking and the family wallet.

pub mod backend;
pub mod config;
