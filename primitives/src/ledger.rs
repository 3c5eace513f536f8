use alloy_primitives::{hex, Address, B256};
use chrono::{DateTime, Utc};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::common::{SafeError, SafeResponse};

/// Which backend transaction produced a ledger entry
#[derive(Debug, Clone, Copy, Encode, Decode, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LedgerKind {
    Deploy,
    Exec,
}

/// A transaction the service submitted on behalf of an owner.
/// Stored SCALE encoded, keyed by the owner address.
#[derive(Debug, Clone, Encode, Decode, PartialEq, Eq)]
pub struct LedgerEntry {
    pub kind: LedgerKind,
    pub owner: [u8; 20],
    pub safe: [u8; 20],
    pub block_hash: [u8; 32],
    pub transaction_hash: [u8; 32],
    // unix seconds
    pub recorded_at: i64,
}

impl LedgerEntry {
    pub fn from_response(
        kind: LedgerKind,
        owner: Address,
        response: &SafeResponse,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, SafeError> {
        let safe = response
            .safe_address
            .parse::<Address>()
            .map_err(|e| SafeError::BadAddress(format!("safe address: {e}")))?;
        let block_hash = parse_hash("block hash", &response.block_hash)?;
        let transaction_hash = parse_hash("transaction hash", &response.transaction_hash)?;

        Ok(Self {
            kind,
            owner: owner.0.0,
            safe: safe.0.0,
            block_hash: block_hash.0,
            transaction_hash: transaction_hash.0,
            recorded_at: recorded_at.timestamp(),
        })
    }
}

fn parse_hash(what: &str, value: &str) -> Result<B256, SafeError> {
    value.parse::<B256>().map_err(|e| SafeError::BadParams(format!("{what}: {e}")))
}

/// JSON view of a `LedgerEntry` returned by `safe_history`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub kind: LedgerKind,
    pub owner: String,
    pub safe_address: String,
    pub block_hash: String,
    pub transaction_hash: String,
    pub recorded_at: String,
}

impl From<&LedgerEntry> for LedgerRecord {
    fn from(entry: &LedgerEntry) -> Self {
        let recorded_at = DateTime::<Utc>::from_timestamp(entry.recorded_at, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        Self {
            kind: entry.kind,
            owner: Address::from(entry.owner).to_checksum(None),
            safe_address: Address::from(entry.safe).to_checksum(None),
            block_hash: hex::encode_prefixed(entry.block_hash),
            transaction_hash: hex::encode_prefixed(entry.transaction_hash),
            recorded_at,
        }
    }
}
