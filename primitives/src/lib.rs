pub use common::*;
pub use forking::*;
pub use ledger::*;

pub mod forking;
pub mod ledger;

pub mod common {

    use alloy_primitives::{hex, Address, Bytes, B256};
    use serde::{Deserialize, Serialize};

    /// JSON-RPC error code for malformed addresses and parameters
    pub const INVALID_PARAMS_CODE: i32 = -32602;
    pub const ALREADY_EXISTS_CODE: i32 = 1001;
    pub const NOT_DEPLOYED_CODE: i32 = 1002;
    pub const REVERTED_CODE: i32 = 1003;
    /// Upstream Ethereum node failed or is unreachable
    pub const RPC_UNAVAILABLE_CODE: i32 = 1004;

    /// Counterfactual Safe account owned by a single user
    /// `address`: EIP-55 checksummed CREATE2 address of the proxy
    /// `is_deployed`: whether the proxy already has code on chain
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SafeInfo {
        pub address: String,
        pub is_deployed: bool,
    }

    /// Outcome of a mined transaction sent by the backend signer
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SafeResponse {
        pub safe_address: String,
        pub block_hash: String,
        pub transaction_hash: String,
    }

    impl SafeResponse {
        pub fn new(safe_address: Address, block_hash: B256, transaction_hash: B256) -> Self {
            Self {
                safe_address: safe_address.to_checksum(None),
                block_hash: hex::encode_prefixed(block_hash),
                transaction_hash: hex::encode_prefixed(transaction_hash),
            }
        }
    }

    /// Arguments of `execTransaction` on an owner's Safe.
    /// Numeric fields are decimal strings so that full `uint256` values survive JSON,
    /// `signatures` are the owner signatures already packed the way the Safe expects them.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SafeCall {
        pub to: String,
        pub value: String,
        #[serde(default)]
        pub data: Bytes,
        pub operation: u8,
        pub safe_tx_gas: String,
        pub base_gas: String,
        pub gas_price: String,
        pub gas_token: String,
        pub refund_receiver: String,
        #[serde(default)]
        pub signatures: Bytes,
    }

    /// Safe `Enum.Operation`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(u8)]
    pub enum Operation {
        Call = 0,
        DelegateCall = 1,
    }

    impl TryFrom<u8> for Operation {
        type Error = SafeError;

        fn try_from(value: u8) -> Result<Self, Self::Error> {
            match value {
                0 => Ok(Operation::Call),
                1 => Ok(Operation::DelegateCall),
                other => Err(SafeError::BadParams(format!(
                    "unknown operation variant {other}"
                ))),
            }
        }
    }

    impl From<Operation> for u8 {
        fn from(value: Operation) -> Self {
            value as u8
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum SafeError {
        #[error("Safe is already deployed")]
        AlreadyExists,
        #[error("Safe is not deployed")]
        NotDeployed,
        #[error("Invalid address: {0}")]
        BadAddress(String),
        #[error("Bad parameters passed: {0}")]
        BadParams(String),
        #[error("Rpc unavailable: {0}")]
        Rpc(String),
        #[error("Transaction reverted: {0}")]
        Reverted(String),
    }

    impl SafeError {
        /// Stable JSON-RPC error code for this failure
        pub fn code(&self) -> i32 {
            match self {
                SafeError::BadAddress(_) | SafeError::BadParams(_) => INVALID_PARAMS_CODE,
                SafeError::AlreadyExists => ALREADY_EXISTS_CODE,
                SafeError::NotDeployed => NOT_DEPLOYED_CODE,
                SafeError::Reverted(_) => REVERTED_CODE,
                SafeError::Rpc(_) => RPC_UNAVAILABLE_CODE,
            }
        }
    }

    /// Parse a hex address, mapping failures to `SafeError::BadAddress`
    pub fn parse_address(field: &str, value: &str) -> Result<Address, SafeError> {
        value
            .trim()
            .parse::<Address>()
            .map_err(|e| SafeError::BadAddress(format!("{field} `{value}`: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use assert_matches::assert_matches;

    #[test]
    fn operation_accepts_only_call_and_delegate_call() {
        assert_eq!(Operation::try_from(0).unwrap(), Operation::Call);
        assert_eq!(Operation::try_from(1).unwrap(), Operation::DelegateCall);
        assert_matches!(Operation::try_from(2), Err(SafeError::BadParams(_)));
        assert_eq!(u8::from(Operation::DelegateCall), 1);
    }

    #[test]
    fn error_codes_split_client_and_upstream_failures() {
        assert_eq!(SafeError::BadAddress("x".into()).code(), INVALID_PARAMS_CODE);
        assert_eq!(SafeError::BadParams("x".into()).code(), INVALID_PARAMS_CODE);
        assert_eq!(SafeError::Rpc("down".into()).code(), RPC_UNAVAILABLE_CODE);
        assert_ne!(SafeError::AlreadyExists.code(), SafeError::NotDeployed.code());
    }

    #[test]
    fn safe_response_is_camel_case_hex() {
        let response = SafeResponse::new(Address::repeat_byte(0xab), B256::repeat_byte(1), B256::ZERO);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["blockHash"], format!("0x{}", "01".repeat(32)));
        assert_eq!(json["transactionHash"], format!("0x{}", "00".repeat(32)));
        assert!(json["safeAddress"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn safe_call_reads_hex_bytes() {
        let call: SafeCall = serde_json::from_str(
            r#"{
                "to": "0x0000000000000000000000000000000000000001",
                "value": "0",
                "data": "0xdeadbeef",
                "operation": 0,
                "safeTxGas": "0",
                "baseGas": "0",
                "gasPrice": "0",
                "gasToken": "0x0000000000000000000000000000000000000000",
                "refundReceiver": "0x0000000000000000000000000000000000000000",
                "signatures": "0x"
            }"#,
        )
        .unwrap();

        assert_eq!(call.data.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
        assert!(call.signatures.is_empty());
    }

    #[test]
    fn bad_address_names_the_field() {
        let err = parse_address("gasToken", "0x12").unwrap_err();
        assert_matches!(err, SafeError::BadAddress(msg) if msg.contains("gasToken"));
    }
}
