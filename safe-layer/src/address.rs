//! Counterfactual Safe addresses.
//!
//! The proxy factory deploys with CREATE2, so the address of an owner's Safe is known
//! before it exists:
//!
//! `salt = keccak256(keccak256(initializer) ++ uint256(saltNonce))`
//! `initCodeHash = keccak256(proxyCreationCode ++ uint256(uint160(singleton)))`
//! `address = create2(factory, salt, initCodeHash)`

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use tracing::trace;

use crate::contracts::ISafe;

const LOG_TARGET: &str = "safe::address";

/// Owners needed to confirm a Safe transaction
pub const THRESHOLD: u64 = 1;

/// Fixed deployment parameters shared by every Safe the service creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeDeployment {
    pub proxy_factory: Address,
    pub master_copy: Address,
    pub fallback_handler: Address,
    pub salt_nonce: U256,
}

impl SafeDeployment {
    /// ABI encoded `setup` call making `owner` the sole owner
    pub fn initializer(&self, owner: Address) -> Bytes {
        let setup = ISafe::setupCall {
            owners: vec![owner],
            threshold: U256::from(THRESHOLD),
            to: Address::ZERO,
            data: Bytes::new(),
            fallbackHandler: self.fallback_handler,
            paymentToken: Address::ZERO,
            payment: U256::ZERO,
            paymentReceiver: Address::ZERO,
        };
        setup.abi_encode().into()
    }

    pub fn salt(&self, initializer: &[u8]) -> B256 {
        keccak256((keccak256(initializer), self.salt_nonce).abi_encode_packed())
    }

    pub fn init_code_hash(&self, proxy_creation_code: &[u8]) -> B256 {
        let singleton = U256::from_be_slice(self.master_copy.as_slice());
        keccak256((Bytes::copy_from_slice(proxy_creation_code), singleton).abi_encode_packed())
    }

    /// Address the factory will give `owner`'s Safe
    pub fn safe_address(&self, owner: Address, proxy_creation_code: &[u8]) -> Address {
        let initializer = self.initializer(owner);
        let salt = self.salt(&initializer);
        let init_code_hash = self.init_code_hash(proxy_creation_code);
        let address = self.proxy_factory.create2(salt, init_code_hash);

        trace!(target: LOG_TARGET, %owner, %salt, %init_code_hash, %address, "Derived safe address.");
        address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const CREATION_CODE: &[u8] = &[0x60, 0x80, 0x60, 0x40, 0x52];

    fn deployment() -> SafeDeployment {
        SafeDeployment {
            proxy_factory: address!("0xa6B71E26C5e0845f74c812102Ca7114b6a896AB2"),
            master_copy: address!("0xd9Db270c1B5E3Bd161E8c8503c55cEABeE709552"),
            fallback_handler: address!("0xf48f2B2d2a534e402487b3ee7C18c33Aec0Fe5e4"),
            salt_nonce: U256::from(7),
        }
    }

    #[test]
    fn initializer_is_a_single_owner_setup_call() {
        let owner = Address::repeat_byte(0x42);
        let initializer = deployment().initializer(owner);

        assert_eq!(&initializer[..4], ISafe::setupCall::SELECTOR.as_slice());
        let decoded = ISafe::setupCall::abi_decode(&initializer).unwrap();
        assert_eq!(decoded.owners, vec![owner]);
        assert_eq!(decoded.threshold, U256::from(THRESHOLD));
        assert_eq!(decoded.fallbackHandler, deployment().fallback_handler);
        assert_eq!(decoded.paymentReceiver, Address::ZERO);
    }

    #[test]
    fn salt_packs_initializer_hash_and_nonce() {
        let deployment = deployment();
        let initializer = deployment.initializer(Address::repeat_byte(1));

        let mut packed = keccak256(&initializer).to_vec();
        packed.extend_from_slice(&U256::from(7).to_be_bytes::<32>());
        assert_eq!(deployment.salt(&initializer), keccak256(packed));
    }

    #[test]
    fn init_code_hash_appends_singleton_word() {
        let deployment = deployment();

        let mut packed = CREATION_CODE.to_vec();
        packed.extend_from_slice(&[0u8; 12]);
        packed.extend_from_slice(deployment.master_copy.as_slice());
        assert_eq!(deployment.init_code_hash(CREATION_CODE), keccak256(packed));
    }

    #[test]
    fn address_follows_create2() {
        let deployment = deployment();
        let owner = Address::repeat_byte(9);
        let salt = deployment.salt(&deployment.initializer(owner));
        let init_code_hash = deployment.init_code_hash(CREATION_CODE);

        let mut preimage = vec![0xff];
        preimage.extend_from_slice(deployment.proxy_factory.as_slice());
        preimage.extend_from_slice(salt.as_slice());
        preimage.extend_from_slice(init_code_hash.as_slice());
        let expected = Address::from_slice(&keccak256(preimage)[12..]);

        assert_eq!(deployment.safe_address(owner, CREATION_CODE), expected);
    }

    #[test]
    fn owner_and_nonce_change_the_address() {
        let deployment = deployment();
        let alice = deployment.safe_address(Address::repeat_byte(1), CREATION_CODE);
        let bob = deployment.safe_address(Address::repeat_byte(2), CREATION_CODE);
        assert_ne!(alice, bob);
        assert_eq!(alice, deployment.safe_address(Address::repeat_byte(1), CREATION_CODE));

        let other_nonce = SafeDeployment { salt_nonce: U256::from(8), ..deployment };
        assert_ne!(alice, other_nonce.safe_address(Address::repeat_byte(1), CREATION_CODE));
    }
}
