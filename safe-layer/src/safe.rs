use std::sync::Arc;

use async_trait::async_trait;
use primitives::{SafeCall, SafeError, SafeInfo, SafeResponse};

/// Backend able to locate, deploy and drive the Safe of an owner.
/// `owner` is the hex address of the user, malformed values are `SafeError::BadAddress`.
#[async_trait]
pub trait Safe: Send + Sync {
    async fn info(&self, owner: &str) -> Result<SafeInfo, SafeError>;

    /// Fails with `SafeError::AlreadyExists` when the proxy already has code
    async fn deploy(&self, owner: &str) -> Result<SafeResponse, SafeError>;

    /// Fails with `SafeError::NotDeployed` when there is no proxy to call
    async fn exec(&self, owner: &str, call: SafeCall) -> Result<SafeResponse, SafeError>;
}

pub type SharedSafe = Arc<dyn Safe + 'static>;
