//! On-chain collaborators: the Merkle tree hook that tracks the latest
//! dispatched-message checkpoint, and the registry validators announce their
//! storage locations to.

use alloy::{
    primitives::{Address, B256},
    providers::{ProviderBuilder, RootProvider},
    sol,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::*;

use crate::errors::ContractError;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IMerkleTreeHook {
        function latestCheckpoint() external view returns (bytes32 root, uint32 index);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IValidatorAnnounce {
        function getAnnouncedStorageLocations(address[] calldata validators)
            external
            view
            returns (string[][] memory locations);
    }
}

pub type HttpProvider = RootProvider<Http<Client>>;

/// Read access to a Merkle tree hook contract.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MerkleTreeHook: Send + Sync {
    /// Returns the `(root, index)` of the latest checkpoint of the tree.
    async fn latest_checkpoint(&self) -> Result<(B256, u32), ContractError>;
}

/// Read access to a validator announcement registry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ValidatorAnnounce: Send + Sync {
    /// Returns, for each validator in order, every storage location it has
    /// announced, oldest first.
    async fn get_announced_storage_locations(
        &self,
        validators: &[Address],
    ) -> Result<Vec<Vec<String>>, ContractError>;
}

/// Builds an HTTP JSON-RPC provider for the given endpoint.
pub fn connect(rpc_url: &str) -> Result<HttpProvider, ContractError> {
    let url = rpc_url
        .trim()
        .parse()
        .map_err(|_| ContractError::InvalidRpcUrl(rpc_url.to_owned()))?;
    debug!(%rpc_url, "connecting rpc provider");
    Ok(ProviderBuilder::new().on_http(url))
}

pub struct MerkleTreeHookClient {
    inner: IMerkleTreeHook::IMerkleTreeHookInstance<Http<Client>, HttpProvider>,
}

impl MerkleTreeHookClient {
    pub fn new(address: Address, provider: HttpProvider) -> Self {
        Self {
            inner: IMerkleTreeHook::new(address, provider),
        }
    }

    pub fn address(&self) -> &Address {
        self.inner.address()
    }
}

#[async_trait]
impl MerkleTreeHook for MerkleTreeHookClient {
    async fn latest_checkpoint(&self) -> Result<(B256, u32), ContractError> {
        let IMerkleTreeHook::latestCheckpointReturn { root, index } =
            self.inner.latestCheckpoint().call().await?;
        trace!(address = %self.address(), %root, %index, "got latest checkpoint");
        Ok((root, index))
    }
}

pub struct ValidatorAnnounceClient {
    inner: IValidatorAnnounce::IValidatorAnnounceInstance<Http<Client>, HttpProvider>,
}

impl ValidatorAnnounceClient {
    pub fn new(address: Address, provider: HttpProvider) -> Self {
        Self {
            inner: IValidatorAnnounce::new(address, provider),
        }
    }

    pub fn address(&self) -> &Address {
        self.inner.address()
    }
}

#[async_trait]
impl ValidatorAnnounce for ValidatorAnnounceClient {
    async fn get_announced_storage_locations(
        &self,
        validators: &[Address],
    ) -> Result<Vec<Vec<String>>, ContractError> {
        let locations = self
            .inner
            .getAnnouncedStorageLocations(validators.to_vec())
            .call()
            .await?
            .locations;
        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_bad_url() {
        let err = connect("not a url").err().unwrap();
        assert!(matches!(err, ContractError::InvalidRpcUrl(u) if u == "not a url"));
    }

    #[tokio::test]
    async fn test_clients_keep_address() {
        let provider = connect("http://127.0.0.1:8545").expect("valid url");
        let hook_addr = Address::repeat_byte(0x11);
        let va_addr = Address::repeat_byte(0x22);

        let hook = MerkleTreeHookClient::new(hook_addr, provider.clone());
        let announce = ValidatorAnnounceClient::new(va_addr, provider);

        assert_eq!(*hook.address(), hook_addr);
        assert_eq!(*announce.address(), va_addr);
    }
}
