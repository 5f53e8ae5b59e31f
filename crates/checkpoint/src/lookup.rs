//! Best-effort lookups. Every failure is logged at debug level and reported
//! as `None`, which callers should read as "cannot currently assess".

use alloy::primitives::Address;
use tracing::*;

use crate::{
    contracts::{MerkleTreeHook, ValidatorAnnounce},
    storage::ValidatorFactory,
};

/// Latest checkpoint a validator published, and where it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorCheckpoint {
    pub index: u32,
    pub url: String,
}

fn on_chain(chain: Option<&str>) -> String {
    chain.map(|c| format!(" on {c}")).unwrap_or_default()
}

/// Fetches the index of the latest checkpoint recorded by the Merkle tree hook.
pub async fn latest_merkle_tree_checkpoint_index(
    hook: &impl MerkleTreeHook,
    chain: Option<&str>,
) -> Option<u32> {
    match hook.latest_checkpoint().await {
        Ok((_root, index)) => Some(index),
        Err(err) => {
            debug!(
                %err,
                "failed to get latest checkpoint index from merkle tree hook contract{}",
                on_chain(chain)
            );
            None
        }
    }
}

/// Fetches the storage locations each validator announced, in the order the
/// validators were given.
pub async fn validator_storage_locations(
    announce: &impl ValidatorAnnounce,
    validators: &[Address],
    chain: Option<&str>,
) -> Option<Vec<Vec<String>>> {
    match announce.get_announced_storage_locations(validators).await {
        Ok(locations) => Some(locations),
        Err(err) => {
            debug!(
                %err,
                "failed to get announced storage locations from validator announce contract{}",
                on_chain(chain)
            );
            None
        }
    }
}

/// Fetches the latest checkpoint index a validator published at a storage
/// location, along with the URL it was read from.
pub async fn latest_validator_checkpoint(
    factory: &impl ValidatorFactory,
    storage_location: &str,
) -> Option<ValidatorCheckpoint> {
    let validator = match factory.from_storage_location(storage_location).await {
        Ok(v) => v,
        Err(err) => {
            debug!(%err, "failed to instantiate validator at location {storage_location}");
            return None;
        }
    };

    match validator.latest_checkpoint_index().await {
        Ok(index) => Some(ValidatorCheckpoint {
            index,
            url: validator.latest_checkpoint_url(),
        }),
        Err(err) => {
            debug!(
                %err,
                "failed to get latest checkpoint index from validator at location {storage_location}"
            );
            None
        }
    }
}
