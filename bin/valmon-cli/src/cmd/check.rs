use alloy::primitives::Address;
use argh::FromArgs;
use console::Term;
use futures::future::join_all;
use tracing::*;
use valmon_checkpoint::{
    contracts::{
        self, MerkleTreeHook, MerkleTreeHookClient, ValidatorAnnounce, ValidatorAnnounceClient,
    },
    latest_merkle_tree_checkpoint_index,
    storage::{StorageValidatorFactory, ValidatorFactory},
    validator_storage_locations,
};

use crate::{
    errors::{CliError, UserInputError},
    report::{check_validator, styled_row, ValidatorReport},
    settings::{parse_address, ChainSettingsFromFile, Settings},
};

/// Checks whether validators are signing the latest checkpoint of a chain
#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "check")]
pub struct CheckArgs {
    /// chain name, used to look up its settings in the config file
    #[argh(option)]
    chain: String,

    /// validator address to check, may be repeated or comma separated
    #[argh(option, short = 'v')]
    validator: Vec<String>,

    /// json-rpc url of the chain (overrides the config file)
    #[argh(option)]
    rpc_url: Option<String>,

    /// address of the merkle tree hook contract (overrides the config file)
    #[argh(option)]
    merkle_tree_hook: Option<String>,

    /// address of the validator announce contract (overrides the config file)
    #[argh(option)]
    validator_announce: Option<String>,

    /// path-style endpoint to read s3:// and gs:// checkpoint stores through
    #[argh(option)]
    storage_endpoint: Option<String>,
}

pub async fn check(args: CheckArgs, settings: Settings) -> Result<(), CliError> {
    let validators = parse_validators(&args.validator)?;
    let chain = settings.resolve_chain(
        &args.chain,
        ChainSettingsFromFile {
            rpc_url: args.rpc_url,
            merkle_tree_hook: args.merkle_tree_hook,
            validator_announce: args.validator_announce,
        },
    )?;

    let provider =
        contracts::connect(&chain.rpc_url).map_err(|e| CliError::Internal(e.into()))?;
    let hook = MerkleTreeHookClient::new(chain.merkle_tree_hook, provider.clone());
    let announce = ValidatorAnnounceClient::new(chain.validator_announce, provider);
    let mut factory = StorageValidatorFactory::new();
    if let Some(endpoint) = args.storage_endpoint {
        factory = factory.with_endpoint(endpoint);
    }

    let (merkle_tree_index, reports) =
        run_check(&hook, &announce, &factory, &chain.name, &validators).await?;

    let term = Term::stdout();
    let _ = term.write_line(&format!(
        "Latest checkpoint index on {}: {}",
        chain.name, merkle_tree_index
    ));
    for report in &reports {
        let _ = term.write_line(&styled_row(report, merkle_tree_index));
    }

    Ok(())
}

/// Reads the on-chain checkpoint and announcements, then checks every
/// validator. Reports are returned in the order the validators were given.
pub async fn run_check(
    hook: &impl MerkleTreeHook,
    announce: &impl ValidatorAnnounce,
    factory: &impl ValidatorFactory,
    chain: &str,
    validators: &[Address],
) -> Result<(u32, Vec<ValidatorReport>), CliError> {
    let merkle_tree_index = latest_merkle_tree_checkpoint_index(hook, Some(chain))
        .await
        .ok_or_else(|| {
            CliError::Internal(anyhow::anyhow!(
                "could not read the latest checkpoint index on {chain}"
            ))
        })?;

    let locations = validator_storage_locations(announce, validators, Some(chain))
        .await
        .ok_or_else(|| {
            CliError::Internal(anyhow::anyhow!(
                "could not read announced storage locations on {chain}"
            ))
        })?;

    if locations.len() != validators.len() {
        warn!(
            expected = validators.len(),
            got = locations.len(),
            "announcement count does not match validator count"
        );
    }

    let reports = join_all(validators.iter().enumerate().map(|(i, address)| {
        let announced = locations.get(i).map(Vec::as_slice).unwrap_or(&[]);
        check_validator(factory, *address, announced, merkle_tree_index)
    }))
    .await;

    info!(%chain, %merkle_tree_index, validators = reports.len(), "checked validators");
    Ok((merkle_tree_index, reports))
}

/// Parses validator addresses given as repeated and/or comma separated values.
pub fn parse_validators(raw: &[String]) -> Result<Vec<Address>, UserInputError> {
    let validators = raw
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_address)
        .collect::<Result<Vec<_>, _>>()?;

    if validators.is_empty() {
        return Err(UserInputError::NoValidators);
    }
    Ok(validators)
}
