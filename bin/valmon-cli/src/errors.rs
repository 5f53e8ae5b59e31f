use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    UserInput(#[from] UserInputError),

    #[error("Internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum UserInputError {
    #[error("no settings for chain '{0}'. Add a [chains.{0}] table to the config file or pass the addresses as flags.")]
    UnknownChain(String),

    #[error("missing {setting} for chain '{chain}'")]
    MissingChainSetting {
        chain: String,
        setting: &'static str,
    },

    #[error("invalid address '{0}'. Must be a 0x-prefixed 20 byte hex string.")]
    InvalidAddress(String),

    #[error("at least one validator address must be provided")]
    NoValidators,
}
