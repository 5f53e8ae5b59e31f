use std::{
    collections::HashMap,
    fs::{create_dir_all, File},
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::Address;
use config::{Config, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{CONFIG_FILE_NAME, PROJECT_APPLICATION, PROJECT_ORGANIZATION, PROJECT_QUALIFIER},
    errors::{CliError, UserInputError},
};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SettingsFromFile {
    #[serde(default)]
    pub chains: HashMap<String, ChainSettingsFromFile>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainSettingsFromFile {
    pub rpc_url: Option<String>,
    pub merkle_tree_hook: Option<String>,
    pub validator_announce: Option<String>,
}

/// Fully resolved settings for the chain being checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSettings {
    pub name: String,
    pub rpc_url: String,
    pub merkle_tree_hook: Address,
    pub validator_announce: Address,
}

/// Settings loaded from the TOML config file.
#[derive(Debug)]
pub struct Settings {
    pub config_file: PathBuf,
    pub chains: HashMap<String, ChainSettingsFromFile>,
}

impl Settings {
    /// Loads settings from `path`, or from the default config file in the
    /// project config dir, which is created empty if missing.
    pub fn load(path: Option<PathBuf>) -> Result<Self, CliError> {
        let config_file = match path {
            Some(path) => path,
            None => default_config_file()?,
        };
        Self::from_file(&config_file)
    }

    pub fn from_file(config_file: &Path) -> Result<Self, CliError> {
        let from_file = Config::builder()
            .add_source(config::File::from(config_file).format(FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize::<SettingsFromFile>())
            .map_err(|e| {
                CliError::Internal(anyhow::anyhow!(
                    "failed to load config file {}: {e}",
                    config_file.display()
                ))
            })?;

        Ok(Settings {
            config_file: config_file.to_owned(),
            chains: from_file.chains,
        })
    }

    fn chain_from_file(&self, name: &str) -> Option<&ChainSettingsFromFile> {
        self.chains.get(name).or_else(|| {
            self.chains
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// Resolves the settings of a chain, with flag values taking precedence
    /// over the config file.
    pub fn resolve_chain(
        &self,
        name: &str,
        overrides: ChainSettingsFromFile,
    ) -> Result<ChainSettings, UserInputError> {
        let from_file = self.chain_from_file(name);
        let base = from_file.cloned().unwrap_or_default();

        let missing = |setting: &'static str| {
            if from_file.is_none() {
                UserInputError::UnknownChain(name.to_owned())
            } else {
                UserInputError::MissingChainSetting {
                    chain: name.to_owned(),
                    setting,
                }
            }
        };

        let rpc_url = overrides
            .rpc_url
            .or(base.rpc_url)
            .ok_or_else(|| missing("rpc_url"))?;
        let merkle_tree_hook = overrides
            .merkle_tree_hook
            .or(base.merkle_tree_hook)
            .ok_or_else(|| missing("merkle_tree_hook"))?;
        let validator_announce = overrides
            .validator_announce
            .or(base.validator_announce)
            .ok_or_else(|| missing("validator_announce"))?;

        Ok(ChainSettings {
            name: name.to_owned(),
            rpc_url,
            merkle_tree_hook: parse_address(&merkle_tree_hook)?,
            validator_announce: parse_address(&validator_announce)?,
        })
    }
}

fn default_config_file() -> Result<PathBuf, CliError> {
    let proj_dirs = ProjectDirs::from(PROJECT_QUALIFIER, PROJECT_ORGANIZATION, PROJECT_APPLICATION)
        .ok_or_else(|| CliError::Internal(anyhow::anyhow!("no home directory available")))?;
    let config_file = proj_dirs.config_dir().join(CONFIG_FILE_NAME);
    create_dir_all(proj_dirs.config_dir()).map_err(|e| CliError::Internal(e.into()))?;
    let _ = File::create_new(&config_file);
    Ok(config_file)
}

pub fn parse_address(s: &str) -> Result<Address, UserInputError> {
    Address::from_str(s.trim()).map_err(|_| UserInputError::InvalidAddress(s.to_owned()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const HOOK: &str = "0x48e6c30b97748d1e2e03bf3e9fbe3890ca5f8cca";
    const VA: &str = "0xcd96b3a9e9fca2a4e6b2b8d2c7f1f1b7a1e8c9d0";

    fn write_config(body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, body).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_empty_file() {
        let (_dir, path) = write_config("");
        let settings = Settings::from_file(&path).unwrap();
        assert!(settings.chains.is_empty());
        assert_eq!(settings.config_file, path);
    }

    #[test]
    fn test_resolve_chain_from_file() {
        let (_dir, path) = write_config(&format!(
            r#"
[chains.ethereum]
rpc_url = "https://rpc.example"
merkle_tree_hook = "{HOOK}"
validator_announce = "{VA}"
"#
        ));
        let settings = Settings::from_file(&path).unwrap();
        let chain = settings
            .resolve_chain("ethereum", ChainSettingsFromFile::default())
            .unwrap();

        assert_eq!(chain.name, "ethereum");
        assert_eq!(chain.rpc_url, "https://rpc.example");
        assert_eq!(chain.merkle_tree_hook, parse_address(HOOK).unwrap());
        assert_eq!(chain.validator_announce, parse_address(VA).unwrap());
    }

    #[test]
    fn test_flags_override_file() {
        let (_dir, path) = write_config(&format!(
            r#"
[chains.ethereum]
rpc_url = "https://rpc.example"
merkle_tree_hook = "{HOOK}"
validator_announce = "{VA}"
"#
        ));
        let settings = Settings::from_file(&path).unwrap();
        let chain = settings
            .resolve_chain(
                "ethereum",
                ChainSettingsFromFile {
                    rpc_url: Some("http://localhost:8545".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(chain.rpc_url, "http://localhost:8545");
        assert_eq!(chain.merkle_tree_hook, parse_address(HOOK).unwrap());
    }

    #[test]
    fn test_unknown_chain_with_all_flags() {
        let (_dir, path) = write_config("");
        let settings = Settings::from_file(&path).unwrap();
        let chain = settings
            .resolve_chain(
                "anvil",
                ChainSettingsFromFile {
                    rpc_url: Some("http://localhost:8545".to_owned()),
                    merkle_tree_hook: Some(HOOK.to_owned()),
                    validator_announce: Some(VA.to_owned()),
                },
            )
            .unwrap();
        assert_eq!(chain.name, "anvil");
    }

    #[test]
    fn test_unknown_chain() {
        let (_dir, path) = write_config("");
        let settings = Settings::from_file(&path).unwrap();
        let err = settings
            .resolve_chain("anvil", ChainSettingsFromFile::default())
            .unwrap_err();
        assert!(matches!(err, UserInputError::UnknownChain(c) if c == "anvil"));
    }

    #[test]
    fn test_missing_setting() {
        let (_dir, path) = write_config(
            r#"
[chains.ethereum]
rpc_url = "https://rpc.example"
"#,
        );
        let settings = Settings::from_file(&path).unwrap();
        let err = settings
            .resolve_chain("ethereum", ChainSettingsFromFile::default())
            .unwrap_err();
        assert!(matches!(
            err,
            UserInputError::MissingChainSetting {
                setting: "merkle_tree_hook",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            parse_address("0x1234"),
            Err(UserInputError::InvalidAddress(_))
        ));
        assert!(parse_address(&format!(" {HOOK} ")).is_ok());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CliError::Internal(_)));
    }
}
