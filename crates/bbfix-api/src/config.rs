//! Typed shape of `config.yaml`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteProtocol {
    Ssh,
    Https,
}

impl Default for RemoteProtocol {
    fn default() -> Self {
        Self::Ssh
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoVisibility {
    Private,
    Public,
}

impl Default for RepoVisibility {
    fn default() -> Self {
        Self::Private
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubConfig {
    pub owner: Option<String>,
    #[serde(default)]
    pub default_visibility: RepoVisibility,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: None,
            default_visibility: RepoVisibility::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub protocol: RemoteProtocol,
    /// e.g. `git@${org}.github.com:${org}/${repo}.git`; `${owner}`/`${repo}`
    /// substituted at origin-construction time.
    pub template: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            protocol: RemoteProtocol::default(),
            template: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    Rebase,
    Merge,
}

impl Default for SyncStrategy {
    fn default() -> Self {
        Self::Rebase
    }
}

impl SyncStrategy {
    /// Case-insensitive parse; defaults to `Rebase` for `None`/empty input.
    pub fn parse(input: Option<&str>) -> Result<Self, crate::error::Error> {
        match input.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Self::Rebase),
            Some(s) if s.eq_ignore_ascii_case("rebase") => Ok(Self::Rebase),
            Some(s) if s.eq_ignore_ascii_case("merge") => Ok(Self::Merge),
            Some(other) => Err(crate::error::Error::new(
                crate::error::ErrorCode::InvalidInput,
                format!("unknown sync strategy '{other}', expected 'rebase' or 'merge'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub fetch_prune: bool,
    #[serde(default)]
    pub default_strategy: SyncStrategy,
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_prune: true,
            default_strategy: SyncStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumenConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub show_install_tip: bool,
    #[serde(default)]
    pub auto_generate_commit_message_when_empty: bool,
}

impl Default for LumenConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            show_install_tip: true,
            auto_generate_commit_message_when_empty: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub lumen: LumenConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_strategy_defaults_to_rebase() {
        assert_eq!(SyncStrategy::parse(None).unwrap(), SyncStrategy::Rebase);
        assert_eq!(SyncStrategy::parse(Some("")).unwrap(), SyncStrategy::Rebase);
    }

    #[test]
    fn sync_strategy_is_case_insensitive() {
        assert_eq!(SyncStrategy::parse(Some("MERGE")).unwrap(), SyncStrategy::Merge);
    }

    #[test]
    fn sync_strategy_rejects_unknown() {
        assert!(SyncStrategy::parse(Some("squash")).is_err());
    }
}
