use anyhow::Result;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::operation_log::app_data_dir;
use crate::types::ResolvedAsset;

const SETTINGS_FILE: &str = "sendflow_settings.json";

fn default_selected_chain_id() -> u64 {
    1
}

/// User settings that persist between sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    /// Active network chain ID
    #[serde(default = "default_selected_chain_id")]
    pub selected_chain_id: u64,
    /// Account drafts are sent from
    #[serde(default)]
    pub selected_account: Option<Address>,
    /// Custom RPC overrides per chain ID
    #[serde(default)]
    pub custom_rpcs: HashMap<u64, String>,
    /// Tokens the wallet tracks, per chain ID
    #[serde(default)]
    pub tracked_tokens: HashMap<u64, Vec<ResolvedAsset>>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_chain_id: default_selected_chain_id(),
            selected_account: None,
            custom_rpcs: HashMap::new(),
            tracked_tokens: HashMap::new(),
        }
    }
}

impl UserSettings {
    /// Get the settings file path
    pub fn settings_path() -> PathBuf {
        app_data_dir().join(SETTINGS_FILE)
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read settings file: {}", e);
                }
            }
        }
        tracing::info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Get custom RPC for a chain, or None if using default
    pub fn get_custom_rpc(&self, chain_id: u64) -> Option<&String> {
        self.custom_rpcs.get(&chain_id).filter(|s| !s.is_empty())
    }

    /// Set custom RPC for a chain (empty string removes the override)
    pub fn set_custom_rpc(&mut self, chain_id: u64, rpc: String) {
        if rpc.trim().is_empty() {
            self.custom_rpcs.remove(&chain_id);
        } else {
            self.custom_rpcs.insert(chain_id, rpc.trim().to_string());
        }
    }

    pub fn tracked_tokens(&self, chain_id: u64) -> Vec<ResolvedAsset> {
        self.tracked_tokens.get(&chain_id).cloned().unwrap_or_default()
    }

    /// Track a token, replacing any entry with the same address
    pub fn track_token(&mut self, chain_id: u64, token: ResolvedAsset) {
        let tokens = self.tracked_tokens.entry(chain_id).or_default();
        tokens.retain(|t| t.address != token.address);
        tokens.push(token);
    }
}
