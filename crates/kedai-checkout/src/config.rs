//! # POS Configuration
//!
//! Per-device configuration for the kiosk and the register.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KEDAI_LOCATION_ID=2                                                │
//! │     KEDAI_CHECKOUT_FLOW=counter                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/kedai-pos/pos.toml (Linux)                               │
//! │     ~/Library/Application Support/id.kedai.pos/pos.toml (macOS)        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Kiosk flow, outlet 1, auto-generated device id                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pos.toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Kiosk Depan"
//!
//! [outlet]
//! location_id = 1
//!
//! [cart]
//! storage_key = "kiosk-cart-storage"
//! # data_dir = "/var/lib/kedai"
//!
//! [checkout]
//! default_flow = "kiosk"  # kiosk | counter
//! max_proof_bytes = 5242880
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

use kedai_core::{LocationId, CART_STORAGE_KEY, MAX_PROOF_BYTES};
use kedai_store::{FileCartStore, StoreResult};

use crate::checkout::CheckoutFlow;
use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Sections
// =============================================================================

/// Configuration for this device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier (UUID v4).
    /// Auto-generated on first run if not provided.
    pub id: String,

    /// Human-readable device name (e.g., "Kiosk Depan", "Kasir 1").
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Kedai Terminal".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

/// The outlet this device sells for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutletConfig {
    /// Backend id of the outlet. Catalog entries of other outlets are hidden.
    #[serde(default = "default_location_id")]
    pub location_id: u64,
}

fn default_location_id() -> u64 {
    1
}

impl Default for OutletConfig {
    fn default() -> Self {
        OutletConfig {
            location_id: default_location_id(),
        }
    }
}

/// Where the in-progress cart is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    /// Slot name of the persisted cart.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Overrides the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_storage_key() -> String {
    CART_STORAGE_KEY.to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        CartConfig {
            storage_key: default_storage_key(),
            data_dir: None,
        }
    }
}

/// Checkout behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Flow used when the UI does not ask for one.
    #[serde(default)]
    pub default_flow: CheckoutFlow,

    /// Largest accepted payment proof (at most 5 MiB).
    #[serde(default = "default_max_proof_bytes")]
    pub max_proof_bytes: u64,
}

fn default_max_proof_bytes() -> u64 {
    MAX_PROOF_BYTES
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            default_flow: CheckoutFlow::default(),
            max_proof_bytes: default_max_proof_bytes(),
        }
    }
}

// =============================================================================
// Main POS Configuration
// =============================================================================

/// Complete device configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub outlet: OutletConfig,

    #[serde(default)]
    pub cart: CartConfig,

    #[serde(default)]
    pub checkout: CheckoutSettings,
}

impl PosConfig {
    /// Creates a new config with defaults and a generated device ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pos.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading POS config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load POS config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a config file body.
    pub fn from_toml(contents: &str) -> CheckoutResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "POS config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.device.id.trim().is_empty() {
            return Err(CheckoutError::MissingDeviceId);
        }

        if self.outlet.location_id == 0 {
            return Err(CheckoutError::InvalidConfig(
                "outlet.location_id must be greater than 0".into(),
            ));
        }

        let key = &self.cart.storage_key;
        let key_ok = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !key_ok {
            return Err(CheckoutError::InvalidConfig(format!(
                "cart.storage_key must be non-empty and use only letters, digits, '-' or '_', got: '{}'",
                key
            )));
        }

        if self.checkout.max_proof_bytes == 0 || self.checkout.max_proof_bytes > MAX_PROOF_BYTES {
            return Err(CheckoutError::InvalidConfig(format!(
                "checkout.max_proof_bytes must be between 1 and {}",
                MAX_PROOF_BYTES
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from any variable source.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(id) = var("KEDAI_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Some(name) = var("KEDAI_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Some(location) = var("KEDAI_LOCATION_ID") {
            match location.parse::<u64>() {
                Ok(id) => {
                    debug!(location_id = id, "Overriding outlet from environment");
                    self.outlet.location_id = id;
                }
                Err(_) => warn!(value = %location, "Ignoring non-numeric KEDAI_LOCATION_ID"),
            }
        }

        if let Some(key) = var("KEDAI_CART_KEY") {
            self.cart.storage_key = key;
        }

        if let Some(dir) = var("KEDAI_DATA_DIR") {
            self.cart.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(flow) = var("KEDAI_CHECKOUT_FLOW") {
            match flow.parse() {
                Ok(parsed) => {
                    debug!(flow = %flow, "Overriding checkout flow from environment");
                    self.checkout.default_flow = parsed;
                }
                Err(_) => warn!(flow = %flow, "Unknown checkout flow in environment"),
            }
        }

        if let Some(max) = var("KEDAI_MAX_PROOF_BYTES") {
            if let Ok(bytes) = max.parse::<u64>() {
                self.checkout.max_proof_bytes = bytes;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("id", "kedai", "pos")
            .map(|dirs| dirs.config_dir().join("pos.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the device ID.
    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    /// Returns the outlet this device sells for.
    pub fn location_id(&self) -> LocationId {
        LocationId(self.outlet.location_id)
    }

    /// Returns the default checkout flow.
    pub fn default_flow(&self) -> CheckoutFlow {
        self.checkout.default_flow
    }

    /// Opens the cart store configured for this device.
    pub fn cart_store(&self) -> StoreResult<FileCartStore> {
        match &self.cart.data_dir {
            Some(dir) => Ok(FileCartStore::new(dir)),
            None => FileCartStore::in_data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PosConfig::default();
        assert!(!config.device.id.is_empty()); // Auto-generated
        assert_eq!(config.location_id(), LocationId(1));
        assert_eq!(config.cart.storage_key, "kiosk-cart-storage");
        assert_eq!(config.default_flow(), CheckoutFlow::Kiosk);
        assert_eq!(config.checkout.max_proof_bytes, 5 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PosConfig::from_toml(
            r#"
            [device]
            id = "kasir-1"

            [checkout]
            default_flow = "counter"
            "#,
        )
        .unwrap();

        assert_eq!(config.device_id(), "kasir-1");
        assert_eq!(config.device.name, "Kedai Terminal");
        assert_eq!(config.default_flow(), CheckoutFlow::Counter);
        assert_eq!(config.outlet.location_id, 1);

        let config = PosConfig::from_toml("[checkout]\ndefault_flow = \"cashier\"").unwrap();
        assert_eq!(config.default_flow(), CheckoutFlow::Counter);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            PosConfig::from_toml("[checkout]\ndefault_flow = \"drive_thru\""),
            Err(CheckoutError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_config_validation() {
        let mut config = PosConfig::default();

        config.device.id = String::new();
        assert!(matches!(config.validate(), Err(CheckoutError::MissingDeviceId)));

        config.device.id = "test".to_string();
        config.outlet.location_id = 0;
        assert!(config.validate().is_err());

        config.outlet.location_id = 2;
        config.cart.storage_key = "../cart".to_string();
        assert!(config.validate().is_err());

        config.cart.storage_key = "kiosk-cart-storage".to_string();
        config.checkout.max_proof_bytes = MAX_PROOF_BYTES + 1;
        assert!(config.validate().is_err());

        config.checkout.max_proof_bytes = 1024 * 1024;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("KEDAI_DEVICE_ID", "kiosk-7"),
            ("KEDAI_LOCATION_ID", "3"),
            ("KEDAI_CHECKOUT_FLOW", "cashier"),
            ("KEDAI_DATA_DIR", "/tmp/kedai"),
            ("KEDAI_MAX_PROOF_BYTES", "not-a-number"),
        ]);

        let mut config = PosConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.device_id(), "kiosk-7");
        assert_eq!(config.location_id(), LocationId(3));
        assert_eq!(config.default_flow(), CheckoutFlow::Counter);
        assert_eq!(config.cart.data_dir, Some(PathBuf::from("/tmp/kedai")));
        assert_eq!(config.checkout.max_proof_bytes, MAX_PROOF_BYTES);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("kedai-config-{}", Uuid::new_v4()))
            .join("pos.toml");

        let mut config = PosConfig::default();
        config.device.name = "Kasir 1".to_string();
        config.outlet.location_id = 4;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[device]"));
        assert!(contents.contains("[checkout]"));

        let loaded = PosConfig::from_toml(&contents).unwrap();
        assert_eq!(loaded.device.name, "Kasir 1");
        assert_eq!(loaded.location_id(), LocationId(4));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
