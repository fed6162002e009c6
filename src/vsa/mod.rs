pub mod client;
pub mod types;

pub use client::{DataSource, VsaClient};

/// Endpoint listing physical disks
pub const DISKS_PATH: &str = "api/v1/disks";
/// Endpoint listing storage pools
pub const POOLS_PATH: &str = "api/v1/pools";
/// Endpoint listing volumes
pub const VOLUMES_PATH: &str = "api/v1/volumes";
/// Endpoint listing virtual disks with their appliances and sessions
pub const VIRTUAL_DISKS_PATH: &str = "api/v1/virtualdisks";
