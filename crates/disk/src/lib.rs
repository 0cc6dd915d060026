mod health;
mod inventory;

pub use health::{DiskHealthChecker, SpawnFaultPolicy};
pub use inventory::{ata_model_from, is_mounted_in, nvme_model_from, DiskInventory, InventoryError};
