//! Persistence contract of the admission service.
//!
//! The service never talks to the database directly: it receives an
//! `Arc<dyn Store>` at construction, so the SeaORM backend can be swapped
//! for a test double.

mod db;
#[cfg(test)]
pub mod memory;

pub use db::Db;

use crate::{
  entity::{device, license},
  prelude::*,
};

/// Row about to be inserted for a first activation.
#[derive(Debug, Clone, Copy)]
pub struct NewDevice<'a> {
  pub license_key: &'a str,
  pub device_id: &'a str,
  pub watermark_text: &'a str,
  pub at: DateTime,
}

#[async_trait]
pub trait Store: Send + Sync {
  async fn find_license(&self, key: &str) -> Result<Option<license::Model>>;

  async fn find_device(
    &self,
    key: &str,
    device_id: &str,
  ) -> Result<Option<device::Model>>;

  async fn update_last_checkin(
    &self,
    key: &str,
    device_id: &str,
    at: DateTime,
  ) -> Result<()>;

  async fn count_devices(&self, key: &str) -> Result<u64>;

  async fn insert_device(&self, new: NewDevice<'_>) -> Result<device::Model>;

  /// Inserts `new` only while the license has fewer than `seats` devices.
  /// Returns `None` when the capacity is already used up.
  ///
  /// The provided version is two separate calls; callers must serialize it
  /// per license. Backends with transactions override it.
  async fn claim_seat(
    &self,
    new: NewDevice<'_>,
    seats: u64,
  ) -> Result<Option<device::Model>> {
    if self.count_devices(new.license_key).await? >= seats {
      return Ok(None);
    }
    self.insert_device(new).await.map(Some)
  }
}
