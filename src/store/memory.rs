//! In-memory store used by the service tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{NewDevice, Store};
use crate::{
  entity::{device, license},
  prelude::*,
};

#[derive(Default)]
pub struct Memory {
  licenses: DashMap<String, license::Model>,
  devices: DashMap<(String, String), device::Model>,
  /// Pause between reading the device count and returning it, widening the
  /// window in which concurrent activations could interleave.
  count_delay: Duration,
  /// Licenses whose lookup fails instead of answering.
  broken: DashMap<String, ()>,
  devices_down: AtomicBool,
  writes: AtomicUsize,
}

impl Memory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_count_delay(delay: Duration) -> Self {
    Self { count_delay: delay, ..Self::default() }
  }

  pub fn put_license(&self, license: license::Model) {
    self.licenses.insert(license.license_key.clone(), license);
  }

  pub fn put_device(&self, device: device::Model) {
    self
      .devices
      .insert((device.license_key.clone(), device.device_id.clone()), device);
  }

  pub fn break_license(&self, key: &str) {
    self.broken.insert(key.to_owned(), ());
  }

  /// Makes every device query fail.
  pub fn break_devices(&self) {
    self.devices_down.store(true, Ordering::SeqCst);
  }

  pub fn device(&self, key: &str, device_id: &str) -> Option<device::Model> {
    self
      .devices
      .get(&(key.to_owned(), device_id.to_owned()))
      .map(|entry| entry.value().clone())
  }

  pub fn device_count(&self, key: &str) -> usize {
    self.devices.iter().filter(|entry| entry.key().0 == key).count()
  }

  /// Number of check-ins and inserts performed so far.
  pub fn writes(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Store for Memory {
  async fn find_license(&self, key: &str) -> Result<Option<license::Model>> {
    if self.broken.contains_key(key) {
      return Err(Error::Internal(format!("license lookup failed for {key}")));
    }
    Ok(self.licenses.get(key).map(|entry| entry.value().clone()))
  }

  async fn find_device(
    &self,
    key: &str,
    device_id: &str,
  ) -> Result<Option<device::Model>> {
    if self.devices_down.load(Ordering::SeqCst) {
      return Err(Error::Internal("device table unavailable".into()));
    }
    Ok(self.device(key, device_id))
  }

  async fn update_last_checkin(
    &self,
    key: &str,
    device_id: &str,
    at: DateTime,
  ) -> Result<()> {
    if let Some(mut device) =
      self.devices.get_mut(&(key.to_owned(), device_id.to_owned()))
    {
      device.last_checkin = at;
      self.writes.fetch_add(1, Ordering::SeqCst);
    }
    Ok(())
  }

  async fn count_devices(&self, key: &str) -> Result<u64> {
    let count = self.device_count(key) as u64;
    if !self.count_delay.is_zero() {
      time::sleep(self.count_delay).await;
    }
    Ok(count)
  }

  async fn insert_device(&self, new: NewDevice<'_>) -> Result<device::Model> {
    let id = (new.license_key.to_owned(), new.device_id.to_owned());
    if self.devices.contains_key(&id) {
      return Err(Error::Internal("duplicate device row".into()));
    }

    let device = device::Model {
      license_key: id.0.clone(),
      device_id: id.1.clone(),
      watermark_text: new.watermark_text.to_owned(),
      activated_at: new.at,
      last_checkin: new.at,
    };

    self.devices.insert(id, device.clone());
    self.writes.fetch_add(1, Ordering::SeqCst);
    Ok(device)
  }
}
