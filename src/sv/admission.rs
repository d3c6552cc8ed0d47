//! Seat admission: decides whether a device may run under a license.

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
  entity::license,
  prelude::*,
  store::{NewDevice, Store},
};

pub const MISSING_FIELDS: &str = "Missing license_key or device_id";
pub const INVALID_KEY: &str = "Invalid license key";
pub const CANCELLED: &str = "License has been cancelled";
pub const TRIAL_EXPIRED: &str = "Trial has expired";
pub const AUTHORIZED: &str = "Device authorized";
pub const ACTIVATED: &str = "Device activated successfully";
pub const NO_SEATS: &str =
  "No available seats. Please contact support to add more seats.";
pub const WATERMARK_REQUIRED: &str =
  "watermark_text required for new device activation";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ValidateReq {
  #[serde(default)]
  pub license_key: Option<String>,
  #[serde(default)]
  pub device_id: Option<String>,
  #[serde(default)]
  pub watermark_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
  pub valid: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub watermark_text: Option<String>,
}

impl Decision {
  pub fn allow(message: impl Into<String>, watermark: String) -> Self {
    Self { valid: true, message: message.into(), watermark_text: Some(watermark) }
  }

  pub fn deny(message: impl Into<String>) -> Self {
    Self { valid: false, message: message.into(), watermark_text: None }
  }
}

/// Empty strings are treated exactly like absent fields.
fn non_empty(field: &Option<String>) -> Option<&str> {
  field.as_deref().filter(|s| !s.is_empty())
}

/// Per-license mutexes serializing first activations.
#[derive(Default)]
struct SeatLocks {
  locks: DashMap<String, Arc<Mutex<()>>>,
}

struct SeatGuard<'a> {
  locks: &'a SeatLocks,
  key: String,
  guard: Option<OwnedMutexGuard<()>>,
}

impl SeatLocks {
  async fn acquire(&self, key: &str) -> SeatGuard<'_> {
    let lock = Arc::clone(&self.locks.entry(key.to_owned()).or_default());
    let guard = lock.lock_owned().await;
    SeatGuard { locks: self, key: key.to_owned(), guard: Some(guard) }
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.locks.len()
  }
}

impl Drop for SeatGuard<'_> {
  fn drop(&mut self) {
    drop(self.guard.take());
    // the map holds the last reference once nobody waits on the key
    self.locks.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
  }
}

pub struct Admission {
  store: Arc<dyn Store>,
  seats: SeatLocks,
}

impl Admission {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store, seats: SeatLocks::default() }
  }

  /// Business outcomes are always `Ok(Decision)`. `Err` is reserved for
  /// malformed requests and store failures.
  pub async fn validate(&self, req: &ValidateReq) -> Result<Decision> {
    let (Some(key), Some(device_id)) =
      (non_empty(&req.license_key), non_empty(&req.device_id))
    else {
      return Err(Error::bad_request(MISSING_FIELDS));
    };

    let license = match self.store.find_license(key).await {
      Ok(Some(license)) => license,
      Ok(None) => return Ok(Decision::deny(INVALID_KEY)),
      Err(err) => {
        warn!("License lookup for `{key}` failed: {err}");
        return Ok(Decision::deny(INVALID_KEY));
      }
    };

    if !license.is_active() {
      return Ok(Decision::deny(CANCELLED));
    }

    let now = Utc::now().naive_utc();
    if license.trial_expired(now) {
      return Ok(Decision::deny(TRIAL_EXPIRED));
    }

    if self.store.find_device(key, device_id).await?.is_some() {
      return self.checkin(&license, device_id, now).await;
    }

    self.activate(&license, device_id, &req.watermark_text, now).await
  }

  async fn checkin(
    &self,
    license: &license::Model,
    device_id: &str,
    now: DateTime,
  ) -> Result<Decision> {
    self
      .store
      .update_last_checkin(&license.license_key, device_id, now)
      .await?;

    debug!("Device `{device_id}` checked in for `{}`", license.license_key);
    Ok(Decision::allow(AUTHORIZED, license.watermark_text.clone()))
  }

  async fn activate(
    &self,
    license: &license::Model,
    device_id: &str,
    watermark: &Option<String>,
    now: DateTime,
  ) -> Result<Decision> {
    let key = license.license_key.as_str();
    let seats = license.seats();

    let _seat = self.seats.acquire(key).await;

    // a concurrent request may have activated this device meanwhile
    if self.store.find_device(key, device_id).await?.is_some() {
      return self.checkin(license, device_id, now).await;
    }

    let Some(watermark) = non_empty(watermark) else {
      if self.store.count_devices(key).await? >= seats {
        return Ok(Decision::deny(NO_SEATS));
      }
      return Err(Error::bad_request(WATERMARK_REQUIRED));
    };

    let new = NewDevice {
      license_key: key,
      device_id,
      watermark_text: watermark,
      at: now,
    };

    match self.store.claim_seat(new, seats).await? {
      Some(device) => {
        info!("Activated device `{device_id}` for `{key}`");
        Ok(Decision::allow(ACTIVATED, device.watermark_text))
      }
      None => {
        info!("No free seats on `{key}` ({seats}) for device `{device_id}`");
        Ok(Decision::deny(NO_SEATS))
      }
    }
  }
}
