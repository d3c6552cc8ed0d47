use sea_orm::sea_query::Expr;

use super::{NewDevice, Store};
use crate::{
  entity::{device, license},
  prelude::*,
};

/// SeaORM backed store.
#[derive(Debug, Clone)]
pub struct Db {
  db: DatabaseConnection,
}

impl Db {
  pub fn new(db: DatabaseConnection) -> Self {
    Self { db }
  }
}

async fn count_on<C: ConnectionTrait>(conn: &C, key: &str) -> Result<u64> {
  let count = device::Entity::find()
    .filter(device::Column::LicenseKey.eq(key))
    .count(conn)
    .await?;
  Ok(count)
}

async fn insert_on<C: ConnectionTrait>(
  conn: &C,
  new: NewDevice<'_>,
) -> Result<device::Model> {
  let device = device::ActiveModel {
    license_key: Set(new.license_key.to_owned()),
    device_id: Set(new.device_id.to_owned()),
    watermark_text: Set(new.watermark_text.to_owned()),
    activated_at: Set(new.at),
    last_checkin: Set(new.at),
  };

  Ok(device.insert(conn).await?)
}

#[async_trait]
impl Store for Db {
  async fn find_license(&self, key: &str) -> Result<Option<license::Model>> {
    let license = license::Entity::find_by_id(key).one(&self.db).await?;
    Ok(license)
  }

  async fn find_device(
    &self,
    key: &str,
    device_id: &str,
  ) -> Result<Option<device::Model>> {
    let device = device::Entity::find_by_id((key.to_owned(), device_id.to_owned()))
      .one(&self.db)
      .await?;
    Ok(device)
  }

  async fn update_last_checkin(
    &self,
    key: &str,
    device_id: &str,
    at: DateTime,
  ) -> Result<()> {
    device::Entity::update_many()
      .col_expr(device::Column::LastCheckin, Expr::value(at))
      .filter(device::Column::LicenseKey.eq(key))
      .filter(device::Column::DeviceId.eq(device_id))
      .exec(&self.db)
      .await?;
    Ok(())
  }

  async fn count_devices(&self, key: &str) -> Result<u64> {
    count_on(&self.db, key).await
  }

  async fn insert_device(&self, new: NewDevice<'_>) -> Result<device::Model> {
    insert_on(&self.db, new).await
  }

  async fn claim_seat(
    &self,
    new: NewDevice<'_>,
    seats: u64,
  ) -> Result<Option<device::Model>> {
    let txn = self.db.begin().await?;

    if count_on(&txn, new.license_key).await? >= seats {
      txn.rollback().await?;
      return Ok(None);
    }

    let device = match insert_on(&txn, new).await {
      Ok(device) => device,
      Err(err) => {
        txn.rollback().await?;
        return Err(err);
      }
    };

    txn.commit().await?;
    Ok(Some(device))
  }
}
