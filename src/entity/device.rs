use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::license;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "screen_active_devices")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub license_key: String,
  #[sea_orm(primary_key, auto_increment = false)]
  pub device_id: String,
  /// Captured once, at activation
  pub watermark_text: String,
  pub activated_at: DateTime,
  pub last_checkin: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "license::Entity",
    from = "Column::LicenseKey",
    to = "license::Column::LicenseKey",
    on_delete = "Cascade"
  )]
  License,
}

impl Related<license::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::License.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
