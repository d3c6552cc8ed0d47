use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const STATUS_ACTIVE: &str = "active";
pub const PLAN_TRIAL: &str = "trial";

/// Written by the provisioning side; this service only ever reads it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "screen_licenses")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub license_key: String,
  pub status: String,
  pub plan_type: String,
  pub trial_expires_at: Option<DateTime>,
  pub seat_count: i32,
  pub watermark_text: String,
  pub created_at: DateTime,
}

impl Model {
  pub fn is_active(&self) -> bool {
    self.status == STATUS_ACTIVE
  }

  pub fn is_trial(&self) -> bool {
    self.plan_type == PLAN_TRIAL
  }

  /// Only trial plans expire; a trial without a deadline never does.
  pub fn trial_expired(&self, now: DateTime) -> bool {
    self.is_trial() && self.trial_expires_at.is_some_and(|at| now > at)
  }

  pub fn seats(&self) -> u64 {
    self.seat_count.max(0) as u64
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::device::Entity")]
  Devices,
}

impl Related<super::device::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Devices.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
