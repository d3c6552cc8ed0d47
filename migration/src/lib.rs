pub use sea_orm_migration::prelude::*;

mod m20251214_000001_create_licenses;
mod m20251214_000002_create_active_devices;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20251214_000001_create_licenses::Migration),
      Box::new(m20251214_000002_create_active_devices::Migration),
    ]
  }
}
