use sea_orm_migration::prelude::*;

use super::m20251214_000001_create_licenses::Licenses;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(ActiveDevices::Table)
          .if_not_exists()
          .col(ColumnDef::new(ActiveDevices::LicenseKey).string().not_null())
          .col(ColumnDef::new(ActiveDevices::DeviceId).string().not_null())
          .col(
            ColumnDef::new(ActiveDevices::WatermarkText).string().not_null(),
          )
          .col(
            ColumnDef::new(ActiveDevices::ActivatedAt).date_time().not_null(),
          )
          .col(
            ColumnDef::new(ActiveDevices::LastCheckin).date_time().not_null(),
          )
          .primary_key(
            Index::create()
              .col(ActiveDevices::LicenseKey)
              .col(ActiveDevices::DeviceId),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_active_devices_license")
              .from(ActiveDevices::Table, ActiveDevices::LicenseKey)
              .to(Licenses::Table, Licenses::LicenseKey)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_active_devices_license")
          .table(ActiveDevices::Table)
          .col(ActiveDevices::LicenseKey)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(ActiveDevices::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum ActiveDevices {
  #[sea_orm(iden = "screen_active_devices")]
  Table,
  LicenseKey,
  DeviceId,
  WatermarkText,
  ActivatedAt,
  LastCheckin,
}
