use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Licenses::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Licenses::LicenseKey)
              .string()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(Licenses::Status)
              .string()
              .not_null()
              .default("active"),
          )
          .col(
            ColumnDef::new(Licenses::PlanType)
              .string()
              .not_null()
              .default("trial"),
          )
          .col(ColumnDef::new(Licenses::TrialExpiresAt).date_time().null())
          .col(
            ColumnDef::new(Licenses::SeatCount)
              .integer()
              .not_null()
              .default(1),
          )
          .col(ColumnDef::new(Licenses::WatermarkText).string().not_null())
          .col(ColumnDef::new(Licenses::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Licenses::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Licenses {
  #[sea_orm(iden = "screen_licenses")]
  Table,
  LicenseKey,
  Status,
  PlanType,
  TrialExpiresAt,
  SeatCount,
  WatermarkText,
  CreatedAt,
}
