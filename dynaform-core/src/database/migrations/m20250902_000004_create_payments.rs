use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::FormId).integer().not_null())
                    .col(
                        ColumnDef::new(Payments::SubmissionId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payments::SubmitterId).integer().not_null())
                    .col(ColumnDef::new(Payments::GatewayOrderId).string().not_null())
                    .col(
                        ColumnDef::new(Payments::GatewayPaymentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Payments::GatewaySignature)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Payments::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Payments::Currency)
                            .string()
                            .not_null()
                            .default("INR"),
                    )
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .col(ColumnDef::new(Payments::PaidAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Payments::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        // one gateway payment pays for exactly one submission
        manager
            .create_index(
                Index::create()
                    .name("idx_payments_gateway_payment_id")
                    .table(Payments::Table)
                    .col(Payments::GatewayPaymentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    FormId,
    SubmissionId,
    SubmitterId,
    GatewayOrderId,
    GatewayPaymentId,
    GatewaySignature,
    AmountMinor,
    Currency,
    Status,
    PaidAt,
    IsActive,
}
