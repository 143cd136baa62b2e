use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submitters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submitters::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submitters::Identifier)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Submitters::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Submitters::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Submitters::VerificationRef).string())
                    .col(ColumnDef::new(Submitters::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FormValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormValues::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormValues::FormId).integer().not_null())
                    .col(ColumnDef::new(FormValues::ColumnId).integer().not_null())
                    .col(ColumnDef::new(FormValues::SubmissionId).string().not_null())
                    .col(ColumnDef::new(FormValues::SubmitterId).integer().not_null())
                    .col(ColumnDef::new(FormValues::Value).text().not_null())
                    .col(
                        ColumnDef::new(FormValues::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(FormValues::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(FormValues::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_values_submitter_id")
                            .from(FormValues::Table, FormValues::SubmitterId)
                            .to(Submitters::Table, Submitters::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_values_submission")
                    .table(FormValues::Table)
                    .col(FormValues::SubmissionId)
                    .col(FormValues::ColumnId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_values_form_submitter")
                    .table(FormValues::Table)
                    .col(FormValues::FormId)
                    .col(FormValues::SubmitterId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FormValues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submitters::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Submitters {
    Table,
    Id,
    Identifier,
    IsActive,
    IsVerified,
    VerificationRef,
    CreatedAt,
}

#[derive(Iden)]
enum FormValues {
    Table,
    Id,
    FormId,
    ColumnId,
    SubmissionId,
    SubmitterId,
    Value,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
