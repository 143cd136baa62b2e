use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Forms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Forms::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Forms::Name).string().not_null())
                    .col(ColumnDef::new(Forms::OwnerId).integer().not_null())
                    .col(ColumnDef::new(Forms::EndDate).timestamp())
                    .col(ColumnDef::new(Forms::FeeMinor).big_integer())
                    .col(ColumnDef::new(Forms::BannerImage).string())
                    .col(
                        ColumnDef::new(Forms::SingleSubmission)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Forms::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Forms::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Forms::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forms_owner_id")
                    .table(Forms::Table)
                    .col(Forms::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Columns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Columns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Columns::Name).string().not_null())
                    .col(ColumnDef::new(Columns::DataType).string().not_null())
                    .col(ColumnDef::new(Columns::OwnerId).integer().not_null())
                    .col(
                        ColumnDef::new(Columns::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Columns::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FormDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormDetails::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormDetails::FormId).integer().not_null())
                    .col(ColumnDef::new(FormDetails::ColumnId).integer().not_null())
                    .col(
                        ColumnDef::new(FormDetails::SequenceNo)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FormDetails::FormNo)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(FormDetails::OwnerId).integer().not_null())
                    .col(
                        ColumnDef::new(FormDetails::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(FormDetails::IsReadOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FormDetails::BannerImage).string())
                    .col(ColumnDef::new(FormDetails::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_details_form_id")
                            .from(FormDetails::Table, FormDetails::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_details_column_id")
                            .from(FormDetails::Table, FormDetails::ColumnId)
                            .to(Columns::Table, Columns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_details_form_order")
                    .table(FormDetails::Table)
                    .col(FormDetails::FormId)
                    .col(FormDetails::FormNo)
                    .col(FormDetails::SequenceNo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ColumnOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ColumnOptions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ColumnOptions::ColumnId).integer().not_null())
                    .col(ColumnDef::new(ColumnOptions::FormId).integer().not_null())
                    .col(ColumnDef::new(ColumnOptions::OptionKind).string().not_null())
                    .col(ColumnDef::new(ColumnOptions::Label).string().not_null())
                    .col(ColumnDef::new(ColumnOptions::OwnerId).integer().not_null())
                    .col(
                        ColumnDef::new(ColumnOptions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ColumnOptions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_column_options_column_id")
                            .from(ColumnOptions::Table, ColumnOptions::ColumnId)
                            .to(Columns::Table, Columns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_column_options_form_id")
                            .from(ColumnOptions::Table, ColumnOptions::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ColumnOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FormDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Columns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Forms::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Forms {
    Table,
    Id,
    Name,
    OwnerId,
    EndDate,
    FeeMinor,
    BannerImage,
    SingleSubmission,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Columns {
    Table,
    Id,
    Name,
    DataType,
    OwnerId,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum FormDetails {
    Table,
    Id,
    FormId,
    ColumnId,
    SequenceNo,
    FormNo,
    OwnerId,
    IsActive,
    IsReadOnly,
    BannerImage,
    CreatedAt,
}

#[derive(Iden)]
enum ColumnOptions {
    Table,
    Id,
    ColumnId,
    FormId,
    OptionKind,
    Label,
    OwnerId,
    IsActive,
    CreatedAt,
}
