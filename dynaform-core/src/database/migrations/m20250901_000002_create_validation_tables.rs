use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ValidationKinds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ValidationKinds::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ValidationKinds::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ValidationKinds::Description).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ValidationRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ValidationRules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ValidationRules::ValidationKindId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ValidationRules::FormId).integer().not_null())
                    .col(
                        ColumnDef::new(ValidationRules::ColumnId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ValidationRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ValidationRules::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_validation_rules_kind_id")
                            .from(ValidationRules::Table, ValidationRules::ValidationKindId)
                            .to(ValidationKinds::Table, ValidationKinds::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_validation_rules_form_column")
                    .table(ValidationRules::Table)
                    .col(ValidationRules::FormId)
                    .col(ValidationRules::ColumnId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ValidationRules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ValidationKinds::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
pub enum ValidationKinds {
    Table,
    Id,
    Name,
    Description,
}

#[derive(Iden)]
enum ValidationRules {
    Table,
    Id,
    ValidationKindId,
    FormId,
    ColumnId,
    IsActive,
    CreatedAt,
}
