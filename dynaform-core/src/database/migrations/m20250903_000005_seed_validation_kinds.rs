use sea_orm_migration::prelude::*;

use super::m20250901_000002_create_validation_tables::ValidationKinds;

const KINDS: &[(&str, &str)] = &[
    ("required", "Value must be present and non-empty"),
    ("email", "Value must be an email address"),
    ("numeric", "Value must be a number"),
    ("phone", "Value must be a phone number"),
    ("date", "Value must be a calendar date (YYYY-MM-DD)"),
    ("url", "Value must be an http(s) URL"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(ValidationKinds::Table)
            .columns([ValidationKinds::Name, ValidationKinds::Description])
            .to_owned();

        for (name, description) in KINDS {
            insert.values_panic([(*name).into(), (*description).into()]);
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let names: Vec<&str> = KINDS.iter().map(|(name, _)| *name).collect();
        let delete = Query::delete()
            .from_table(ValidationKinds::Table)
            .and_where(Expr::col(ValidationKinds::Name).is_in(names))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
