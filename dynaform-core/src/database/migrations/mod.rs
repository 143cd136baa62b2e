pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_form_schema;
mod m20250901_000002_create_validation_tables;
mod m20250902_000003_create_submission_tables;
mod m20250902_000004_create_payments;
mod m20250903_000005_seed_validation_kinds;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_form_schema::Migration),
            Box::new(m20250901_000002_create_validation_tables::Migration),
            Box::new(m20250902_000003_create_submission_tables::Migration),
            Box::new(m20250902_000004_create_payments::Migration),
            Box::new(m20250903_000005_seed_validation_kinds::Migration),
        ]
    }
}
