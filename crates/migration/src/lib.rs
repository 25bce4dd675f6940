pub use sea_orm_migration::prelude::*;

mod m20260901_000000_init;
mod m20260915_000000_request_status_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000000_init::Migration),
            Box::new(m20260915_000000_request_status_index::Migration),
        ]
    }
}
