pub use sea_orm_migration::prelude::*;

mod m20230401_000001_org_structure;
mod m20230409_000002_split_employee_name;
mod m20230415_000003_surname_search;
mod name_split;

pub use name_split::{NameParts, join_name_parts, split_full_name};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230401_000001_org_structure::Migration),
            Box::new(m20230409_000002_split_employee_name::Migration),
            Box::new(m20230415_000003_surname_search::Migration),
        ]
    }
}
