//! Adds `employee.surname_search`, the lowercased surname used by the
//! case-insensitive surname filter. SQLite's `LOWER()` folds ASCII only, so
//! the folding happens in Rust on write and here for existing rows.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, prelude::Uuid};

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    Surname,
    SurnameSearch,
}

const SEARCH_INDEX: &str = "idx_employee_surname_search";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Employee::Table)
                    .add_column(ColumnDef::new(Employee::SurnameSearch).string_len(100).null())
                    .to_owned(),
            )
            .await?;

        let folded = fold_existing_rows(manager).await?;
        tracing::info!(rows = folded, "indexed employee surnames for search");

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(SEARCH_INDEX)
                    .table(Employee::Table)
                    .col(Employee::SurnameSearch)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(SEARCH_INDEX)
                    .table(Employee::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Employee::Table)
                    .drop_column(Employee::SurnameSearch)
                    .to_owned(),
            )
            .await
    }
}

async fn fold_existing_rows(manager: &SchemaManager<'_>) -> Result<usize, DbErr> {
    let db = manager.get_connection();
    let backend = manager.get_database_backend();
    let select = Query::select()
        .columns([Employee::Id, Employee::Surname])
        .from(Employee::Table)
        .and_where(Expr::col(Employee::Surname).is_not_null())
        .to_owned();
    let rows = db.query_all(backend.build(&select)).await?;
    let total = rows.len();
    for row in rows {
        let id: Uuid = row.try_get("", "id")?;
        let surname: String = row.try_get("", "surname")?;
        let update = Query::update()
            .table(Employee::Table)
            .value(Employee::SurnameSearch, surname.to_lowercase())
            .and_where(Expr::col(Employee::Id).eq(id))
            .to_owned();
        db.execute(backend.build(&update)).await?;
    }
    Ok(total)
}
