//! Replaces `employee.full_name` with separate name, surname and patronymic
//! columns. Existing rows are split with [`split_full_name`] before the old
//! column goes away.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, prelude::Uuid};

use crate::name_split::{NameParts, join_name_parts, split_full_name};

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    FullName,
    Name,
    Surname,
    Patronymic,
    DepartmentId,
}

const LEGACY_UNIQUE: &str = "uq_employee_department_legacy_name";
const NAME_UNIQUE: &str = "uq_employee_department_full_name";
const NAME_INDEXES: [(&str, Employee); 2] = [
    ("idx_employee_name", Employee::Name),
    ("idx_employee_surname", Employee::Surname),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for column in [Employee::Name, Employee::Surname, Employee::Patronymic] {
            add_name_column(manager, column).await?;
        }

        let split = split_existing_rows(manager).await?;
        tracing::info!(rows = split, "split legacy employee names");

        manager
            .drop_index(
                Index::drop()
                    .name(LEGACY_UNIQUE)
                    .table(Employee::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Employee::Table)
                    .drop_column(Employee::FullName)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(NAME_UNIQUE)
                    .table(Employee::Table)
                    .col(Employee::DepartmentId)
                    .col(Employee::Surname)
                    .col(Employee::Name)
                    .col(Employee::Patronymic)
                    .unique()
                    .to_owned(),
            )
            .await?;
        for (name, column) in NAME_INDEXES {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Employee::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [NAME_UNIQUE, NAME_INDEXES[0].0, NAME_INDEXES[1].0] {
            manager
                .drop_index(Index::drop().name(name).table(Employee::Table).to_owned())
                .await?;
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Employee::Table)
                    .add_column(
                        ColumnDef::new(Employee::FullName)
                            .string_len(150)
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;
        join_existing_rows(manager).await?;

        for column in [Employee::Name, Employee::Surname, Employee::Patronymic] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Employee::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(LEGACY_UNIQUE)
                    .table(Employee::Table)
                    .col(Employee::DepartmentId)
                    .col(Employee::FullName)
                    .unique()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

// SQLite accepts a single alteration per statement.
async fn add_name_column(manager: &SchemaManager<'_>, column: Employee) -> Result<(), DbErr> {
    manager
        .alter_table(
            Table::alter()
                .table(Employee::Table)
                .add_column(ColumnDef::new(column).string_len(50).null())
                .to_owned(),
        )
        .await
}

async fn split_existing_rows(manager: &SchemaManager<'_>) -> Result<usize, DbErr> {
    let db = manager.get_connection();
    let backend = manager.get_database_backend();
    let select = Query::select()
        .columns([Employee::Id, Employee::FullName])
        .from(Employee::Table)
        .to_owned();
    let rows = db.query_all(backend.build(&select)).await?;
    let total = rows.len();
    for row in rows {
        let id: Uuid = row.try_get("", "id")?;
        let full_name: String = row.try_get("", "full_name")?;
        let NameParts {
            name,
            surname,
            patronymic,
        } = split_full_name(&full_name);
        let update = Query::update()
            .table(Employee::Table)
            .values([
                (Employee::Name, name.into()),
                (Employee::Surname, surname.into()),
                (Employee::Patronymic, patronymic.into()),
            ])
            .and_where(Expr::col(Employee::Id).eq(id))
            .to_owned();
        db.execute(backend.build(&update)).await?;
    }
    Ok(total)
}

async fn join_existing_rows(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    let db = manager.get_connection();
    let backend = manager.get_database_backend();
    let select = Query::select()
        .columns([
            Employee::Id,
            Employee::Name,
            Employee::Surname,
            Employee::Patronymic,
        ])
        .from(Employee::Table)
        .to_owned();
    for row in db.query_all(backend.build(&select)).await? {
        let id: Uuid = row.try_get("", "id")?;
        let parts = NameParts {
            name: row.try_get("", "name")?,
            surname: row.try_get("", "surname")?,
            patronymic: row.try_get("", "patronymic")?,
        };
        let update = Query::update()
            .table(Employee::Table)
            .value(Employee::FullName, join_name_parts(&parts))
            .and_where(Expr::col(Employee::Id).eq(id))
            .to_owned();
        db.execute(backend.build(&update)).await?;
    }
    Ok(())
}
