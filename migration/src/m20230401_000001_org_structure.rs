use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveIden)]
enum Department {
    Table,
    Id,
    Name,
    DirectorId,
}

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    FullName,
    Photo,
    Position,
    SalaryCents,
    Age,
    DepartmentId,
}

const FK_DEPARTMENT_DIRECTOR: &str = "fk_department_director";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        let mut department = Table::create();
        department
            .table(Department::Table)
            .if_not_exists()
            .col(ColumnDef::new(Department::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Department::Name).string_len(100).not_null())
            .col(ColumnDef::new(Department::DirectorId).uuid());
        // SQLite cannot attach a constraint to an existing table.
        if backend == DatabaseBackend::Sqlite {
            department.foreign_key(&mut director_foreign_key());
        }
        manager.create_table(department).await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_department_name")
                    .table(Department::Table)
                    .col(Department::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_department_director")
                    .table(Department::Table)
                    .col(Department::DirectorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Employee::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Employee::FullName).string_len(150).not_null())
                    .col(ColumnDef::new(Employee::Photo).string_len(255))
                    .col(ColumnDef::new(Employee::Position).string_len(100).not_null())
                    .col(ColumnDef::new(Employee::SalaryCents).big_integer().not_null())
                    .col(ColumnDef::new(Employee::Age).integer().not_null())
                    .col(ColumnDef::new(Employee::DepartmentId).uuid())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_department")
                            .from(Employee::Table, Employee::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employee_department")
                    .table(Employee::Table)
                    .col(Employee::DepartmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_employee_department_legacy_name")
                    .table(Employee::Table)
                    .col(Employee::DepartmentId)
                    .col(Employee::FullName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        if backend != DatabaseBackend::Sqlite {
            manager.create_foreign_key(director_foreign_key()).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Sqlite {
            manager
                .drop_foreign_key(
                    ForeignKey::drop()
                        .name(FK_DEPARTMENT_DIRECTOR)
                        .table(Department::Table)
                        .to_owned(),
                )
                .await?;
        }
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Department::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn director_foreign_key() -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(FK_DEPARTMENT_DIRECTOR)
        .from(Department::Table, Department::DirectorId)
        .to(Employee::Table, Employee::Id)
        .on_delete(ForeignKeyAction::SetNull)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}
