//! Needs Docker: `cargo test -p org-tests -- --ignored`.

use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use org_tests::{POSTGRES_PORT, postgres_image, postgres_url};
use platform_db::{DatabaseSettings, DbPool, connect};
use products_hr::{DepartmentInput, DepartmentPatch, EmployeeFilter, EmployeeInput, HrModule, HrSettings};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use testcontainers::clients::Cli;
use uuid::Uuid;

fn person(name: &str, surname: &str, salary: &str, department: Option<Uuid>) -> Result<EmployeeInput> {
    Ok(EmployeeInput {
        name: Some(name.into()),
        surname: Some(surname.into()),
        position: Some("Engineer".into()),
        salary: Some(salary.parse::<Decimal>()?),
        age: Some(35),
        department,
        ..EmployeeInput::default()
    })
}

async fn names_of(pool: &DbPool, id: Uuid) -> Result<(Option<String>, Option<String>, Option<String>)> {
    let row = pool
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT name, surname, patronymic FROM employee WHERE id = $1",
            [id.into()],
        ))
        .await?
        .context("employee row missing")?;
    Ok((
        row.try_get("", "name")?,
        row.try_get("", "surname")?,
        row.try_get("", "patronymic")?,
    ))
}

#[tokio::test]
#[ignore = "requires docker"]
async fn migrations_split_and_rejoin_names() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let pool = connect(&DatabaseSettings::new(postgres_url(
        container.get_host_port_ipv4(POSTGRES_PORT),
    )))
    .await?;

    Migrator::up(&pool, Some(1)).await?;
    let id = Uuid::new_v4();
    pool.execute(Statement::from_sql_and_values(
        DatabaseBackend::Postgres,
        "INSERT INTO employee (id, full_name, position, salary_cents, age) VALUES ($1, $2, $3, $4, $5)",
        [
            id.into(),
            "Anna Maria Ivanova".into(),
            "CFO".into(),
            500_000i64.into(),
            44i32.into(),
        ],
    ))
    .await?;

    Migrator::up(&pool, None).await?;
    assert_eq!(
        names_of(&pool, id).await?,
        (
            Some("Anna".into()),
            Some("Maria".into()),
            Some("Ivanova".into())
        )
    );

    Migrator::down(&pool, Some(2)).await?;
    let row = pool
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT full_name FROM employee WHERE id = $1",
            [id.into()],
        ))
        .await?
        .context("employee row missing after rollback")?;
    let full_name: String = row.try_get("", "full_name")?;
    assert_eq!(full_name, "Anna Maria Ivanova");

    Migrator::reset(&pool).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn aggregates_and_filters_on_postgres() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let pool = connect(&DatabaseSettings::new(postgres_url(
        container.get_host_port_ipv4(POSTGRES_PORT),
    )))
    .await?;
    Migrator::up(&pool, None).await?;
    let hr = HrModule::new(pool, HrSettings::default());

    let eng = hr
        .create_department(DepartmentInput {
            name: Some("Engineering".into()),
            director: None,
        })
        .await?;
    let empty = hr
        .create_department(DepartmentInput {
            name: Some("Legal".into()),
            director: None,
        })
        .await?;
    let head = hr
        .create_employee(person("Anna", "Ivanova", "4200.10", Some(eng.id))?)
        .await?;
    hr.create_employee(person("Ivan", "Petrov", "2500.45", Some(eng.id))?)
        .await?;
    hr.create_employee(person("Yuri", "Ivanov", "1000", None)?)
        .await?;
    hr.patch_department(
        eng.id,
        DepartmentPatch {
            name: None,
            director: Some(Some(head.id)),
        },
    )
    .await?;

    let eng = hr.get_department(eng.id).await?;
    assert_eq!(eng.num_employees, 2);
    assert_eq!(eng.total_salary.to_string(), "6700.55");
    assert_eq!(eng.employees.len(), 1);

    let empty = hr.get_department(empty.id).await?;
    assert_eq!(empty.num_employees, 0);
    assert_eq!(empty.total_salary.to_string(), "0.00");

    let filter = EmployeeFilter {
        surname: Some("IVANOV".into()),
        ..EmployeeFilter::default()
    };
    assert_eq!(hr.list_employees(&filter, 1).await?.total, 2);

    hr.create_employee(person("Oleg", "Смирнов", "1000", None)?)
        .await?;
    let filter = EmployeeFilter {
        surname: Some("СМИР".into()),
        ..EmployeeFilter::default()
    };
    assert_eq!(hr.list_employees(&filter, 1).await?.total, 1);

    let filter = EmployeeFilter {
        surname: Some("%".into()),
        ..EmployeeFilter::default()
    };
    assert_eq!(hr.list_employees(&filter, 1).await?.total, 0);

    let filter = EmployeeFilter {
        department: Some("Engineering".into()),
        surname: Some("pet".into()),
    };
    assert_eq!(hr.list_employees(&filter, 1).await?.total, 1);

    hr.delete_employee(head.id).await?;
    assert!(hr.get_department(eng.id).await?.director.is_none());
    Ok(())
}
