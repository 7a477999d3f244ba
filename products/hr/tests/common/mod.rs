#![allow(dead_code)]

use migration::{Migrator, MigratorTrait};
use products_hr::{
    DepartmentInput, DepartmentPatch, DepartmentView, EmployeeInput, EmployeeView, HrModule,
    HrSettings,
};
use rust_decimal::Decimal;
use sea_orm::Database;
use uuid::Uuid;

pub async fn setup(page_size: u64) -> HrModule {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    HrModule::new(
        db,
        HrSettings {
            page_size,
            ..HrSettings::default()
        },
    )
}

pub async fn department(hr: &HrModule, name: &str) -> DepartmentView {
    hr.create_department(DepartmentInput {
        name: Some(name.into()),
        director: None,
    })
    .await
    .unwrap()
}

pub fn person(name: &str, surname: &str, salary: &str, department: Option<Uuid>) -> EmployeeInput {
    EmployeeInput {
        name: Some(name.into()),
        surname: Some(surname.into()),
        patronymic: None,
        photo: None,
        position: Some("Engineer".into()),
        salary: Some(salary.parse::<Decimal>().unwrap()),
        age: Some(30),
        department,
    }
}

pub async fn hire(
    hr: &HrModule,
    name: &str,
    surname: &str,
    salary: &str,
    department: Option<Uuid>,
) -> EmployeeView {
    hr.create_employee(person(name, surname, salary, department))
        .await
        .unwrap()
}

pub async fn appoint(hr: &HrModule, department: Uuid, director: Uuid) -> DepartmentView {
    hr.patch_department(
        department,
        DepartmentPatch {
            name: None,
            director: Some(Some(director)),
        },
    )
    .await
    .unwrap()
}
