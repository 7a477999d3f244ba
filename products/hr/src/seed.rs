use entity::department;
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, PaginatorTrait};
use tracing::instrument;

use crate::{DepartmentInput, DepartmentPatch, EmployeeInput, HrModule, HrResult};

/// Outcome of [`HrModule::seed_demo`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub departments: usize,
    pub employees: usize,
    /// The database already held departments; nothing was written.
    pub skipped: bool,
}

struct DemoEmployee {
    name: &'static str,
    surname: &'static str,
    patronymic: Option<&'static str>,
    position: &'static str,
    salary_cents: i64,
    age: i32,
    directs: bool,
}

const DEMO: &[(&str, &[DemoEmployee])] = &[
    (
        "Engineering",
        &[
            DemoEmployee {
                name: "Anna",
                surname: "Ivanova",
                patronymic: Some("Sergeevna"),
                position: "Head of Engineering",
                salary_cents: 420_000_00,
                age: 41,
                directs: true,
            },
            DemoEmployee {
                name: "Ivan",
                surname: "Petrov",
                patronymic: None,
                position: "Backend Engineer",
                salary_cents: 250_000_00,
                age: 29,
                directs: false,
            },
            DemoEmployee {
                name: "Maria",
                surname: "Sokolova",
                patronymic: Some("Andreevna"),
                position: "QA Engineer",
                salary_cents: 180_000_00,
                age: 33,
                directs: false,
            },
        ],
    ),
    (
        "Finance",
        &[
            DemoEmployee {
                name: "Oleg",
                surname: "Smirnov",
                patronymic: Some("Pavlovich"),
                position: "CFO",
                salary_cents: 390_000_00,
                age: 52,
                directs: true,
            },
            DemoEmployee {
                name: "Elena",
                surname: "Kuznetsova",
                patronymic: None,
                position: "Accountant",
                salary_cents: 120_000_50,
                age: 37,
                directs: false,
            },
        ],
    ),
    ("People Ops", &[]),
];

impl HrModule {
    /// Populates an empty database with demo departments and employees.
    /// Safe to run repeatedly.
    #[instrument(name = "hr.seed", skip(self))]
    pub async fn seed_demo(&self) -> HrResult<SeedSummary> {
        if department::Entity::find().count(&self.db).await? > 0 {
            tracing::info!("departments already present; skipping seed");
            return Ok(SeedSummary {
                skipped: true,
                ..SeedSummary::default()
            });
        }

        let mut summary = SeedSummary::default();
        for (department_name, staff) in DEMO {
            let department = self
                .create_department(DepartmentInput {
                    name: Some((*department_name).to_owned()),
                    director: None,
                })
                .await?;
            summary.departments += 1;

            for person in staff.iter() {
                let employee = self
                    .create_employee(EmployeeInput {
                        name: Some(person.name.to_owned()),
                        surname: Some(person.surname.to_owned()),
                        patronymic: person.patronymic.map(str::to_owned),
                        photo: None,
                        position: Some(person.position.to_owned()),
                        salary: Some(Decimal::new(person.salary_cents, 2)),
                        age: Some(person.age),
                        department: Some(department.id),
                    })
                    .await?;
                summary.employees += 1;

                if person.directs {
                    self.patch_department(
                        department.id,
                        DepartmentPatch {
                            name: None,
                            director: Some(Some(employee.id)),
                        },
                    )
                    .await?;
                }
            }
        }
        tracing::info!(
            departments = summary.departments,
            employees = summary.employees,
            "demo data seeded"
        );
        Ok(summary)
    }
}
