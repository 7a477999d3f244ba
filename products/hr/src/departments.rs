use std::collections::HashMap;

use entity::{department, employee};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::body::{FieldwiseBody, NOT_A_STRING, invalid_reference};
use crate::employees::EmployeeView;
use crate::error::{HrError, HrResult, Violations};
use crate::{HrModule, money, nullable};

const NAME_MAX_CHARS: usize = 100;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DepartmentInput {
    pub name: Option<String>,
    /// Employee id of the director; must reference an existing employee.
    pub director: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub director: Option<Option<Uuid>>,
}

fn invalid_department_value(field: &str, value: &Value) -> String {
    match field {
        "director" => invalid_reference(value),
        _ => NOT_A_STRING.into(),
    }
}

impl FieldwiseBody for DepartmentInput {
    fn invalid_value(field: &str, value: &Value) -> String {
        invalid_department_value(field, value)
    }
}

impl FieldwiseBody for DepartmentPatch {
    fn invalid_value(field: &str, value: &Value) -> String {
        invalid_department_value(field, value)
    }
}

/// A department with its derived headcount and payroll.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepartmentView {
    pub id: Uuid,
    pub name: String,
    pub num_employees: u64,
    pub total_salary: Decimal,
    pub director: Option<EmployeeView>,
    /// Members of the department other than its director.
    pub employees: Vec<EmployeeView>,
}

#[derive(Debug, FromQueryResult)]
struct DepartmentTotals {
    department_id: Uuid,
    num_employees: i64,
    total_salary_cents: i64,
}

#[derive(Debug)]
struct DepartmentFields {
    name: String,
    director_id: Option<Uuid>,
}

impl DepartmentInput {
    fn validate(self) -> HrResult<DepartmentFields> {
        let mut violations = Violations::default();
        let name = match self.name.map(|raw| raw.trim().to_owned()) {
            None => {
                violations.push("name", "This field is required.");
                String::new()
            }
            Some(name) if name.is_empty() => {
                violations.push("name", "This field may not be blank.");
                name
            }
            Some(name) => {
                if name.chars().count() > NAME_MAX_CHARS {
                    violations.push(
                        "name",
                        format!("Ensure this field has no more than {NAME_MAX_CHARS} characters."),
                    );
                }
                name
            }
        };
        violations.finish()?;
        Ok(DepartmentFields {
            name,
            director_id: self.director,
        })
    }
}

impl DepartmentPatch {
    fn merge(self, current: department::Model) -> DepartmentInput {
        DepartmentInput {
            name: Some(self.name.unwrap_or(current.name)),
            director: self.director.unwrap_or(current.director_id),
        }
    }
}

impl HrModule {
    /// All departments ordered by name, each with its aggregates.
    #[instrument(name = "hr.departments.list", skip(self))]
    pub async fn list_departments(&self) -> HrResult<Vec<DepartmentView>> {
        let departments = department::Entity::find()
            .order_by_asc(department::Column::Name)
            .order_by_asc(department::Column::Id)
            .all(&self.db)
            .await?;
        self.assemble(departments).await
    }

    #[instrument(name = "hr.departments.get", skip(self))]
    pub async fn get_department(&self, id: Uuid) -> HrResult<DepartmentView> {
        let department = self.find_department(id).await?;
        self.assemble_one(department).await
    }

    #[instrument(name = "hr.departments.create", skip_all)]
    pub async fn create_department(&self, input: DepartmentInput) -> HrResult<DepartmentView> {
        let fields = input.validate()?;
        self.check_director(fields.director_id, None).await?;
        let model = department::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(fields.name),
            director_id: Set(fields.director_id),
        }
        .insert(&self.db)
        .await?;
        tracing::info!(department_id = %model.id, "department created");
        self.assemble_one(model).await
    }

    #[instrument(name = "hr.departments.update", skip(self, input))]
    pub async fn update_department(
        &self,
        id: Uuid,
        input: DepartmentInput,
    ) -> HrResult<DepartmentView> {
        self.find_department(id).await?;
        self.save_department(id, input).await
    }

    #[instrument(name = "hr.departments.patch", skip(self, patch))]
    pub async fn patch_department(
        &self,
        id: Uuid,
        patch: DepartmentPatch,
    ) -> HrResult<DepartmentView> {
        let current = self.find_department(id).await?;
        self.save_department(id, patch.merge(current)).await
    }

    /// Removes the department; its employees stay on record, unassigned.
    #[instrument(name = "hr.departments.delete", skip(self))]
    pub async fn delete_department(&self, id: Uuid) -> HrResult<()> {
        let txn = self.db.begin().await?;
        if department::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(HrError::department_not_found(id));
        }
        let unassigned = employee::Entity::update_many()
            .col_expr(
                employee::Column::DepartmentId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(employee::Column::DepartmentId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        department::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        tracing::info!(department_id = %id, unassigned, "department deleted");
        Ok(())
    }

    async fn save_department(&self, id: Uuid, input: DepartmentInput) -> HrResult<DepartmentView> {
        let fields = input.validate()?;
        self.check_director(fields.director_id, Some(id)).await?;
        let model = department::ActiveModel {
            id: Unchanged(id),
            name: Set(fields.name),
            director_id: Set(fields.director_id),
        }
        .update(&self.db)
        .await?;
        tracing::info!(department_id = %id, "department updated");
        self.assemble_one(model).await
    }

    async fn find_department(&self, id: Uuid) -> HrResult<department::Model> {
        department::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(HrError::department_not_found(id))
    }

    /// The director must exist and may direct only one department.
    async fn check_director(&self, director: Option<Uuid>, current: Option<Uuid>) -> HrResult<()> {
        let Some(director_id) = director else {
            return Ok(());
        };
        self.find_employee(director_id).await?;

        let mut query =
            department::Entity::find().filter(department::Column::DirectorId.eq(director_id));
        if let Some(id) = current {
            query = query.filter(department::Column::Id.ne(id));
        }
        if query.count(&self.db).await? > 0 {
            let mut violations = Violations::default();
            violations.push("director", "department with this director already exists.");
            return violations.finish();
        }
        Ok(())
    }

    async fn assemble_one(&self, department: department::Model) -> HrResult<DepartmentView> {
        let id = department.id;
        self.assemble(vec![department])
            .await?
            .pop()
            .ok_or(HrError::department_not_found(id))
    }

    /// Attaches aggregates, the director and the member list. Issues a fixed
    /// number of queries regardless of how many departments are passed.
    async fn assemble(&self, departments: Vec<department::Model>) -> HrResult<Vec<DepartmentView>> {
        if departments.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = departments.iter().map(|d| d.id).collect();
        let media_url = &self.settings.media_url;

        let totals = self.department_totals(&ids).await?;

        let mut members: HashMap<Uuid, Vec<employee::Model>> = HashMap::new();
        for model in employee::Entity::find()
            .filter(employee::Column::DepartmentId.is_in(ids.iter().copied()))
            .order_by_asc(employee::Column::Surname)
            .order_by_asc(employee::Column::Name)
            .order_by_asc(employee::Column::Id)
            .all(&self.db)
            .await?
        {
            if let Some(department_id) = model.department_id {
                members.entry(department_id).or_default().push(model);
            }
        }

        let director_ids: Vec<Uuid> = departments.iter().filter_map(|d| d.director_id).collect();
        let mut directors: HashMap<Uuid, EmployeeView> = HashMap::new();
        if !director_ids.is_empty() {
            for (model, home) in employee::Entity::find()
                .filter(employee::Column::Id.is_in(director_ids))
                .find_also_related(department::Entity)
                .all(&self.db)
                .await?
            {
                let view = EmployeeView::render(model, home.map(|d| d.name), media_url);
                directors.insert(view.id, view);
            }
        }

        Ok(departments
            .into_iter()
            .map(|department| {
                let (num_employees, total_cents) = totals
                    .get(&department.id)
                    .map(|t| (t.num_employees, t.total_salary_cents))
                    .unwrap_or_default();
                let employees = members
                    .remove(&department.id)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|member| Some(member.id) != department.director_id)
                    .map(|member| {
                        EmployeeView::render(member, Some(department.name.clone()), media_url)
                    })
                    .collect();
                let director = department
                    .director_id
                    .and_then(|id| directors.get(&id).cloned());
                DepartmentView {
                    id: department.id,
                    name: department.name,
                    num_employees: u64::try_from(num_employees).unwrap_or_default(),
                    total_salary: money::from_cents(total_cents),
                    director,
                    employees,
                }
            })
            .collect())
    }

    /// Headcount and salary sum per department in one grouped query.
    /// Departments without employees are absent from the map.
    async fn department_totals(&self, ids: &[Uuid]) -> HrResult<HashMap<Uuid, DepartmentTotals>> {
        let salary_sum = Func::cast_as(
            Func::coalesce([
                Expr::col((employee::Entity, employee::Column::SalaryCents)).sum(),
                Expr::val(0i64).into(),
            ]),
            Alias::new("BIGINT"),
        );
        let rows = employee::Entity::find()
            .select_only()
            .column(employee::Column::DepartmentId)
            .column_as(
                Expr::col((employee::Entity, employee::Column::Id)).count(),
                "num_employees",
            )
            .column_as(SimpleExpr::from(salary_sum), "total_salary_cents")
            .filter(employee::Column::DepartmentId.is_in(ids.iter().copied()))
            .group_by(employee::Column::DepartmentId)
            .into_model::<DepartmentTotals>()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.department_id, row))
            .collect())
    }
}
