use chrono::NaiveDate;
use entity::{department, employee};
use platform_db::{PageRequest, Paged, fetch_page};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::body::{FieldwiseBody, NOT_A_STRING, invalid_reference};
use crate::error::{HrError, HrResult, NON_FIELD_ERRORS, Violations};
use crate::{HrModule, clean, money, nullable, photo};

const NAME_MAX_CHARS: usize = 50;
const POSITION_MAX_CHARS: usize = 100;
const REQUIRED: &str = "This field is required.";

/// Query-string filters for the employee list. Empty values are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmployeeFilter {
    /// Exact, case-sensitive department name.
    pub department: Option<String>,
    /// Case-insensitive fragment of the surname.
    pub surname: Option<String>,
}

impl EmployeeFilter {
    fn department(&self) -> Option<&str> {
        self.department.as_deref().filter(|value| !value.is_empty())
    }

    fn surname(&self) -> Option<&str> {
        self.surname.as_deref().filter(|value| !value.is_empty())
    }
}

/// Body of a create or full update. Absent optional fields are cleared.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmployeeInput {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub photo: Option<String>,
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub age: Option<i32>,
    /// Department id; must reference an existing department.
    pub department: Option<Uuid>,
}

/// Body of a partial update. `null` clears a nullable field, an absent key
/// leaves it untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmployeePatch {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub surname: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub patronymic: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub photo: Option<Option<String>>,
    pub position: Option<String>,
    pub salary: Option<Decimal>,
    pub age: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub department: Option<Option<Uuid>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmployeeView {
    pub id: Uuid,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    /// Public URL of the photo, if one is recorded.
    pub photo: Option<String>,
    pub position: String,
    pub salary: Decimal,
    pub age: i32,
    /// Name of the department the employee belongs to.
    pub department: Option<String>,
}

impl EmployeeView {
    pub(crate) fn render(
        model: employee::Model,
        department: Option<String>,
        media_url: &str,
    ) -> Self {
        Self {
            id: model.id,
            name: model.name,
            surname: model.surname,
            patronymic: model.patronymic,
            photo: model
                .photo
                .map(|path| photo::public_url(&path, media_url)),
            position: model.position,
            salary: money::from_cents(model.salary_cents),
            age: model.age,
            department,
        }
    }
}

/// Input that passed field validation, in storage form.
#[derive(Debug)]
struct EmployeeFields {
    name: Option<String>,
    surname: Option<String>,
    patronymic: Option<String>,
    photo: Option<String>,
    position: String,
    salary_cents: i64,
    age: i32,
    department_id: Option<Uuid>,
}

impl EmployeeInput {
    fn validate(self, media_url: &str, today: NaiveDate) -> HrResult<EmployeeFields> {
        let mut violations = Violations::default();

        let name = clean(self.name);
        let surname = clean(self.surname);
        let patronymic = clean(self.patronymic);
        for (field, value) in [
            ("name", &name),
            ("surname", &surname),
            ("patronymic", &patronymic),
        ] {
            check_length(&mut violations, field, value.as_deref(), NAME_MAX_CHARS);
        }

        let photo = match clean(self.photo) {
            Some(reference) => match photo::storage_path(&reference, media_url, today) {
                Ok(path) => Some(path),
                Err(message) => {
                    violations.push("photo", message);
                    None
                }
            },
            None => None,
        };

        let position = match self.position.map(|raw| raw.trim().to_owned()) {
            None => {
                violations.push("position", REQUIRED);
                String::new()
            }
            Some(position) if position.is_empty() => {
                violations.push("position", "This field may not be blank.");
                position
            }
            Some(position) => {
                check_length(
                    &mut violations,
                    "position",
                    Some(&position),
                    POSITION_MAX_CHARS,
                );
                position
            }
        };

        let salary_cents = match self.salary.map(money::to_cents) {
            None => {
                violations.push("salary", REQUIRED);
                0
            }
            Some(Err(message)) => {
                violations.push("salary", message);
                0
            }
            Some(Ok(cents)) => cents,
        };

        let age = self.age.unwrap_or_else(|| {
            violations.push("age", REQUIRED);
            0
        });

        violations.finish()?;
        Ok(EmployeeFields {
            name,
            surname,
            patronymic,
            photo,
            position,
            salary_cents,
            age,
            department_id: self.department,
        })
    }
}

fn invalid_employee_value(field: &str, value: &Value) -> String {
    match field {
        "salary" => "A valid number is required.".into(),
        "age" => "A valid integer is required.".into(),
        "department" => invalid_reference(value),
        _ => NOT_A_STRING.into(),
    }
}

impl FieldwiseBody for EmployeeInput {
    fn invalid_value(field: &str, value: &Value) -> String {
        invalid_employee_value(field, value)
    }
}

impl FieldwiseBody for EmployeePatch {
    fn invalid_value(field: &str, value: &Value) -> String {
        invalid_employee_value(field, value)
    }
}

impl EmployeePatch {
    /// Overlays the patch on the stored record, yielding a full input.
    fn merge(self, current: employee::Model) -> EmployeeInput {
        EmployeeInput {
            name: self.name.unwrap_or(current.name),
            surname: self.surname.unwrap_or(current.surname),
            patronymic: self.patronymic.unwrap_or(current.patronymic),
            photo: self.photo.unwrap_or(current.photo),
            position: Some(self.position.unwrap_or(current.position)),
            salary: Some(
                self.salary
                    .unwrap_or_else(|| money::from_cents(current.salary_cents)),
            ),
            age: Some(self.age.unwrap_or(current.age)),
            department: self.department.unwrap_or(current.department_id),
        }
    }
}

fn check_length(violations: &mut Violations, field: &str, value: Option<&str>, max: usize) {
    if value.is_some_and(|text| text.chars().count() > max) {
        violations.push(
            field,
            format!("Ensure this field has no more than {max} characters."),
        );
    }
}

const LIKE_ESCAPE: char = '!';

/// `LIKE` pattern matching `fragment` anywhere, with wildcards taken literally.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Surnames are folded in Rust on write: SQLite's `LOWER()` only folds ASCII.
fn search_key(surname: Option<&str>) -> Option<String> {
    surname.map(str::to_lowercase)
}

fn surname_contains(fragment: &str) -> SimpleExpr {
    Expr::col((employee::Entity, employee::Column::SurnameSearch))
        .like(LikeExpr::new(contains_pattern(fragment)).escape(LIKE_ESCAPE))
}

impl HrModule {
    #[instrument(name = "hr.employees.list", skip(self))]
    pub async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: u64,
    ) -> HrResult<Paged<EmployeeView>> {
        let mut query = employee::Entity::find().find_also_related(department::Entity);
        if let Some(name) = filter.department() {
            query = query.filter(department::Column::Name.eq(name));
        }
        if let Some(fragment) = filter.surname() {
            query = query.filter(surname_contains(fragment));
        }
        let query = query
            .order_by_asc(employee::Column::Surname)
            .order_by_asc(employee::Column::Name)
            .order_by_asc(employee::Column::Id);

        let request = PageRequest::new(page, self.settings.page_size);
        let paged = fetch_page(query.paginate(&self.db, request.page_size), request).await?;
        let media_url = &self.settings.media_url;
        Ok(paged.map(|(model, department)| {
            EmployeeView::render(model, department.map(|d| d.name), media_url)
        }))
    }

    #[instrument(name = "hr.employees.get", skip(self))]
    pub async fn get_employee(&self, id: Uuid) -> HrResult<EmployeeView> {
        let (model, department) = employee::Entity::find_by_id(id)
            .find_also_related(department::Entity)
            .one(&self.db)
            .await?
            .ok_or(HrError::employee_not_found(id))?;
        Ok(EmployeeView::render(
            model,
            department.map(|d| d.name),
            &self.settings.media_url,
        ))
    }

    #[instrument(name = "hr.employees.create", skip_all)]
    pub async fn create_employee(&self, input: EmployeeInput) -> HrResult<EmployeeView> {
        let fields = input.validate(&self.settings.media_url, self.today())?;
        let department = self.resolve_department(fields.department_id).await?;
        self.ensure_unique_name(&fields, None).await?;

        let model = active_model(fields, Set(Uuid::new_v4()))
            .insert(&self.db)
            .await?;
        tracing::info!(employee_id = %model.id, "employee created");
        Ok(EmployeeView::render(
            model,
            department.map(|d| d.name),
            &self.settings.media_url,
        ))
    }

    #[instrument(name = "hr.employees.update", skip(self, input))]
    pub async fn update_employee(&self, id: Uuid, input: EmployeeInput) -> HrResult<EmployeeView> {
        self.find_employee(id).await?;
        self.save_employee(id, input).await
    }

    #[instrument(name = "hr.employees.patch", skip(self, patch))]
    pub async fn patch_employee(&self, id: Uuid, patch: EmployeePatch) -> HrResult<EmployeeView> {
        let current = self.find_employee(id).await?;
        self.save_employee(id, patch.merge(current)).await
    }

    /// Removes the employee, first releasing any department they direct.
    #[instrument(name = "hr.employees.delete", skip(self))]
    pub async fn delete_employee(&self, id: Uuid) -> HrResult<()> {
        let txn = self.db.begin().await?;
        if employee::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(HrError::employee_not_found(id));
        }
        let released = department::Entity::update_many()
            .col_expr(
                department::Column::DirectorId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(department::Column::DirectorId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        employee::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        tracing::info!(employee_id = %id, released, "employee deleted");
        Ok(())
    }

    async fn save_employee(&self, id: Uuid, input: EmployeeInput) -> HrResult<EmployeeView> {
        let fields = input.validate(&self.settings.media_url, self.today())?;
        let department = self.resolve_department(fields.department_id).await?;
        self.ensure_unique_name(&fields, Some(id)).await?;

        let model = active_model(fields, Unchanged(id))
            .update(&self.db)
            .await?;
        tracing::info!(employee_id = %id, "employee updated");
        Ok(EmployeeView::render(
            model,
            department.map(|d| d.name),
            &self.settings.media_url,
        ))
    }

    pub(crate) async fn find_employee(&self, id: Uuid) -> HrResult<employee::Model> {
        employee::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(HrError::employee_not_found(id))
    }

    async fn resolve_department(&self, id: Option<Uuid>) -> HrResult<Option<department::Model>> {
        let Some(id) = id else {
            return Ok(None);
        };
        department::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Some)
            .ok_or(HrError::department_not_found(id))
    }

    /// Name parts must be unique within a department; absent parts compare
    /// equal, which the database index alone does not enforce.
    async fn ensure_unique_name(
        &self,
        fields: &EmployeeFields,
        current: Option<Uuid>,
    ) -> HrResult<()> {
        let Some(department_id) = fields.department_id else {
            return Ok(());
        };
        let clashes = name_clashes(&self.db, department_id, fields, current).await?;
        if clashes == 0 {
            return Ok(());
        }
        let mut violations = Violations::default();
        violations.push(
            NON_FIELD_ERRORS,
            "The fields department, surname, name, patronymic must make a unique set.",
        );
        violations.finish()
    }
}

async fn name_clashes<C: ConnectionTrait>(
    db: &C,
    department_id: Uuid,
    fields: &EmployeeFields,
    current: Option<Uuid>,
) -> HrResult<u64> {
    let mut query = employee::Entity::find().filter(employee::Column::DepartmentId.eq(department_id));
    for (column, value) in [
        (employee::Column::Name, &fields.name),
        (employee::Column::Surname, &fields.surname),
        (employee::Column::Patronymic, &fields.patronymic),
    ] {
        query = query.filter(match value {
            Some(text) => column.eq(text.as_str()),
            None => column.is_null(),
        });
    }
    if let Some(id) = current {
        query = query.filter(employee::Column::Id.ne(id));
    }
    Ok(query.count(db).await?)
}

fn active_model(
    fields: EmployeeFields,
    id: sea_orm::ActiveValue<Uuid>,
) -> employee::ActiveModel {
    employee::ActiveModel {
        id,
        name: Set(fields.name),
        surname_search: Set(search_key(fields.surname.as_deref())),
        surname: Set(fields.surname),
        patronymic: Set(fields.patronymic),
        photo: Set(fields.photo),
        position: Set(fields.position),
        salary_cents: Set(fields.salary_cents),
        age: Set(fields.age),
        department_id: Set(fields.department_id),
    }
}
