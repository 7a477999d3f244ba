use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub name: Option<String>,
    #[sea_orm(indexed)]
    pub surname: Option<String>,
    /// Lowercased `surname`, matched by the surname filter.
    #[sea_orm(indexed)]
    pub surname_search: Option<String>,
    pub patronymic: Option<String>,
    pub photo: Option<String>,
    pub position: String,
    /// Salary in minor currency units (two implied decimal places).
    pub salary_cents: i64,
    pub age: i32,
    #[sea_orm(indexed)]
    pub department_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_delete = "SetNull"
    )]
    Department,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
