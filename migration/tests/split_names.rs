use migration::{Migrator, MigratorTrait};
use sea_orm_migration::sea_orm::{
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement, Value,
    prelude::Uuid,
};

async fn legacy_database() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, Some(1)).await.unwrap();
    db
}

async fn insert_legacy(db: &DatabaseConnection, full_name: &str) -> Uuid {
    let id = Uuid::new_v4();
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO employee (id, full_name, photo, position, salary_cents, age, department_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            full_name.into(),
            Value::from(None::<String>),
            "Engineer".into(),
            150_000i64.into(),
            30.into(),
            Value::from(None::<Uuid>),
        ],
    ))
    .await
    .unwrap();
    id
}

async fn name_columns(
    db: &DatabaseConnection,
    id: Uuid,
) -> (Option<String>, Option<String>, Option<String>) {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT name, surname, patronymic FROM employee WHERE id = ?",
            vec![id.into()],
        ))
        .await
        .unwrap()
        .expect("employee row survives the migration");
    (
        row.try_get("", "name").unwrap(),
        row.try_get("", "surname").unwrap(),
        row.try_get("", "patronymic").unwrap(),
    )
}

#[tokio::test]
async fn split_migration_rewrites_legacy_names() {
    let db = legacy_database().await;
    let three = insert_legacy(&db, "Anna Maria Ivanova").await;
    let two = insert_legacy(&db, "Ivan Petrov").await;
    let one = insert_legacy(&db, "Cher").await;
    let many = insert_legacy(&db, "Juan Carlos de la Cruz").await;

    Migrator::up(&db, None).await.unwrap();

    assert_eq!(
        name_columns(&db, three).await,
        (
            Some("Anna".into()),
            Some("Maria".into()),
            Some("Ivanova".into())
        )
    );
    assert_eq!(
        name_columns(&db, two).await,
        (Some("Ivan".into()), Some("Petrov".into()), None)
    );
    assert_eq!(name_columns(&db, one).await, (Some("Cher".into()), None, None));
    assert_eq!(
        name_columns(&db, many).await,
        (
            Some("Juan".into()),
            Some("Carlos".into()),
            Some("de".into())
        )
    );
}

#[tokio::test]
async fn split_migration_drops_full_name_column() {
    let db = legacy_database().await;
    insert_legacy(&db, "Anna Maria Ivanova").await;
    Migrator::up(&db, None).await.unwrap();

    let err = db
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT full_name FROM employee",
        ))
        .await
        .expect_err("full_name column should be gone");
    assert!(err.to_string().contains("full_name"));
}

#[tokio::test]
async fn no_migrations_pending_after_up() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let pending = Migrator::get_pending_migrations(&db).await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn split_surnames_are_folded_for_search() {
    let db = legacy_database().await;
    let id = insert_legacy(&db, "Ivan Иванов").await;
    let nameless = insert_legacy(&db, "Cher").await;
    Migrator::up(&db, None).await.unwrap();

    for (id, expected) in [(id, Some("иванов".to_owned())), (nameless, None)] {
        let row = db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT surname_search FROM employee WHERE id = ?",
                vec![id.into()],
            ))
            .await
            .unwrap()
            .unwrap();
        let folded: Option<String> = row.try_get("", "surname_search").unwrap();
        assert_eq!(folded, expected);
    }
}
