use routinely_core::db::open_db_in_memory;
use routinely_core::{
    upsert_routine, CatalogError, CatalogRepository, CatalogService, Routine, RoutineTask,
    SqliteCatalogRepository,
};
use rusqlite::Connection;

const USER: &str = "user-a";

#[test]
fn list_routines_returns_seeded_catalog_in_id_order() {
    let conn = open_db_in_memory().unwrap();
    upsert_routine(&conn, &routine("night-owl", "The Night Owl")).unwrap();
    upsert_routine(&conn, &routine("early-bird", "The Early Bird")).unwrap();

    let repo = SqliteCatalogRepository::new(&conn);
    let catalog = repo.list_routines().unwrap();

    assert!(catalog.warnings.is_empty());
    let ids: Vec<&str> = catalog
        .routines
        .iter()
        .map(|routine| routine.id.as_str())
        .collect();
    assert_eq!(ids, ["early-bird", "night-owl"]);
}

#[test]
fn malformed_routine_is_skipped_with_warning_not_error() {
    let conn = open_db_in_memory().unwrap();
    upsert_routine(&conn, &routine("healthy", "Healthy")).unwrap();
    insert_raw_routine(&conn, "broken-json", "not json at all");
    insert_raw_routine(
        &conn,
        "bad-offset",
        r#"[{"time":90000,"taskName":"late","description":""}]"#,
    );

    let repo = SqliteCatalogRepository::new(&conn);
    let catalog = repo.list_routines().unwrap();

    assert_eq!(catalog.routines.len(), 1);
    assert_eq!(catalog.routines[0].id, "healthy");
    assert_eq!(catalog.warnings.len(), 2);
    let skipped: Vec<&str> = catalog
        .warnings
        .iter()
        .map(|warning| warning.routine_id.as_str())
        .collect();
    assert!(skipped.contains(&"broken-json"));
    assert!(skipped.contains(&"bad-offset"));
}

#[test]
fn get_routine_surfaces_malformed_record_as_error() {
    let conn = open_db_in_memory().unwrap();
    insert_raw_routine(&conn, "broken", "{{");

    let repo = SqliteCatalogRepository::new(&conn);
    let err = repo.get_routine("broken").unwrap_err();
    assert!(matches!(
        err,
        CatalogError::MalformedRoutine { routine_id, .. } if routine_id == "broken"
    ));
}

#[test]
fn purchases_start_empty_and_grow_per_user() {
    let conn = open_db_in_memory().unwrap();
    upsert_routine(&conn, &routine("morning", "Morning")).unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    assert!(repo.list_purchases(USER).unwrap().is_empty());

    let service = CatalogService::new(SqliteCatalogRepository::new(&conn), USER);
    service.purchase_at("morning", 1_700_000_000).unwrap();

    let purchased = service.purchased_ids().unwrap();
    assert_eq!(purchased.len(), 1);
    assert!(service.is_purchased(&purchased, "morning"));
    assert!(!service.is_purchased(&purchased, "night-owl"));

    let other = CatalogService::new(SqliteCatalogRepository::new(&conn), "user-b");
    assert!(other.purchased_ids().unwrap().is_empty());
}

#[test]
fn repeat_purchase_keeps_one_record_with_original_date() {
    let conn = open_db_in_memory().unwrap();
    upsert_routine(&conn, &routine("morning", "Morning")).unwrap();
    let service = CatalogService::new(SqliteCatalogRepository::new(&conn), USER);

    let first = service.purchase_at("morning", 1_700_000_000).unwrap();
    let second = service.purchase_at("morning", 1_800_000_000).unwrap();

    assert_eq!(first.purchase_date, 1_700_000_000);
    assert_eq!(second.purchase_date, 1_700_000_000);

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM purchases;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn append_task_preserves_order_and_validates() {
    let conn = open_db_in_memory().unwrap();
    upsert_routine(&conn, &routine("morning", "Morning")).unwrap();
    let repo = SqliteCatalogRepository::new(&conn);

    repo.append_task("morning", &task(28_800, "gym")).unwrap();

    let stored = repo.get_routine("morning").unwrap().unwrap();
    let names: Vec<&str> = stored
        .tasks
        .iter()
        .map(|task| task.task_name.as_str())
        .collect();
    assert_eq!(names, ["wake up", "lights out", "gym"]);

    let invalid = repo.append_task("morning", &task(86_400, "too late"));
    assert!(matches!(invalid, Err(CatalogError::InvalidTask(_))));

    let missing = repo.append_task("no-such-routine", &task(60, "ok"));
    assert!(matches!(missing, Err(CatalogError::RoutineNotFound(id)) if id == "no-such-routine"));
}

#[test]
fn unreachable_collection_surfaces_as_unavailable() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE routines;").unwrap();

    let repo = SqliteCatalogRepository::new(&conn);
    assert!(matches!(
        repo.list_routines(),
        Err(CatalogError::Unavailable(_))
    ));

    conn.execute_batch("DROP TABLE purchases;").unwrap();
    assert!(matches!(
        repo.list_purchases(USER),
        Err(CatalogError::Unavailable(_))
    ));
}

fn routine(id: &str, name: &str) -> Routine {
    Routine {
        id: id.to_string(),
        celebrity_name: name.to_string(),
        photo: format!("https://cdn.example.com/{id}.jpg"),
        description: format!("{name} daily routine"),
        tasks: vec![task(21_600, "wake up"), task(79_200, "lights out")],
    }
}

fn task(time: i64, name: &str) -> RoutineTask {
    RoutineTask {
        time,
        task_name: name.to_string(),
        description: String::new(),
    }
}

fn insert_raw_routine(conn: &Connection, id: &str, tasks_json: &str) {
    conn.execute(
        "INSERT INTO routines (id, celebrity_name, photo, description, tasks)
         VALUES (?1, 'Broken', '', '', ?2);",
        rusqlite::params![id, tasks_json],
    )
    .unwrap();
}
