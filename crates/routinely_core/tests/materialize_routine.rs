use chrono::{FixedOffset, NaiveDate, Utc};
use routinely_core::db::open_db_in_memory;
use routinely_core::{
    day_bounds, MaterializeError, Routine, RoutineTask, ScheduleService, SqliteTodoRepository,
    TodoItem, TodoRepoError, TodoRepoResult, TodoRepository,
};
use std::cell::RefCell;
use std::collections::HashSet;

const USER: &str = "user-a";

#[test]
fn materialize_creates_one_item_per_task_on_the_chosen_day() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(SqliteTodoRepository::new(&conn), USER);

    let routine = routine_with_tasks(vec![
        task(21_600, "morning run"),
        task(72_000, "evening reading"),
    ]);
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

    let created = service.materialize(&routine, date, &Utc).unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].due_date, 1_710_028_800 + 21_600);
    assert_eq!(created[1].due_date, 1_710_028_800 + 72_000);
    assert!(created.iter().all(|item| !item.is_done));

    let stored = SqliteTodoRepository::new(&conn).list_items(USER).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].title, "morning run");
    assert_eq!(stored[1].title, "evening reading");
}

#[test]
fn due_dates_stay_inside_the_target_day_bounds() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(SqliteTodoRepository::new(&conn), USER);

    let routine = routine_with_tasks(vec![task(0, "midnight"), task(86_399, "last second")]);
    let date = NaiveDate::from_ymd_opt(2023, 11, 5).unwrap();
    let tz = FixedOffset::west_opt(5 * 3600).unwrap();

    let created = service.materialize(&routine, date, &tz).unwrap();
    let (start, end) = day_bounds(date, &tz).unwrap();
    for item in &created {
        assert!(item.due_date >= start && item.due_date < end);
    }
}

#[test]
fn same_routine_on_two_dates_shifts_by_whole_days() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(SqliteTodoRepository::new(&conn), USER);

    let routine = routine_with_tasks(vec![task(45_000, "midday check")]);
    let first_day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    let later_day = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();

    let first = service.materialize(&routine, first_day, &Utc).unwrap();
    let later = service.materialize(&routine, later_day, &Utc).unwrap();
    assert_eq!(later[0].due_date - first[0].due_date, 3 * 86_400);
}

#[test]
fn empty_routine_materializes_to_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(SqliteTodoRepository::new(&conn), USER);

    let routine = routine_with_tasks(Vec::new());
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

    let created = service.materialize(&routine, date, &Utc).unwrap();
    assert!(created.is_empty());
    assert!(SqliteTodoRepository::new(&conn)
        .list_items(USER)
        .unwrap()
        .is_empty());
}

#[test]
fn past_dates_are_accepted() {
    let conn = open_db_in_memory().unwrap();
    let service = ScheduleService::new(SqliteTodoRepository::new(&conn), USER);

    let routine = routine_with_tasks(vec![task(3_600, "retro entry")]);
    let date = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();

    let created = service.materialize(&routine, date, &Utc).unwrap();
    assert_eq!(created.len(), 1);
}

#[test]
fn partial_write_failure_names_failed_task_indices() {
    let repo = FlakyTodoRepository::failing_on(["stretch", "journal"]);
    let service = ScheduleService::new(repo, USER);

    let routine = routine_with_tasks(vec![
        task(21_600, "wake up"),
        task(23_400, "stretch"),
        task(25_200, "breakfast"),
        task(79_200, "journal"),
    ]);
    let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

    let err = service.materialize(&routine, date, &Utc).unwrap_err();
    match err {
        MaterializeError::Partial { created, failed } => {
            let created_titles: Vec<&str> =
                created.iter().map(|item| item.title.as_str()).collect();
            assert_eq!(created_titles, ["wake up", "breakfast"]);

            let failed_indices: Vec<usize> = failed.iter().map(|task| task.index).collect();
            assert_eq!(failed_indices, [1, 3]);
            assert_eq!(failed[0].task_name, "stretch");
            assert_eq!(failed[1].task_name, "journal");
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct FlakyTodoRepository {
    store: RefCell<Vec<TodoItem>>,
    failing_titles: HashSet<String>,
}

impl FlakyTodoRepository {
    fn failing_on<const N: usize>(titles: [&str; N]) -> Self {
        Self {
            store: RefCell::new(Vec::new()),
            failing_titles: titles.iter().map(|title| title.to_string()).collect(),
        }
    }
}

impl TodoRepository for FlakyTodoRepository {
    fn create_item(&self, _user_id: &str, item: &TodoItem) -> TodoRepoResult<()> {
        if self.failing_titles.contains(&item.title) {
            return Err(TodoRepoError::InvalidData(format!(
                "simulated write failure for `{}`",
                item.title
            )));
        }
        self.store.borrow_mut().push(item.clone());
        Ok(())
    }

    fn update_item(&self, _user_id: &str, item: &TodoItem) -> TodoRepoResult<()> {
        let mut store = self.store.borrow_mut();
        match store.iter_mut().find(|stored| stored.id == item.id) {
            Some(stored) => {
                *stored = item.clone();
                Ok(())
            }
            None => Err(TodoRepoError::NotFound(item.id.clone())),
        }
    }

    fn get_item(&self, _user_id: &str, id: &str) -> TodoRepoResult<Option<TodoItem>> {
        Ok(self
            .store
            .borrow()
            .iter()
            .find(|item| item.id == id)
            .cloned())
    }

    fn list_items(&self, _user_id: &str) -> TodoRepoResult<Vec<TodoItem>> {
        let mut items = self.store.borrow().clone();
        items.sort_by(|a, b| (a.due_date, &a.id).cmp(&(b.due_date, &b.id)));
        Ok(items)
    }

    fn delete_item(&self, _user_id: &str, id: &str) -> TodoRepoResult<()> {
        self.store.borrow_mut().retain(|item| item.id != id);
        Ok(())
    }
}

fn routine_with_tasks(tasks: Vec<RoutineTask>) -> Routine {
    Routine {
        id: "sample".to_string(),
        celebrity_name: "Sample Star".to_string(),
        photo: String::new(),
        description: String::new(),
        tasks,
    }
}

fn task(time: i64, name: &str) -> RoutineTask {
    RoutineTask {
        time,
        task_name: name.to_string(),
        description: String::new(),
    }
}
