use chrono::Utc;
use sea_orm::{DatabaseConnection, prelude::DateTimeWithTimeZone};

use crate::{
    db::{category_repo, todo_repo, todo_repo::TodoWithCategory},
    error::AppError,
};

const TITLE_MIN_CHARS: usize = 3;
const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Default, Clone)]
pub struct NewTodo {
    pub title: Option<String>,
    pub category_id: Option<i32>,
    pub due_time: Option<DateTimeWithTimeZone>,
}

/// A partial update. `due_time` is doubly optional: the outer `None` leaves
/// the stored value untouched, `Some(None)` clears it.
#[derive(Debug, Default, Clone)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub category_id: Option<i32>,
    pub due_time: Option<Option<DateTimeWithTimeZone>>,
}

pub async fn list_todos(db: &DatabaseConnection) -> Result<Vec<TodoWithCategory>, AppError> {
    Ok(todo_repo::list_all(db).await?)
}

pub async fn get_todo(db: &DatabaseConnection, id: i32) -> Result<TodoWithCategory, AppError> {
    todo_repo::find_by_id(db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Todo item not found"))
}

pub async fn list_by_category(
    db: &DatabaseConnection,
    category_id: i32,
) -> Result<Vec<TodoWithCategory>, AppError> {
    if !category_repo::exists(db, category_id).await? {
        return Err(AppError::not_found("Category not found"));
    }
    Ok(todo_repo::list_by_category(db, category_id).await?)
}

pub async fn list_completed(db: &DatabaseConnection) -> Result<Vec<TodoWithCategory>, AppError> {
    Ok(todo_repo::list_completed(db).await?)
}

pub async fn list_pending(db: &DatabaseConnection) -> Result<Vec<TodoWithCategory>, AppError> {
    Ok(todo_repo::list_pending(db).await?)
}

pub async fn list_overdue(db: &DatabaseConnection) -> Result<Vec<TodoWithCategory>, AppError> {
    Ok(todo_repo::list_overdue(db).await?)
}

pub async fn create_todo(
    db: &DatabaseConnection,
    input: NewTodo,
) -> Result<TodoWithCategory, AppError> {
    let title = validate_title(input.title.as_deref())?;
    let category_id = require_category(db, input.category_id).await?;
    if let Some(due_time) = input.due_time {
        validate_due_time(due_time, Utc::now().fixed_offset())?;
    }

    let created = todo_repo::insert(db, &title, category_id, input.due_time).await?;
    // Re-read so the response carries the joined category.
    todo_repo::find_by_id(db, created.id)
        .await?
        .ok_or_else(|| AppError::not_found("Todo item not found"))
}

pub async fn update_todo(
    db: &DatabaseConnection,
    id: i32,
    patch: TodoPatch,
) -> Result<TodoWithCategory, AppError> {
    let Some((existing, _)) = todo_repo::find_by_id(db, id).await? else {
        return Err(AppError::not_found("Todo item not found"));
    };

    let title = merge_title(&existing.title, patch.title.as_deref())?;
    let category_id = match patch.category_id {
        // Re-selecting the current category is a no-op, not an error.
        Some(requested) if existing.category_id == Some(requested) => existing.category_id,
        Some(requested) => Some(require_category(db, Some(requested)).await?),
        None => existing.category_id,
    };
    let due_time = merge_due_time(existing.due_time, patch.due_time, Utc::now().fixed_offset())?;
    // Toggling completion carries no validation.
    let is_completed = patch.is_completed.unwrap_or(existing.is_completed);

    let updated =
        todo_repo::update(db, existing, title, is_completed, category_id, due_time).await?;
    // The joined category held in memory may be stale after a category change.
    todo_repo::find_by_id(db, updated.id)
        .await?
        .ok_or_else(|| AppError::not_found("Todo item not found"))
}

pub async fn delete_todo(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    if !todo_repo::delete(db, id).await? {
        return Err(AppError::not_found("Todo item not found"));
    }
    Ok(())
}

fn validate_title(title: Option<&str>) -> Result<String, AppError> {
    let Some(raw) = title else {
        return Err(AppError::bad_request("Title is required"));
    };
    let trimmed = raw.trim();
    let length = trimmed.chars().count();
    if length < TITLE_MIN_CHARS || length > TITLE_MAX_CHARS {
        return Err(AppError::bad_request(
            "Title must be between 3 and 200 characters",
        ));
    }
    Ok(trimmed.to_string())
}

/// Update-side title rule: an empty or unchanged title means no change was
/// requested, which differs from create where an empty title is rejected.
fn merge_title(current: &str, requested: Option<&str>) -> Result<String, AppError> {
    let Some(raw) = requested else {
        return Ok(current.to_string());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == current {
        return Ok(current.to_string());
    }
    let length = trimmed.chars().count();
    if length < TITLE_MIN_CHARS || length > TITLE_MAX_CHARS {
        return Err(AppError::bad_request(
            "Title must be between 3 and 200 characters",
        ));
    }
    Ok(trimmed.to_string())
}

fn merge_due_time(
    current: Option<DateTimeWithTimeZone>,
    requested: Option<Option<DateTimeWithTimeZone>>,
    now: DateTimeWithTimeZone,
) -> Result<Option<DateTimeWithTimeZone>, AppError> {
    match requested {
        None => Ok(current),
        // Clearing is always permitted, even on a completed item.
        Some(None) => Ok(None),
        Some(Some(due_time)) if current == Some(due_time) => Ok(current),
        Some(Some(due_time)) => {
            validate_due_time(due_time, now)?;
            Ok(Some(due_time))
        }
    }
}

fn validate_due_time(
    due_time: DateTimeWithTimeZone,
    now: DateTimeWithTimeZone,
) -> Result<(), AppError> {
    if due_time <= now {
        return Err(AppError::bad_request("Due time must be in the future"));
    }
    Ok(())
}

async fn require_category(
    db: &DatabaseConnection,
    category_id: Option<i32>,
) -> Result<i32, AppError> {
    let Some(id) = category_id else {
        return Err(AppError::bad_request("Category id is required"));
    };
    if id <= 0 {
        return Err(AppError::bad_request(
            "Category id must be a positive integer",
        ));
    }
    if !category_repo::exists(db, id).await? {
        return Err(AppError::bad_request("Category does not exist"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn now() -> DateTimeWithTimeZone {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn create_title_is_required() {
        assert!(validate_title(None).is_err());
    }

    #[test]
    fn create_title_rejects_out_of_range_lengths() {
        assert!(validate_title(Some("ab")).is_err());
        assert!(validate_title(Some("   ")).is_err());
        assert!(validate_title(Some(&"x".repeat(201))).is_err());
        assert_eq!(validate_title(Some("abc")).unwrap(), "abc");
        assert_eq!(validate_title(Some(&"x".repeat(200))).unwrap(), "x".repeat(200));
    }

    #[test]
    fn create_title_is_trimmed_before_the_length_check() {
        assert_eq!(validate_title(Some("  buy milk  ")).unwrap(), "buy milk");
        assert!(validate_title(Some("  ab  ")).is_err());
    }

    #[test]
    fn update_title_ignores_empty_and_unchanged_values() {
        assert_eq!(merge_title("Ship report", None).unwrap(), "Ship report");
        assert_eq!(merge_title("Ship report", Some("")).unwrap(), "Ship report");
        assert_eq!(merge_title("Ship report", Some("   ")).unwrap(), "Ship report");
        assert_eq!(
            merge_title("Ship report", Some("Ship report")).unwrap(),
            "Ship report"
        );
    }

    #[test]
    fn update_title_still_validates_a_real_change() {
        assert!(merge_title("Ship report", Some("ab")).is_err());
        assert!(merge_title("Ship report", Some(&"x".repeat(201))).is_err());
        assert_eq!(
            merge_title("Ship report", Some("Ship v2")).unwrap(),
            "Ship v2"
        );
    }

    #[test]
    fn due_time_must_be_strictly_future() {
        assert!(validate_due_time(now() - Duration::hours(1), now()).is_err());
        assert!(validate_due_time(now(), now()).is_err());
        assert!(validate_due_time(now() + Duration::seconds(1), now()).is_ok());
    }

    #[test]
    fn merge_due_time_leaves_the_value_untouched_when_absent() {
        let current = Some(now() + Duration::days(1));
        assert_eq!(merge_due_time(current, None, now()).unwrap(), current);
        assert_eq!(merge_due_time(None, None, now()).unwrap(), None);
    }

    #[test]
    fn merge_due_time_clears_on_explicit_null_without_futurity_check() {
        let past = Some(now() - Duration::days(1));
        assert_eq!(merge_due_time(past, Some(None), now()).unwrap(), None);
    }

    #[test]
    fn merge_due_time_treats_identical_value_as_no_op() {
        // A stored value that has already slipped into the past must not be
        // rejected when the client echoes it back unchanged.
        let stale = Some(now() - Duration::hours(2));
        assert_eq!(merge_due_time(stale, Some(stale), now()).unwrap(), stale);
    }

    #[test]
    fn merge_due_time_validates_a_new_value() {
        let future = now() + Duration::days(2);
        assert_eq!(
            merge_due_time(None, Some(Some(future)), now()).unwrap(),
            Some(future)
        );
        assert!(merge_due_time(None, Some(Some(now() - Duration::minutes(5))), now()).is_err());
    }
}
