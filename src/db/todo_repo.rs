use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, prelude::DateTimeWithTimeZone,
};

use super::entities::prelude::{Category, TodoItem};
use super::entities::{category, todo_item};

/// Every read path hands back the joined category inline so callers never
/// trigger a secondary per-item fetch.
pub type TodoWithCategory = (todo_item::Model, Option<category::Model>);

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<TodoWithCategory>, sea_orm::DbErr> {
    TodoItem::find()
        .find_also_related(Category)
        .order_by_desc(todo_item::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn find_by_id(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<TodoWithCategory>, sea_orm::DbErr> {
    TodoItem::find_by_id(id)
        .find_also_related(Category)
        .one(db)
        .await
}

/// An unknown category id yields an empty list here; existence is the
/// caller's concern.
pub async fn list_by_category(
    db: &DatabaseConnection,
    category_id: i32,
) -> Result<Vec<TodoWithCategory>, sea_orm::DbErr> {
    TodoItem::find()
        .find_also_related(Category)
        .filter(todo_item::Column::CategoryId.eq(category_id))
        .order_by_desc(todo_item::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn list_completed(
    db: &DatabaseConnection,
) -> Result<Vec<TodoWithCategory>, sea_orm::DbErr> {
    TodoItem::find()
        .find_also_related(Category)
        .filter(todo_item::Column::IsCompleted.eq(true))
        .order_by_desc(todo_item::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn list_pending(
    db: &DatabaseConnection,
) -> Result<Vec<TodoWithCategory>, sea_orm::DbErr> {
    TodoItem::find()
        .find_also_related(Category)
        .filter(todo_item::Column::IsCompleted.eq(false))
        .order_by_desc(todo_item::Column::CreatedAt)
        .all(db)
        .await
}

/// Most overdue first. The cutoff is captured once, not per row.
pub async fn list_overdue(
    db: &DatabaseConnection,
) -> Result<Vec<TodoWithCategory>, sea_orm::DbErr> {
    let now = Utc::now().fixed_offset();
    TodoItem::find()
        .find_also_related(Category)
        .filter(todo_item::Column::IsCompleted.eq(false))
        .filter(todo_item::Column::DueTime.is_not_null())
        .filter(todo_item::Column::DueTime.lt(now))
        .order_by_asc(todo_item::Column::DueTime)
        .all(db)
        .await
}

pub async fn insert(
    db: &DatabaseConnection,
    title: &str,
    category_id: i32,
    due_time: Option<DateTimeWithTimeZone>,
) -> Result<todo_item::Model, sea_orm::DbErr> {
    let model = todo_item::ActiveModel {
        title: Set(title.to_string()),
        is_completed: Set(false),
        created_at: Set(Utc::now().fixed_offset()),
        due_time: Set(due_time),
        category_id: Set(Some(category_id)),
        ..Default::default()
    };
    model.insert(db).await
}

/// Whole-entity overwrite of the mutable columns; merging a partial update
/// onto the loaded row is the caller's job.
pub async fn update(
    db: &DatabaseConnection,
    item: todo_item::Model,
    title: String,
    is_completed: bool,
    category_id: Option<i32>,
    due_time: Option<DateTimeWithTimeZone>,
) -> Result<todo_item::Model, sea_orm::DbErr> {
    let mut active: todo_item::ActiveModel = item.into();
    active.title = Set(title);
    active.is_completed = Set(is_completed);
    active.category_id = Set(category_id);
    active.due_time = Set(due_time);
    active.update(db).await
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, sea_orm::DbErr> {
    let result = TodoItem::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}

pub async fn exists(db: &DatabaseConnection, id: i32) -> Result<bool, sea_orm::DbErr> {
    let count = TodoItem::find()
        .filter(todo_item::Column::Id.eq(id))
        .count(db)
        .await?;
    Ok(count > 0)
}

pub async fn count_by_category(
    db: &DatabaseConnection,
    category_id: i32,
) -> Result<u64, sea_orm::DbErr> {
    TodoItem::find()
        .filter(todo_item::Column::CategoryId.eq(category_id))
        .count(db)
        .await
}
