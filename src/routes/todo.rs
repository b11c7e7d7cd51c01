use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse},
    routing::get,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    db::{entities::category, todo_repo::TodoWithCategory},
    error::AppError,
    services::todo_service::{self, NewTodo, TodoPatch},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: Option<String>,
    pub category_id: Option<i32>,
    pub due_time: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable_field")]
    pub due_time: Option<Option<DateTimeWithTimeZone>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: i32,
    pub title: String,
    pub is_completed: bool,
    pub created_at: DateTimeWithTimeZone,
    pub due_time: Option<DateTimeWithTimeZone>,
    pub category: Option<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/completed", get(list_completed))
        .route("/api/todos/pending", get(list_pending))
        .route("/api/todos/overdue", get(list_overdue))
        .route("/api/todos/category/{category_id}", get(list_by_category))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(state)
}

async fn list_todos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = todo_service::list_todos(&state.db).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

async fn get_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<TodoResponse>, AppError> {
    let todo = todo_service::get_todo(&state.db, id).await?;
    Ok(Json(todo.into()))
}

async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i32>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = todo_service::list_by_category(&state.db, category_id).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

async fn list_completed(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = todo_service::list_completed(&state.db).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

async fn list_pending(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = todo_service::list_pending(&state.db).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

async fn list_overdue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let todos = todo_service::list_overdue(&state.db).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

async fn create_todo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTodoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = NewTodo {
        title: body.title,
        category_id: body.category_id,
        due_time: body.due_time,
    };
    let created = todo_service::create_todo(&state.db, input).await?;
    let location = format!("/api/todos/{}", created.0.id);
    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::LOCATION, location)]),
        Json(TodoResponse::from(created)),
    ))
}

async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, AppError> {
    let patch = TodoPatch {
        title: body.title,
        is_completed: body.is_completed,
        category_id: body.category_id,
        due_time: body.due_time,
    };
    let updated = todo_service::update_todo(&state.db, id, patch).await?;
    Ok(Json(updated.into()))
}

async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    todo_service::delete_todo(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Distinguishes an absent `dueTime` from an explicit `"dueTime": null`.
fn nullable_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<TodoWithCategory> for TodoResponse {
    fn from((item, category): TodoWithCategory) -> Self {
        Self {
            id: item.id,
            title: item.title,
            is_completed: item.is_completed,
            created_at: item.created_at,
            due_time: item.due_time,
            category: category.map(CategorySummary::from),
        }
    }
}

impl From<category::Model> for CategorySummary {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}
