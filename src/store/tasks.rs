//! Task persistence, always scoped by explicit ids or owner. Ownership
//! decisions are made above this layer; nothing here inspects the
//! authenticated identity.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::task::{Task, TaskQuery};

const TASK_COLUMNS: &str =
    "id, title, description, priority, completed, due_date, owner, created_at, updated_at";

pub async fn insert_task(pool: &PgPool, task: &Task) -> Result<Task, AppError> {
    let sql = format!(
        "INSERT INTO tasks ({})
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        TASK_COLUMNS, TASK_COLUMNS
    );
    super::bounded(
        "insert_task",
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.completed)
            .bind(task.due_date)
            .bind(task.owner)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(pool),
    )
    .await
}

pub async fn find_task_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Task>, AppError> {
    let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
    super::bounded(
        "find_task_by_id",
        sqlx::query_as::<_, Task>(&sql).bind(id).fetch_optional(pool),
    )
    .await
}

/// Persists the mutable fields of an already-loaded task. Returns `None` when
/// the row vanished between the ownership check and the write (lost
/// delete race); callers surface that as not-found.
pub async fn update_task(pool: &PgPool, task: &Task) -> Result<Option<Task>, AppError> {
    let sql = format!(
        "UPDATE tasks
         SET title = $1, description = $2, priority = $3, completed = $4, due_date = $5, updated_at = $6
         WHERE id = $7
         RETURNING {}",
        TASK_COLUMNS
    );
    super::bounded(
        "update_task",
        sqlx::query_as::<_, Task>(&sql)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.completed)
            .bind(task.due_date)
            .bind(task.updated_at)
            .bind(task.id)
            .fetch_optional(pool),
    )
    .await
}

/// Hard-deletes a task row. Returns whether a row was actually removed.
pub async fn delete_task(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
    let result = super::bounded(
        "delete_task",
        sqlx::query("DELETE FROM tasks WHERE id = $1").bind(id).execute(pool),
    )
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Lists an owner's tasks, newest first, with optional completion/priority
/// filters appended dynamically.
pub async fn list_tasks_by_owner(
    pool: &PgPool,
    owner: Uuid,
    query: &TaskQuery,
) -> Result<Vec<Task>, AppError> {
    let mut sql = format!("SELECT {} FROM tasks WHERE owner = $1", TASK_COLUMNS);
    let mut param_count = 2;

    if query.completed.is_some() {
        sql.push_str(&format!(" AND completed = ${}", param_count));
        param_count += 1;
    }
    if query.priority.is_some() {
        sql.push_str(&format!(" AND priority = ${}", param_count));
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut query_builder = sqlx::query_as::<_, Task>(&sql).bind(owner);
    if let Some(completed) = query.completed {
        query_builder = query_builder.bind(completed);
    }
    if let Some(priority) = query.priority {
        query_builder = query_builder.bind(priority);
    }

    super::bounded("list_tasks_by_owner", query_builder.fetch_all(pool)).await
}

/// Counts an owner's tasks, optionally restricted by completion state.
pub async fn count_tasks_by_owner(
    pool: &PgPool,
    owner: Uuid,
    completed: Option<bool>,
) -> Result<i64, AppError> {
    let mut sql = String::from("SELECT COUNT(*) FROM tasks WHERE owner = $1");
    if completed.is_some() {
        sql.push_str(" AND completed = $2");
    }

    let mut query_builder = sqlx::query_scalar::<_, i64>(&sql).bind(owner);
    if let Some(completed) = completed {
        query_builder = query_builder.bind(completed);
    }

    super::bounded("count_tasks_by_owner", query_builder.fetch_one(pool)).await
}
