use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Task;
use crate::store;

/// Decides whether `user_id` may operate on `task`.
///
/// The policy is deliberately distinguishing: a task that exists but belongs
/// to someone else is a 403, not a 404, and the same policy applies to every
/// task operation (read, update, delete). The denied owner id is logged;
/// the response body names neither owner nor task content.
pub fn authorize_owner(task: Task, user_id: Uuid) -> Result<Task, AppError> {
    if task.owner != user_id {
        log::warn!(
            "user {} denied access to task {} held by another owner",
            user_id,
            task.id
        );
        return Err(AppError::Forbidden(
            "Not authorized to access this task".into(),
        ));
    }
    Ok(task)
}

/// Loads a task by id and enforces ownership in one step.
///
/// Missing task → `NotFound`; foreign task → `Forbidden`; otherwise the task
/// is returned for the caller to read, mutate, or delete. Note the
/// check-then-act window: a concurrent delete after this returns is resolved
/// at write time, where the loser observes not-found.
pub async fn load_owned_task(
    pool: &PgPool,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Task, AppError> {
    match store::tasks::find_task_by_id(pool, task_id).await? {
        Some(task) => authorize_owner(task, user_id),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}
