use crate::{
    auth::{load_owned_task, CurrentUser},
    error::AppError,
    models::{Task, TaskInput, TaskPatch, TaskQuery, TaskStats},
    store,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Maximum accepted description length, shared by create and update payloads.
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Validates a partial update. The derive covers the title; the description
/// sits inside a double `Option` (to keep `null` distinguishable from
/// absent), which the derive cannot reach, so its length is checked here.
fn validate_patch(patch: &TaskPatch) -> Result<(), AppError> {
    patch.validate()?;
    if let Some(Some(description)) = &patch.description {
        if description.len() > MAX_DESCRIPTION_LEN {
            return Err(AppError::ValidationError(
                "description: must be at most 2000 characters".into(),
            ));
        }
    }
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    Ok(())
}

/// Retrieves the authenticated user's tasks, newest first.
///
/// Listing is always scoped to the owner resolved by the authentication gate;
/// optional `completed` and `priority` query parameters narrow it further.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of `Task` objects.
/// - `401 Unauthorized`: If the request lacks a valid session token.
/// - `503 Service Unavailable`: If the storage boundary times out.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let tasks = store::tasks::list_tasks_by_owner(&pool, user.0.id, &query_params).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// The owner is taken from the verified identity, never from the payload, and
/// is immutable from then on. New tasks start incomplete with medium priority
/// unless the payload says otherwise.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid session token.
/// - `422 Unprocessable Entity`: If input validation on `TaskInput` fails.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    // Validate input
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.0.id);
    let result = store::tasks::insert_task(&pool, &task).await?;

    Ok(HttpResponse::Created().json(result))
}

/// Per-owner task counts: total, completed, and pending.
///
/// Registered ahead of the `/{id}` routes so the literal path wins.
#[get("/stats")]
pub async fn get_stats(
    pool: web::Data<PgPool>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let total = store::tasks::count_tasks_by_owner(&pool, user.0.id, None).await?;
    let completed = store::tasks::count_tasks_by_owner(&pool, user.0.id, Some(true)).await?;

    Ok(HttpResponse::Ok().json(TaskStats {
        total,
        completed,
        pending: total - completed,
    }))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid session token.
/// - `403 Forbidden`: If the task belongs to another user.
/// - `404 Not Found`: If no task with the given ID exists.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = load_owned_task(&pool, task_id.into_inner(), user.0.id).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates a task the authenticated user owns.
///
/// Partial update semantics: only supplied fields change, omitted fields keep
/// their prior values, and an explicit `null` clears an optional field. The
/// lookup-then-write pair is not atomic; losing a race against a concurrent
/// delete surfaces as 404.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid session token.
/// - `403 Forbidden`: If the task belongs to another user.
/// - `404 Not Found`: If no task with the given ID exists.
/// - `422 Unprocessable Entity`: If the patch fails validation.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskPatch>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let patch = task_data.into_inner();
    validate_patch(&patch)?;

    let mut task = load_owned_task(&pool, task_id.into_inner(), user.0.id).await?;
    task.apply_patch(patch);

    match store::tasks::update_task(&pool, &task).await? {
        Some(updated) => Ok(HttpResponse::Ok().json(updated)),
        None => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Deletes a task the authenticated user owns.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `401 Unauthorized`: If the request lacks a valid session token.
/// - `403 Forbidden`: If the task belongs to another user.
/// - `404 Not Found`: If no task with the given ID exists.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: CurrentUser,
) -> Result<impl Responder, AppError> {
    let task = load_owned_task(&pool, task_id.into_inner(), user.0.id).await?;

    if !store::tasks::delete_task(&pool, task.id).await? {
        // Row vanished between the ownership check and the delete.
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::NoContent().finish())
}
