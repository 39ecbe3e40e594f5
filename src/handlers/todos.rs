use crate::error::ApiError;
use crate::models::{MessageResponse, NewTodo, TodoChanges, TodoResponse, UpdatedTodoResponse};
use crate::routes;
use crate::state::AppState;
use crate::validation::{parse_body, validate_create, validate_update};
use axum::{body::Bytes, extract::Path, extract::State, http::StatusCode, Json};

/// POST /api/v1/todos handler - Create a todo
///
/// The body is read as raw bytes so that malformed JSON is reported the same
/// way as a failed validation profile.
#[utoipa::path(
    post,
    path = routes::TODOS,
    request_body = NewTodo,
    responses(
        (status = 200, description = "Todo created", body = TodoResponse),
        (
            status = 400,
            description = "Validation Error or Cannot create todo",
            body = MessageResponse
        )
    ),
    tag = "todos"
)]
pub async fn create_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<TodoResponse>), ApiError> {
    let payload = parse_body(&body).and_then(|value| validate_create(&value))?;

    let todo = state
        .store
        .create(payload)
        .await
        .map_err(ApiError::CreateFailed)?;

    tracing::info!("Created todo with id: {}", todo.id);
    Ok((
        StatusCode::OK,
        Json(TodoResponse {
            message: "Todo Created".to_string(),
            todo,
        }),
    ))
}

/// PUT /api/v1/todos/:id handler - Partially update a todo
///
/// There is no existence check; an unknown id fails like any other store error.
#[utoipa::path(
    put,
    path = routes::TODO_ITEM,
    params(
        ("id" = String, Path, description = "Id of the todo to update")
    ),
    request_body = TodoChanges,
    responses(
        (status = 200, description = "Todo updated", body = UpdatedTodoResponse),
        (status = 400, description = "Validation Error or Unable to update", body = MessageResponse)
    ),
    tag = "todos"
)]
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<UpdatedTodoResponse>), ApiError> {
    let changes = parse_body(&body).and_then(|value| validate_update(&value))?;

    let updated_todo = state
        .store
        .update(&id, changes)
        .await
        .map_err(ApiError::UpdateFailed)?;

    tracing::info!("Updated todo with id: {}", id);
    Ok((
        StatusCode::OK,
        Json(UpdatedTodoResponse {
            message: "Todo Updated".to_string(),
            updated_todo,
        }),
    ))
}

/// DELETE /api/v1/todos/delete/:id handler - Delete a todo
///
/// Looks the record up first; a missing id is answered with "Data not valid"
/// and no delete is issued. On success the record as it was before deletion
/// is returned.
#[utoipa::path(
    delete,
    path = routes::TODO_DELETE,
    params(
        ("id" = String, Path, description = "Id of the todo to delete")
    ),
    responses(
        (status = 200, description = "Todo deleted", body = TodoResponse),
        (status = 400, description = "Data not valid or Unable to delete", body = MessageResponse)
    ),
    tag = "todos"
)]
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiError> {
    let Some(todo) = state
        .store
        .find_by_id(&id)
        .await
        .map_err(ApiError::DeleteFailed)?
    else {
        return Err(ApiError::DataNotValid(id));
    };

    state
        .store
        .delete(&id)
        .await
        .map_err(ApiError::DeleteFailed)?;

    tracing::info!("Deleted todo with id: {}", id);
    Ok((
        StatusCode::OK,
        Json(TodoResponse {
            message: "Todo Deleted".to_string(),
            todo,
        }),
    ))
}
