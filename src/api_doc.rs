use utoipa::OpenApi;

use crate::error::{HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{
    MessageResponse, NewTodo, Todo, TodoChanges, TodoResponse, UpdatedTodoResponse,
};

pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI: &str = "/swagger-ui";

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "todo-api",
        version = "1.0.0",
        description = "Create, update and delete todos"
    ),
    paths(
        handlers::health::root_handler,
        handlers::health::health_handler,
        handlers::todos::create_handler,
        handlers::todos::update_handler,
        handlers::todos::delete_handler
    ),
    components(
        schemas(
            Todo,
            NewTodo,
            TodoChanges,
            TodoResponse,
            UpdatedTodoResponse,
            MessageResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Liveness and readiness"),
        (name = "todos", description = "Todo operations")
    )
)]
pub struct ApiDoc;
