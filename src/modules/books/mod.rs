pub mod handlers;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRef,
    routing::{delete, get},
    Router,
};
use bookworm_authz::SessionGuard;
use bookworm_db::{BookStore, UserStore};
use bookworm_kernel::{InitCtx, Module};
use bookworm_media::MediaHost;
use serde_json::json;

use crate::services::Services;

/// Router state for the book endpoints. Every route is behind the session guard.
#[derive(Clone)]
pub struct BooksState {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
    pub media: Arc<dyn MediaHost>,
    pub guard: SessionGuard,
}

impl FromRef<BooksState> for SessionGuard {
    fn from_ref(state: &BooksState) -> Self {
        state.guard.clone()
    }
}

/// Book reviews: create, browse, and delete
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(state: BooksState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            media_provider = ?ctx.settings.media.provider,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list_books).post(handlers::create_book))
            .route("/user", get(handlers::list_my_books))
            .route("/{id}", delete(handlers::delete_book))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let body = |description: &str, schema: serde_json::Value| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": schema } }
            })
        };
        let secured = json!([{ "bearerAuth": [] }]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books, newest first",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [
                            { "name": "page", "in": "query", "schema": { "type": "integer", "default": 1 } },
                            { "name": "limit", "in": "query", "schema": { "type": "integer", "default": 10 } }
                        ],
                        "responses": {
                            "200": body("A page of books", json!({ "$ref": "#/components/schemas/BookPage" })),
                            "401": error("Missing or invalid session"),
                            "500": error("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book review",
                        "tags": ["Books"],
                        "security": secured,
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": body("Book created", json!({ "$ref": "#/components/schemas/Book" })),
                            "400": error("Missing fields or rating out of range"),
                            "401": error("Missing or invalid session"),
                            "500": error("Upload or save failed")
                        }
                    }
                },
                "/user": {
                    "get": {
                        "summary": "List the caller's books",
                        "tags": ["Books"],
                        "security": secured,
                        "responses": {
                            "200": body("The caller's books", json!({
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            })),
                            "401": error("Missing or invalid session"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/{id}": {
                    "delete": {
                        "summary": "Delete one of the caller's books",
                        "tags": ["Books"],
                        "security": secured,
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": body("Book deleted", json!({ "$ref": "#/components/schemas/Message" })),
                            "401": error("Missing or invalid session"),
                            "403": error("Caller does not own the book"),
                            "404": error("Book not found"),
                            "500": error("Image cleanup or delete failed")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string" },
                            "title": { "type": "string" },
                            "caption": { "type": "string" },
                            "image": { "type": "string", "format": "uri" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "user": { "type": "string" },
                            "createdAt": { "type": "string", "format": "date-time" },
                            "updatedAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["_id", "title", "caption", "image", "rating", "user", "createdAt", "updatedAt"]
                    },
                    "BookOwner": {
                        "type": "object",
                        "description": "Null when the owner account no longer exists",
                        "properties": {
                            "_id": { "type": "string" },
                            "username": { "type": "string" },
                            "profileImage": { "type": "string", "format": "uri" }
                        }
                    },
                    "BookWithOwner": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Book" },
                            {
                                "type": "object",
                                "properties": {
                                    "user": { "$ref": "#/components/schemas/BookOwner" }
                                }
                            }
                        ]
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/BookWithOwner" }
                            },
                            "currentPage": { "type": "integer" },
                            "totalBooks": { "type": "integer" },
                            "totalPages": { "type": "integer" }
                        },
                        "required": ["books", "currentPage", "totalBooks", "totalPages"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "caption": { "type": "string" },
                            "image": { "type": "string", "description": "Data URI or remote image URL" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 }
                        },
                        "required": ["title", "caption", "image", "rating"]
                    },
                    "Message": {
                        "type": "object",
                        "properties": { "message": { "type": "string" } },
                        "required": ["message"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over the shared services
pub fn create_module(services: &Services) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(BooksState {
        books: services.books.clone(),
        users: services.users.clone(),
        media: services.media.clone(),
        guard: services.session_guard(),
    }))
}
