pub mod models;
pub mod registry;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use lending_kernel::{InitCtx, Module};
use serde_json::json;

use crate::app::Library;

/// Book registration, lookup, update and removal over HTTP
pub struct BooksModule {
    library: Library,
}

impl BooksModule {
    pub fn new(library: Library) -> Self {
        Self { library }
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
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.library.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({ "$ref": "#/components/schemas/ErrorResponse" });
        let book = json!({ "$ref": "#/components/schemas/Book" });
        let id_param = json!({
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });
        let paging = json!([
            { "name": "page", "in": "query", "schema": { "type": "integer", "default": 0 } },
            { "name": "size", "in": "query", "schema": { "type": "integer", "default": 20 } }
        ]);

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Filter books by partial title/author",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "title", "in": "query", "schema": { "type": "string" } },
                            { "name": "author", "in": "query", "schema": { "type": "string" } },
                            paging[0], paging[1]
                        ],
                        "responses": {
                            "200": { "description": "Page of books" },
                            "400": { "description": "Invalid page", "content": { "application/json": { "schema": error } } }
                        }
                    },
                    "post": {
                        "summary": "Register a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/NewBook" } } }
                        },
                        "responses": {
                            "201": { "description": "Registered book", "content": { "application/json": { "schema": book } } },
                            "409": { "description": "Duplicate isbn", "content": { "application/json": { "schema": error } } },
                            "422": { "description": "Empty field", "content": { "application/json": { "schema": error } } }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "Book", "content": { "application/json": { "schema": book } } },
                            "404": { "description": "Book not found", "content": { "application/json": { "schema": error } } }
                        }
                    },
                    "put": {
                        "summary": "Update title and author",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/UpdateBook" } } }
                        },
                        "responses": {
                            "200": { "description": "Updated book", "content": { "application/json": { "schema": book } } },
                            "404": { "description": "Book not found", "content": { "application/json": { "schema": error } } }
                        }
                    },
                    "delete": {
                        "summary": "Remove a book that is not on loan",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "204": { "description": "Removed" },
                            "404": { "description": "Book not found", "content": { "application/json": { "schema": error } } },
                            "409": { "description": "Book is on loan", "content": { "application/json": { "schema": error } } }
                        }
                    }
                },
                "/{id}/loans": {
                    "get": {
                        "summary": "Loans of a book",
                        "tags": ["Books"],
                        "parameters": [id_param, paging[0], paging[1]],
                        "responses": {
                            "200": { "description": "Page of loans" },
                            "404": { "description": "Book not found", "content": { "application/json": { "schema": error } } }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": { "description": "OK", "content": { "text/plain": { "schema": { "type": "string" } } } }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string" }
                        },
                        "required": ["id", "title", "author", "isbn"]
                    },
                    "NewBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "isbn": { "type": "string" }
                        },
                        "required": ["title", "author", "isbn"]
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" }
                        },
                        "required": ["title", "author"]
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

/// Create a new instance of the books module
pub fn create_module(library: Library) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(library))
}
