pub mod ledger;
pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use lending_kernel::{InitCtx, Module};
use serde_json::json;

use crate::app::Library;

/// Lending, returns and loan queries over HTTP
pub struct LoansModule {
    library: Library,
}

impl LoansModule {
    pub fn new(library: Library) -> Self {
        Self { library }
    }
}

#[async_trait]
impl Module for LoansModule {
    fn name(&self) -> &'static str {
        "loans"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            overdue_days = ledger::OVERDUE_DAYS,
            "loans module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.library.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({ "$ref": "#/components/schemas/ErrorResponse" });
        let view = json!({ "$ref": "#/components/schemas/LoanView" });
        let id_param = json!({
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Loans whose book has the isbn OR whose customer matches",
                        "tags": ["Loans"],
                        "parameters": [
                            { "name": "isbn", "in": "query", "schema": { "type": "string" } },
                            { "name": "customer", "in": "query", "schema": { "type": "string" } },
                            { "name": "page", "in": "query", "schema": { "type": "integer", "default": 0 } },
                            { "name": "size", "in": "query", "schema": { "type": "integer", "default": 20 } }
                        ],
                        "responses": {
                            "200": { "description": "Page of loans" },
                            "400": { "description": "Invalid page", "content": { "application/json": { "schema": error } } }
                        }
                    },
                    "post": {
                        "summary": "Lend a book",
                        "tags": ["Loans"],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LoanRequest" } } }
                        },
                        "responses": {
                            "201": { "description": "Created loan", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Loan" } } } },
                            "404": { "description": "No book with that isbn", "content": { "application/json": { "schema": error } } },
                            "409": { "description": "Book already loaned", "content": { "application/json": { "schema": error } } }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a loan",
                        "tags": ["Loans"],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "Loan", "content": { "application/json": { "schema": view } } },
                            "404": { "description": "Loan not found", "content": { "application/json": { "schema": error } } }
                        }
                    },
                    "patch": {
                        "summary": "Record a return",
                        "tags": ["Loans"],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/ReturnRequest" } } }
                        },
                        "responses": {
                            "200": { "description": "Updated loan", "content": { "application/json": { "schema": view } } },
                            "404": { "description": "Loan not found", "content": { "application/json": { "schema": error } } }
                        }
                    }
                },
                "/late": {
                    "get": {
                        "summary": "Overdue loans",
                        "tags": ["Loans"],
                        "responses": {
                            "200": { "description": "Loans at least four days old and not returned" }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Loans health check",
                        "tags": ["Loans"],
                        "responses": {
                            "200": { "description": "OK", "content": { "text/plain": { "schema": { "type": "string" } } } }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Loan": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "book_id": { "type": "integer", "format": "int64" },
                            "customer_name": { "type": "string" },
                            "customer_email": { "type": ["string", "null"] },
                            "loan_date": { "type": "string", "format": "date" },
                            "returned": { "type": ["boolean", "null"] }
                        },
                        "required": ["id", "book_id", "customer_name", "loan_date"]
                    },
                    "LoanView": {
                        "allOf": [
                            { "$ref": "#/components/schemas/Loan" },
                            {
                                "type": "object",
                                "properties": { "book": { "$ref": "#/components/schemas/Book" } }
                            }
                        ]
                    },
                    "LoanRequest": {
                        "type": "object",
                        "properties": {
                            "isbn": { "type": "string" },
                            "customer": { "type": "string" },
                            "email": { "type": "string", "format": "email" }
                        },
                        "required": ["isbn", "customer"]
                    },
                    "ReturnRequest": {
                        "type": "object",
                        "properties": { "returned": { "type": "boolean" } },
                        "required": ["returned"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "loans module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "loans module stopped");
        Ok(())
    }
}

/// Create a new instance of the loans module
pub fn create_module(library: Library) -> Arc<dyn Module> {
    Arc::new(LoansModule::new(library))
}
