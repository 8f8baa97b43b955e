pub mod handlers;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::post, Router};
use bookworm_authz::TokenService;
use bookworm_db::UserStore;
use bookworm_kernel::{InitCtx, Module};
use serde_json::json;

use crate::services::Services;

/// Router state for the account endpoints.
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenService>,
}

/// Account registration and login
pub struct AuthModule {
    state: AuthState,
}

impl AuthModule {
    pub fn new(state: AuthState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            token_ttl_days = ctx.settings.auth.token_ttl_days,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(handlers::register))
            .route("/login", post(handlers::login))
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
        let auth_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/AuthResponse" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Create an account and start a session",
                        "tags": ["Auth"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/RegisterRequest" }
                                }
                            }
                        },
                        "responses": {
                            "201": auth_response("Account created"),
                            "400": error("Missing field, too short, or already taken"),
                            "500": error("Internal server error")
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Start a session",
                        "tags": ["Auth"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/LoginRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": auth_response("Session started"),
                            "400": error("Invalid email or password"),
                            "500": error("Internal server error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RegisterRequest": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "username": { "type": "string", "minLength": 3 },
                            "password": { "type": "string", "minLength": 6 }
                        },
                        "required": ["email", "username", "password"]
                    },
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string" }
                        },
                        "required": ["email", "password"]
                    },
                    "PublicUser": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "username": { "type": "string" },
                            "email": { "type": "string" },
                            "profileImage": { "type": "string", "format": "uri" }
                        },
                        "required": ["id", "username", "email", "profileImage"]
                    },
                    "AuthResponse": {
                        "type": "object",
                        "properties": {
                            "token": { "type": "string" },
                            "user": { "$ref": "#/components/schemas/PublicUser" }
                        },
                        "required": ["token", "user"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "auth module stopped");
        Ok(())
    }
}

/// Create the auth module over the shared services
pub fn create_module(services: &Services) -> Arc<dyn Module> {
    Arc::new(AuthModule::new(AuthState {
        users: services.users.clone(),
        tokens: services.tokens.clone(),
    }))
}
