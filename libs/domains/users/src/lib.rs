//! Users Domain
//!
//! Accounts and the authentication boundary in front of the task API.
//!
//! # Features
//!
//! - Registration with username, email and password rules
//! - Password hashing with Argon2id
//! - Login issuing HS256 bearer tokens
//! - [`axum_helpers::IdentityResolver`] for the bearer middleware, so a
//!   token for a deleted user is rejected
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /register, /login, /users
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, hashing, token issuing
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Trait + MongoDB and in-memory implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{AuthState, JwtAuth, JwtConfig};
//! use domain_users::{InMemoryUserRepository, UserService, handlers};
//! use std::sync::Arc;
//!
//! let jwt = JwtAuth::new(&JwtConfig::new("a-secret-of-at-least-thirty-two-chars"));
//! let service = UserService::new(InMemoryUserRepository::new(), jwt.clone());
//! let auth = AuthState::new(jwt, Arc::new(service.clone()));
//!
//! let router = handlers::router(service, auth);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{AuthData, LoginRequest, RegisterRequest, User, UserResponse, UsersData};
pub use crate::mongodb::MongoUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
