//! Dataverse adapter implementation
//!
//! This module provides the integration with a Dataverse environment:
//! connection strings, sign-in, the Web API session, and OData models.

pub mod auth;
pub mod client;
pub mod connection;
pub mod models;

pub use auth::{token_source_for, AccessTokenSource, ClientSecretLogin, InteractiveLogin};
pub use client::{DataverseSession, RecordSource};
pub use connection::ConnectionParams;
pub use models::{Column, ColumnKind, ColumnSet, QueryExpression, WhoAmIResponse};
