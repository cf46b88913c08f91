//! HTTP API for FairDraw.
//!
//! Provides endpoints for:
//! - Winner selection (`POST /select-winners`) and draw audits
//! - Giveaway creation, lookup and status transitions
//! - Joining giveaways and listing participants
//! - Health and Prometheus metrics
//!
//! Every response body is JSON with a `success` flag; failures carry an
//! `error` string. Callers authenticate with `Authorization: Bearer <token>`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::{Authenticator, Caller, StaticTokens, TokenEntry};
pub use error::RpcError;
pub use server::{router, RpcServer, RpcState};
