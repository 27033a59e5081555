//! Mutation definition builder for type-safe route and metadata generation.
//!
//! This module provides `MutationDef`, a builder that:
//! - Generates an axum route for a single named mutation
//! - Captures request/payload type names for TypeScript generation
//! - Uses a marker trait to tie each request type to its payload type
//!
//! # Example
//!
//! ```ignore
//! use crate::mutation_def::MutationDef;
//!
//! pub fn remove_team_member() -> MutationDef<RemoveTeamMemberRequest> {
//!     MutationDef::new("removeTeamMember", "/v1/mutations/remove_team_member")
//!         .handler(remove_team_member_handler)
//! }
//! ```

use std::marker::PhantomData;

use axum::{handler::Handler, routing::MethodRouter};
use ts_rs::TS;

use crate::AppState;

// =============================================================================
// Marker Traits
// =============================================================================

/// Marker trait linking a mutation request type to the payload it returns.
pub trait MutationRequestFor {
    type Payload: TS;
}

// =============================================================================
// MutationMeta - Metadata for TypeScript generation
// =============================================================================

/// Metadata extracted from a MutationDef for TypeScript code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationMeta {
    pub name: &'static str,
    pub url: &'static str,
    pub request_type: String,
    pub payload_type: String,
}

// =============================================================================
// MutationDef Builder
// =============================================================================

/// Builder for a mutation route and its metadata.
///
/// `R` is the request type; its payload type comes from
/// [`MutationRequestFor`].
pub struct MutationDef<R> {
    name: &'static str,
    url: &'static str,
    route: MethodRouter<AppState>,
    _phantom: PhantomData<fn() -> R>,
}

impl<R> MutationDef<R>
where
    R: TS + MutationRequestFor,
{
    pub fn new(name: &'static str, url: &'static str) -> Self {
        Self {
            name,
            url,
            route: MethodRouter::new(),
            _phantom: PhantomData,
        }
    }

    /// Register the POST handler.
    pub fn handler<H, T>(mut self, handler: H) -> Self
    where
        H: Handler<T, AppState> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.route = self.route.post(handler);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Extract metadata for TypeScript generation.
    pub fn metadata(&self) -> MutationMeta {
        MutationMeta {
            name: self.name,
            url: self.url,
            request_type: R::name(),
            payload_type: <R::Payload as TS>::name(),
        }
    }

    /// Build the axum router from the registered handler.
    pub fn router(self) -> axum::Router<AppState> {
        axum::Router::new().route(self.url, self.route)
    }
}
