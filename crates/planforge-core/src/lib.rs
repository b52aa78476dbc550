//! # planforge-core
//!
//! Domain model and invariant-bearing logic for the planforge backend:
//! users and their subscription state machine, bearer sessions, business
//! plans, magic-link tokens, and the access-control policy.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       planforge-core                         │
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────────┐   │
//! │  │ AuthGateway │   │    Access    │   │     Stores      │   │
//! │  │ (magic link)│───│    Policy    │───│ users/sessions/ │   │
//! │  └─────────────┘   └──────────────┘   │     plans       │   │
//! └────────────────────────────────────────└─────────────────┘───┘
//! ```
//!
//! The store traits decouple every consumer from the backing datastore;
//! the in-memory implementations back development and tests. The
//! `LlmProvider` trait is the seam the runtime crate plugs a hosted
//! text-generation endpoint into.

pub mod auth;
pub mod error;
pub mod plan;
pub mod policy;
pub mod provider;
pub mod session;
pub mod token;
pub mod user;

pub use auth::{AuthGateway, LoginTicket};
pub use error::{CoreError, Result};
pub use plan::{
    BusinessPlan, MemoryPlanStore, PlanContent, PlanDocument, PlanStore, PlanSummary, RawSections,
};
pub use provider::{ChatMessage, Completion, GenerationOptions, LlmProvider, Role};
pub use session::{MemorySessionStore, Session, SessionId, SessionStore};
pub use token::TokenSigner;
pub use user::{MemoryUserStore, SubscriptionStatus, User, UserProfile, UserStore};
