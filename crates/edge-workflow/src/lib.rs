//! EDGE Assessment Workflow Engine
//!
//! Core workflow crate for the EDGE performance-review platform: the
//! assessment state machine, transition validation, role-based permission
//! gating, review-cycle lifecycle, and notification-intent emission.
//!
//! The engine is storage-agnostic: it speaks to persistence through the
//! [`store::AssessmentStore`] port. Production wires in Postgres (behind
//! the `database` feature in the application crate); tests use
//! [`memory::MemoryStore`].

pub mod assessment;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod memory;
pub mod notify;
pub mod permissions;
pub mod state;
pub mod store;

pub use assessment::{Assessment, ManagerReviewForm, SelfAssessmentForm};
pub use cycle::{CycleStatus, ReviewCycle};
pub use engine::{
    AssessmentEngine, Clock, CycleOutcome, EngineConfig, FixedClock, SystemClock,
    TransitionOutcome,
};
pub use error::{WorkflowError, WorkflowResult};
pub use memory::{EmployeeRef, MemoryStore};
pub use notify::{NotificationIntent, NotificationKind};
pub use permissions::{can_administer, can_perform, Actor, Operation, Role};
pub use state::{
    ApprovalStatus, AssessmentState, ManagerReviewStatus, SelfAssessmentStatus, StateTransition,
    StatusProjection,
};
pub use store::AssessmentStore;
