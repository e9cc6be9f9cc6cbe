//! Agent module - orchestration and conversation management
//!
//! Contains the turn loop that coordinates completion calls and tool
//! execution, plus the session, notice, and audit types it works with.

pub mod audit;
pub mod conversation;
pub mod notice;
pub mod orchestrator;
pub mod session;
pub mod turn;

pub use audit::{AuditEvent, AuditSink, JsonlAuditSink, MemoryAuditSink, MultiAuditSink, TracingAuditSink};
pub use conversation::Conversation;
pub use notice::{Notice, NoticeHandler};
pub use orchestrator::{tool_result_content, Agent, TurnReply, DEFAULT_MAX_TOOL_CALLS};
pub use session::Session;
pub use turn::TurnState;
