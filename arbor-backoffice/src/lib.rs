//! Editorial back-office core for Arbor.
//!
//! Sits between the editing UI and the storage layer and decides what an
//! editor's request actually does:
//!
//! - **SaveWorkflow**: binds a submitted content item, validates it, checks
//!   permissions and dispatches to save, send-to-publish or publish
//! - **PropertyValueMapper**: turns submitted field values into stored
//!   values through the value converter registry
//! - **PermissionGate**: start-node path checks plus permission letters
//! - **MoveCopyValidator** and **TreeOperations**: move, copy, trash,
//!   sort and unpublish
//! - **EntityResolver**: lookups for every entity kind, with paging and
//!   start-node scoping
//! - **FilterExpressionCompiler**: `Name==Home&Id>=5` style filters
//!
//! Every operation takes an explicit [`RequestContext`] naming the acting
//! user, culture and clock.
//!
//! # Example
//!
//! ```no_run
//! use arbor_backoffice::{ContentItemSave, RequestContext, SaveIntent, SaveWorkflow, Services,
//!     UploadSet, VariantSubmission};
//! # fn demo(services: Services, ctx: RequestContext) -> arbor_backoffice::BackofficeResult<()> {
//! let workflow = SaveWorkflow::new(&services);
//! let root = arbor_types::NodeId::ROOT;
//! let item = ContentItemSave::create(root, "homePage", SaveIntent::PublishNew)
//!     .with_variant(VariantSubmission::invariant("Home"));
//! let response = workflow.execute(&ctx, item, UploadSet::empty())?;
//! assert!(response.is_valid());
//! # Ok(())
//! # }
//! ```

pub mod config;
mod context;
mod error;
pub mod filter;
mod mapper;
mod move_copy;
pub mod notifications;
mod permissions;
pub mod preview;
pub mod resolver;
mod services;
mod tree_ops;
pub mod uploads;
pub mod validation;
mod workflow;

pub use config::{BackofficeConfig, RecycleBinConfig};
pub use context::RequestContext;
pub use error::{BackofficeError, BackofficeResult};
pub use filter::{CompiledFilter, Condition, FilterExpressionCompiler, Operator, TypedFilter};
pub use mapper::{PropertySubmission, PropertyValueMapper, VariantSubmission};
pub use move_copy::{MoveCopyRejection, MoveCopyValidator, MoveOrCopy};
pub use notifications::{Notification, NotificationKind};
pub use permissions::{
    LETTER_COPY, LETTER_CREATE, LETTER_DELETE, LETTER_MOVE, LETTER_PUBLISH, LETTER_SEND_TO_PUBLISH,
    LETTER_SORT, LETTER_UNPUBLISH, LETTER_UPDATE, PermissionGate, has_path_access,
};
pub use preview::{NoPreview, PreviewSession, PreviewToken, RecordingPreview};
pub use resolver::{EntityResolver, KindStrategy, PageRequest, PagedResult, Scope};
pub use services::Services;
pub use tree_ops::{TreeOperations, TreeOutcome};
pub use uploads::{UploadSet, UploadedFile, sanitize_file_name};
pub use validation::{ErrorModel, ValidationState};
pub use workflow::{ContentItemSave, SaveIntent, SaveOutcome, SaveResponse, SaveWorkflow};
