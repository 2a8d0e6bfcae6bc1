//! Per-request context passed explicitly into every operation.

use crate::preview::PreviewToken;
use arbor_model::User;
use chrono::{DateTime, Utc};

/// Who is acting, in which culture, and at what time.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: User,
    /// Culture of the editing session. `None` for invariant content.
    pub culture: Option<String>,
    /// Set while the editor is in preview mode.
    pub preview: Option<PreviewToken>,
    /// "Now" for release and expiry checks.
    pub now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(user: User) -> Self {
        Self {
            user,
            culture: None,
            preview: None,
            now: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    #[must_use]
    pub fn with_preview(mut self, token: PreviewToken) -> Self {
        self.preview = Some(token);
        self
    }

    /// Pins the clock, mostly for tests around release dates.
    #[must_use]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn user_id(&self) -> i32 {
        self.user.id
    }

    pub fn culture(&self) -> Option<&str> {
        self.culture.as_deref()
    }
}
