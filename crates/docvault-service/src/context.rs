//! Request context carrying the acting principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docvault_core::types::UserId;

/// Context for the current request.
///
/// The legacy system kept the current user in ambient global state; here
/// the acting principal is passed into every service method explicitly so
/// that *who* is acting is always visible at the call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context for the given principal.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            request_time: Utc::now(),
        }
    }
}
