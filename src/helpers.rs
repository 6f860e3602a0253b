//! Named helpers mapping domain outcomes to canonical events.
//!
//! Each helper only picks the operation and emitter for an outcome and shapes
//! the metadata; none of them performs the domain action. Failure paths of the
//! authentication helpers always use the anonymous actor so that whatever
//! identified the user (an email, a username) never reaches a log.

use crate::{
    emitter::EventEmitter,
    types::{ErrorInput, Metadata, Operation, Step},
};
use serde_json::Value;
use std::error::Error as StdError;

/// Result of the domain action being logged.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Outcome {
    Success,
    Failure(ErrorInput),
}

impl Outcome {
    pub fn failure<E: Into<ErrorInput>>(error: E) -> Self {
        Outcome::Failure(error.into())
    }

    pub fn failed_with<E: StdError + ?Sized>(error: &E) -> Self {
        Outcome::Failure(ErrorInput::from_error(error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl<T, E: StdError> From<&Result<T, E>> for Outcome {
    fn from(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(e) => Outcome::failed_with(e),
        }
    }
}

/// API resources with dedicated operations.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ApiResource {
    Post,
    Replies,
}

impl ApiResource {
    fn success(self) -> Operation {
        match self {
            ApiResource::Post => Operation::ApiGetPost,
            ApiResource::Replies => Operation::ApiGetReplies,
        }
    }

    fn failure(self) -> Operation {
        match self {
            ApiResource::Post => Operation::ApiGetPostFailed,
            ApiResource::Replies => Operation::ApiGetRepliesFailed,
        }
    }
}

/// How an API request ended.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ApiOutcome {
    Ok,
    /// No authenticated session.
    Unauthorized,
    /// The resource does not exist; carries the reason shown in the warning.
    NotFound(String),
    Failed(ErrorInput),
}

impl ApiOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiOutcome::Ok => 200,
            ApiOutcome::Unauthorized => 401,
            ApiOutcome::NotFound(_) => 404,
            ApiOutcome::Failed(_) => 500,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DbAccess {
    Query,
    Mutation,
}

impl DbAccess {
    fn operation(self, success: bool) -> Operation {
        match (self, success) {
            (DbAccess::Query, true) => Operation::DbQuerySuccess,
            (DbAccess::Query, false) => Operation::DbQueryFailed,
            (DbAccess::Mutation, true) => Operation::DbMutationSuccess,
            (DbAccess::Mutation, false) => Operation::DbMutationFailed,
        }
    }
}

impl EventEmitter {
    pub fn login_attempt(&self) {
        self.emit_event(Step::Auth, Operation::LoginAttempt, None, Metadata::new());
    }

    pub fn login(&self, user_id: Option<&str>, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.emit_event(
                Step::Auth,
                Operation::LoginSuccess,
                user_id,
                Metadata::new().with("sessionStarted", true),
            ),
            Outcome::Failure(e) => {
                self.emit_error(Step::Auth, Operation::LoginFailed, None, e, Metadata::new())
            }
        }
    }

    pub fn logout(&self, user_id: Option<&str>) {
        self.emit_event(
            Step::Auth,
            Operation::Logout,
            user_id,
            Metadata::new().with("sessionEnded", true),
        );
    }

    pub fn register_attempt(&self) {
        self.emit_event(Step::Auth, Operation::RegisterAttempt, None, Metadata::new());
    }

    pub fn register(&self, user_id: Option<&str>, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.emit_event(
                Step::Auth,
                Operation::RegisterSuccess,
                user_id,
                Metadata::new().with("accountCreated", true),
            ),
            Outcome::Failure(e) => self.emit_error(
                Step::Auth,
                Operation::RegisterFailed,
                None,
                e,
                Metadata::new(),
            ),
        }
    }

    pub fn view_home(
        &self,
        user_id: Option<&str>,
        page: u32,
        search_term: Option<&str>,
        posts_count: usize,
    ) {
        self.emit_event(
            Step::View,
            Operation::ViewHome,
            user_id,
            Metadata::new()
                .with("page", page)
                .with("searchTerm", search_term)
                .with("postsCount", posts_count),
        );
    }

    pub fn view_post(&self, user_id: Option<&str>, post_id: i64, slug: &str) {
        self.emit_event(
            Step::View,
            Operation::ViewPostDetails,
            user_id,
            Metadata::new().with("postId", post_id).with("postSlug", slug),
        );
    }

    pub fn view_login_page(&self, user_id: Option<&str>) {
        self.emit_event(Step::View, Operation::ViewLoginPage, user_id, Metadata::new());
    }

    pub fn view_register_page(&self, user_id: Option<&str>) {
        self.emit_event(Step::View, Operation::ViewRegisterPage, user_id, Metadata::new());
    }

    pub fn submit_comment(&self, user_id: Option<&str>, post_id: i64, outcome: Outcome) {
        let metadata = Metadata::new().with("postId", post_id);
        match outcome {
            Outcome::Success => self.emit_event(
                Step::Interaction,
                Operation::SubmitComment,
                user_id,
                metadata.with("commentCreated", true),
            ),
            Outcome::Failure(e) => self.emit_error(
                Step::Interaction,
                Operation::SubmitComment,
                user_id,
                e,
                metadata,
            ),
        }
    }

    pub fn submit_reply(
        &self,
        user_id: Option<&str>,
        comment_id: i64,
        post_id: i64,
        outcome: Outcome,
    ) {
        let metadata = Metadata::new()
            .with("commentId", comment_id)
            .with("postId", post_id);
        match outcome {
            Outcome::Success => self.emit_event(
                Step::Interaction,
                Operation::SubmitReply,
                user_id,
                metadata.with("replyCreated", true),
            ),
            Outcome::Failure(e) => self.emit_error(
                Step::Interaction,
                Operation::SubmitReply,
                user_id,
                e,
                metadata,
            ),
        }
    }

    pub fn like_post(&self, user_id: Option<&str>, post_id: i64) {
        self.emit_event(
            Step::Interaction,
            Operation::LikePost,
            user_id,
            Metadata::new().with("postId", post_id),
        );
    }

    pub fn search(&self, user_id: Option<&str>, term: &str, results_count: usize) {
        self.emit_event(
            Step::Interaction,
            Operation::Search,
            user_id,
            Metadata::new()
                .with("searchTerm", term)
                .with("resultsCount", results_count),
        );
    }

    pub fn navigate_to_post(&self, user_id: Option<&str>, slug: &str) {
        self.emit_event(
            Step::Navigation,
            Operation::NavigateToPost,
            user_id,
            Metadata::new().with("postSlug", slug),
        );
    }

    pub fn navigate_to_home(&self, user_id: Option<&str>) {
        self.emit_event(Step::Navigation, Operation::NavigateToHome, user_id, Metadata::new());
    }

    /// Logs the end of an API request. `extra` carries request specifics such as
    /// the slug or comment id.
    pub fn api_access(
        &self,
        user_id: Option<&str>,
        resource: ApiResource,
        path: &str,
        outcome: ApiOutcome,
        extra: Metadata,
    ) {
        let mut metadata = Metadata::new()
            .with("path", path)
            .with("statusCode", outcome.status_code());
        metadata.extend(extra);

        match outcome {
            ApiOutcome::Ok => self.emit_event(Step::Api, resource.success(), user_id, metadata),
            ApiOutcome::Unauthorized => self.emit_warning(
                Step::Api,
                Operation::ApiUnauthorized,
                None,
                format!("Unauthenticated access to {path}"),
                metadata,
            ),
            ApiOutcome::NotFound(reason) => {
                self.emit_warning(Step::Api, resource.failure(), user_id, reason, metadata)
            }
            ApiOutcome::Failed(e) => {
                self.emit_error(Step::Api, resource.failure(), user_id, e, metadata)
            }
        }
    }

    /// Logs a data-access call. `entity_id` is the id or slug the call targeted.
    pub fn db_access<V: Into<Value>>(
        &self,
        user_id: Option<&str>,
        kind: DbAccess,
        operation_name: &str,
        entity_id: V,
        outcome: Outcome,
        extra: Metadata,
    ) {
        let mut metadata = Metadata::new();
        metadata.insert_value("entityId", entity_id.into());
        metadata.insert("dbOperation", operation_name);
        metadata.extend(extra);

        match outcome {
            Outcome::Success => {
                self.emit_event(Step::Database, kind.operation(true), user_id, metadata)
            }
            Outcome::Failure(e) => {
                self.emit_error(Step::Database, kind.operation(false), user_id, e, metadata)
            }
        }
    }
}
