//! The signed-in user and the channel used to tell them things.
//!
//! A [`Session`] is created once the profile has been fetched and handed to
//! every browser explicitly; nothing here is global.

use crate::error::{Error, ErrorKind, Result};
use clipflow_api::ResourceClient;
use clipflow_api::models::{Action, Profile, ResourceKind};
use derive_more::Display;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NoticeLevel {
    #[display("info")]
    Info,
    #[display("success")]
    Success,
    #[display("error")]
    Error,
}

/// A toast/banner message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Surface that shows notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes every notice to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "Notice"),
            _ => tracing::info!(level = %notice.level, message = %notice.message, "Notice"),
        }
    }
}

/// Whether a collection page may be shown at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Render a "no access" placeholder instead of the page body.
    NoAccess,
}

pub struct Session {
    profile: Profile,
    notifier: Arc<dyn Notifier>,
}

pub type SessionHandle = Arc<Session>;

impl Session {
    pub fn new(profile: Profile, notifier: Arc<dyn Notifier>) -> Self {
        Self { profile, notifier }
    }

    /// Fetch the signed-in user's profile and open a session for them.
    #[tracing::instrument(skip_all, fields(client = %client.name()))]
    pub async fn start(client: &dyn ResourceClient, notifier: Arc<dyn Notifier>) -> Result<SessionHandle> {
        let profile = client.profile().await.map_err(ErrorKind::api)?;
        let permissions = profile.permissions.len();
        tracing::info!(user = %profile.id, role = ?profile.role, permissions, "Session started");
        Ok(Arc::new(Self::new(profile, notifier)))
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn can(&self, kind: ResourceKind, action: Action) -> bool {
        self.profile.can(kind, action)
    }

    pub fn gate(&self, kind: ResourceKind) -> Access {
        match self.can(kind, Action::View) {
            true => Access::Granted,
            false => Access::NoAccess,
        }
    }

    /// Fail with [`ErrorKind::Forbidden`] unless the user may perform `action`.
    pub fn require(&self, kind: ResourceKind, action: Action) -> Result<()> {
        if !self.can(kind, action) {
            exn::bail!(ErrorKind::Forbidden(kind.permission(action)));
        }
        Ok(())
    }

    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.notifier.notify(Notice {
            level,
            message: message.into(),
        });
    }

    /// Tell the user about a failure.
    ///
    /// Validation errors are left to the caller to show next to the inputs
    /// and are not toasted. Transport failures are logged and toasted with a
    /// generic message; everything else is toasted as is.
    pub fn report(&self, err: &Error) {
        if err.field_errors().is_some() {
            return;
        }
        if err.is_retryable() {
            let kind: &ErrorKind = err;
            tracing::error!(error = %kind, "Request failed");
        }
        self.notify(NoticeLevel::Error, err.user_message());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use clipflow_api::client::MockClient;
    use clipflow_api::error::{ErrorKind as ApiErrorKind, FieldErrors};
    use clipflow_api::models::Role;
    use std::sync::Mutex;

    /// Notifier that remembers what it was told.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier(Mutex<Vec<Notice>>);

    impl RecordingNotifier {
        pub(crate) fn notices(&self) -> Vec<Notice> {
            self.0.lock().unwrap().clone()
        }

        pub(crate) fn errors(&self) -> Vec<String> {
            self.notices().into_iter().filter(|n| n.level == NoticeLevel::Error).map(|n| n.message).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    fn session(permissions: &[&str]) -> (Session, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let profile = Profile::new("7", "Ada", Role::Customer).with_permissions(permissions.iter().copied());
        (Session::new(profile, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_start_fetches_profile() {
        let client = MockClient::default().with_profile(Profile::new("9", "Grace", Role::Admin));
        let session = Session::start(&client, Arc::new(LogNotifier)).await.unwrap();
        assert_eq!(session.profile().name, "Grace");
    }

    #[test]
    fn test_gate_requires_view() {
        let (session, _) = session(&["footage.view"]);
        assert_eq!(session.gate(ResourceKind::Footage), Access::Granted);
        assert_eq!(session.gate(ResourceKind::Bgm), Access::NoAccess);
    }

    #[test]
    fn test_require_names_missing_slug() {
        let (session, _) = session(&["footage.view"]);
        let err = session.require(ResourceKind::Footage, Action::Delete).unwrap_err();
        assert_eq!(*err, ErrorKind::Forbidden("footage.delete".to_string()));
    }

    #[test]
    fn test_report_skips_validation_errors() {
        let (session, notifier) = session(&[]);
        let validation = ErrorKind::api(exn::Exn::from(ApiErrorKind::Validation(
            FieldErrors::new().with("name", "The name field is required."),
        )));
        session.report(&validation);
        assert!(notifier.notices().is_empty());

        session.report(&ErrorKind::api(exn::Exn::from(ApiErrorKind::Rejected("Quota exceeded".to_string()))));
        session.report(&ErrorKind::api(exn::Exn::from(ApiErrorKind::Transport("timeout".to_string()))));
        assert_eq!(
            notifier.errors(),
            vec!["Quota exceeded".to_string(), "Could not reach the server. Please try again.".to_string()]
        );
    }
}
