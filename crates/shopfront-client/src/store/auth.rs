//! # Auth Store
//!
//! Phone + one-time-code login and the persisted session.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Phone Login                                    │
//! │                                                                         │
//! │  form.phone ──validate──► too short ──► snackbar "Invalid Phone Number" │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  POST /api/web/auth/login-using-hwg                                     │
//! │      ├── 2xx ──► navigate /auth/verify                                  │
//! │      └── 400 ──► dialog "Cannot find user"                              │
//! │                    ├── Register  ──► navigate /auth/register            │
//! │                    └── Try Again ──► stay                               │
//! │                                                                         │
//! │  form.otp_code                                                          │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  POST /api/web/auth/login-using-hwg-confirmation                        │
//! │      └── {data: UserAuth} ──► SessionStore ──► /profile/my-account      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use shopfront_core::validation::validate_phone;
use shopfront_core::{Envelope, User, UserAuth};
use tracing::{debug, info, warn};

use crate::api::Api;
use crate::error::ClientResult;
use crate::feedback::{Dialog, DialogChoice, Feedback, Navigation, Snackbar, SnackbarKind};
use crate::handler::ErrorHandler;
use crate::session::SessionStore;

/// Status the login endpoint uses for an unknown phone number.
pub const USER_NOT_FOUND_STATUS: u16 = 400;

const LOGIN_PATH: &str = "/api/web/auth/login-using-hwg";
const CONFIRM_PATH: &str = "/api/web/auth/login-using-hwg-confirmation";
const PROFILE_PATH: &str = "/api/web/users/profile";

// =============================================================================
// State
// =============================================================================

/// Input fields of the login screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthForm {
    pub phone: String,
    pub otp_code: String,
}

#[derive(Debug, Default)]
struct AuthState {
    token: Option<String>,
    user: Option<User>,
    form: AuthForm,
    reveal_section: bool,
}

/// How a [`AuthStore::login_with_phone`] attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Rejected locally; no request was sent.
    InvalidPhone,
    /// The backend sent a code; the user was sent to the verify screen.
    CodeSent,
    /// The backend does not know the phone number.
    UserNotFound,
    /// Any other failure, already forwarded to the error handler.
    Failed,
}

/// What to do after the session is cleared.
#[derive(Default)]
pub struct LogoutOptions {
    /// Runs instead of navigating when set.
    pub callback: Option<Box<dyn FnOnce() + Send>>,
    /// Route to open when there is no callback. Empty means stay.
    pub next: String,
}

#[derive(Serialize)]
struct PhoneLogin<'a> {
    phone_number: &'a str,
}

#[derive(Serialize)]
struct PhoneConfirmation<'a> {
    phone_number: &'a str,
    confirmation_code: &'a str,
}

// =============================================================================
// Auth Store
// =============================================================================

/// Login/session store.
pub struct AuthStore {
    api: Arc<dyn Api>,
    handler: Arc<dyn ErrorHandler>,
    feedback: Arc<dyn Feedback>,
    session: Arc<dyn SessionStore>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(
        api: Arc<dyn Api>,
        handler: Arc<dyn ErrorHandler>,
        feedback: Arc<dyn Feedback>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        AuthStore {
            api,
            handler,
            feedback,
            session,
            state: RwLock::new(AuthState::default()),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    pub fn form(&self) -> AuthForm {
        self.state.read().form.clone()
    }

    pub fn reveal_section(&self) -> bool {
        self.state.read().reveal_section
    }

    pub fn set_phone(&self, phone: impl Into<String>) {
        self.state.write().form.phone = phone.into();
    }

    pub fn set_otp_code(&self, code: impl Into<String>) {
        self.state.write().form.otp_code = code.into();
    }

    /// Clears the form and the profile section flag.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.form = AuthForm::default();
        state.reveal_section = false;
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Requests a one-time code for `form.phone`.
    pub async fn login_with_phone(&self) -> LoginOutcome {
        let phone = self.state.read().form.phone.clone();

        if let Err(err) = validate_phone(&phone) {
            debug!(error = %err, "Phone number rejected");
            self.feedback.snackbar(Snackbar {
                kind: SnackbarKind::Error,
                title: "Invalid Phone Number".into(),
                message: "Please enter a valid phone number.".into(),
                button_text: Some("Retry".into()),
            });
            return LoginOutcome::InvalidPhone;
        }

        self.feedback.show_loading();
        let result = self
            .api
            .post_json::<serde_json::Value, _>(LOGIN_PATH, &PhoneLogin { phone_number: &phone })
            .await;
        self.feedback.hide_loading();

        match result {
            Ok(_) => {
                info!("Login code requested");
                self.feedback.navigate(Navigation::to("/auth/verify"));
                LoginOutcome::CodeSent
            }
            Err(err) if err.status() == Some(USER_NOT_FOUND_STATUS) => {
                warn!("No user for phone number");
                let choice = self
                    .feedback
                    .dialog(Dialog {
                        title: "Cannot find user".into(),
                        content: "User not found with this phone number".into(),
                        confirm_text: "Register".into(),
                        back_text: "Try Again".into(),
                    })
                    .await;
                if choice == DialogChoice::Confirm {
                    self.feedback.navigate(Navigation::to("/auth/register"));
                }
                LoginOutcome::UserNotFound
            }
            Err(err) => {
                self.handler.handle(&err);
                LoginOutcome::Failed
            }
        }
    }

    /// Confirms the one-time code and persists the returned session.
    pub async fn verify_phone_number(&self) -> Option<UserAuth> {
        let form = self.form();
        let body = PhoneConfirmation {
            phone_number: &form.phone,
            confirmation_code: &form.otp_code,
        };

        self.feedback.show_loading();
        let result = self
            .api
            .post_json::<Envelope<UserAuth>, _>(CONFIRM_PATH, &body)
            .await;
        self.feedback.hide_loading();

        let outcome = result.and_then(|envelope| {
            self.set_user_data(&envelope.data)?;
            Ok(envelope.data)
        });

        match outcome {
            Ok(auth) => {
                info!(user_id = ?auth.user.as_ref().map(|u| u.id), "Logged in");
                self.feedback
                    .navigate(Navigation::external("/profile/my-account"));
                self.reset();
                Some(auth)
            }
            Err(err) => {
                self.handler.handle(&err);
                None
            }
        }
    }

    /// `GET /api/web/users/profile`; reveals the profile section.
    pub async fn get_profile(&self) -> Option<User> {
        match self.api.get_json::<Envelope<User>>(PROFILE_PATH).await {
            Ok(envelope) => {
                let mut state = self.state.write();
                state.user = Some(envelope.data.clone());
                state.reveal_section = true;
                Some(envelope.data)
            }
            Err(err) => {
                self.handler.handle(&err);
                None
            }
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Replaces the persisted session and reloads it into the store.
    pub fn set_user_data(&self, auth: &UserAuth) -> ClientResult<()> {
        self.session.save(auth)?;
        self.refresh();
        Ok(())
    }

    pub fn set_token(&self, token: impl Into<String>) -> ClientResult<()> {
        let mut auth = self.session.load()?;
        auth.token = Some(token.into());
        self.set_user_data(&auth)
    }

    pub fn set_user(&self, user: User) -> ClientResult<()> {
        let mut auth = self.session.load()?;
        auth.user = Some(user);
        self.set_user_data(&auth)
    }

    /// Copies the persisted session into the store.
    pub fn refresh(&self) {
        match self.session.load() {
            Ok(auth) => {
                let mut state = self.state.write();
                state.token = auth.token;
                state.user = auth.user;
            }
            Err(err) => self.handler.handle(&err),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.refresh();
        self.state.read().token.is_some()
    }

    /// Clears the persisted session, then runs the callback or navigates to
    /// `next`.
    pub fn logout(&self, options: LogoutOptions) -> ClientResult<()> {
        self.session.save(&UserAuth::default())?;
        self.refresh();
        info!("Logged out");

        if let Some(callback) = options.callback {
            callback();
        } else if !options.next.is_empty() {
            self.feedback.navigate(Navigation::to(options.next));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::api::Method;
    use crate::session::MemorySessionStore;
    use crate::testkit::{FakeBackend, FeedbackEvent, RecordingErrorHandler, RecordingFeedback};

    struct Harness {
        backend: Arc<FakeBackend>,
        handler: Arc<RecordingErrorHandler>,
        feedback: Arc<RecordingFeedback>,
        session: Arc<MemorySessionStore>,
        store: AuthStore,
    }

    fn kim() -> User {
        User {
            id: 12,
            username: "kim".into(),
            email: "kim@example.com".into(),
            password: String::new(),
        }
    }

    fn harness(feedback: RecordingFeedback) -> Harness {
        let auth = UserAuth {
            token: Some("token-12".into()),
            user: Some(kim()),
        };
        let backend = Arc::new(FakeBackend::new().with_phone("08123456789", "4321", auth));
        let handler = Arc::new(RecordingErrorHandler::new());
        let feedback = Arc::new(feedback);
        let session = Arc::new(MemorySessionStore::new());
        let store = AuthStore::new(
            backend.clone(),
            handler.clone(),
            feedback.clone(),
            session.clone(),
        );
        Harness {
            backend,
            handler,
            feedback,
            session,
            store,
        }
    }

    #[tokio::test]
    async fn test_short_phone_shows_snackbar_without_request() {
        let h = harness(RecordingFeedback::new());

        for phone in ["", "123456"] {
            h.store.set_phone(phone);
            assert_eq!(h.store.login_with_phone().await, LoginOutcome::InvalidPhone);
        }

        assert!(h.backend.requests().is_empty());
        let events = h.feedback.events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            FeedbackEvent::Snackbar(snackbar) => {
                assert_eq!(snackbar.kind, SnackbarKind::Error);
                assert_eq!(snackbar.title, "Invalid Phone Number");
                assert_eq!(snackbar.button_text.as_deref(), Some("Retry"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_known_phone_navigates_to_verify() {
        let h = harness(RecordingFeedback::new());
        h.store.set_phone("08123456789");

        assert_eq!(h.store.login_with_phone().await, LoginOutcome::CodeSent);
        assert_eq!(h.backend.count(Method::Post, LOGIN_PATH), 1);
        assert_eq!(
            h.feedback.events(),
            vec![
                FeedbackEvent::ShowLoading,
                FeedbackEvent::HideLoading,
                FeedbackEvent::Navigate(Navigation::to("/auth/verify")),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_phone_register_choice() {
        let h = harness(RecordingFeedback::answering(DialogChoice::Confirm));
        h.store.set_phone("0899999999");

        assert_eq!(h.store.login_with_phone().await, LoginOutcome::UserNotFound);
        let dialog = h.feedback.events().into_iter().find_map(|e| match e {
            FeedbackEvent::Dialog(dialog) => Some(dialog),
            _ => None,
        });
        assert_eq!(dialog.map(|d| d.title), Some("Cannot find user".to_string()));
        assert_eq!(h.feedback.navigations(), vec![Navigation::to("/auth/register")]);
        assert_eq!(h.handler.count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_phone_try_again_stays() {
        let h = harness(RecordingFeedback::answering(DialogChoice::Back));
        h.store.set_phone("0899999999");

        assert_eq!(h.store.login_with_phone().await, LoginOutcome::UserNotFound);
        assert!(h.feedback.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_other_login_failures_go_to_handler() {
        let h = harness(RecordingFeedback::new());
        h.backend.fail_on(Method::Post, LOGIN_PATH, 503);
        h.store.set_phone("08123456789");

        assert_eq!(h.store.login_with_phone().await, LoginOutcome::Failed);
        assert_eq!(h.handler.statuses(), vec![Some(503)]);
    }

    #[tokio::test]
    async fn test_verify_persists_session() {
        let h = harness(RecordingFeedback::new());
        h.store.set_phone("08123456789");
        h.store.set_otp_code("4321");

        let auth = h.store.verify_phone_number().await.unwrap();
        assert_eq!(auth.token.as_deref(), Some("token-12"));
        assert_eq!(h.session.load().unwrap(), auth);
        assert_eq!(h.store.token().as_deref(), Some("token-12"));
        assert_eq!(h.store.form(), AuthForm::default());
        assert_eq!(
            h.feedback.navigations(),
            vec![Navigation::external("/profile/my-account")]
        );
        assert!(h.store.is_logged_in());
    }

    #[tokio::test]
    async fn test_verify_wrong_code() {
        let h = harness(RecordingFeedback::new());
        h.store.set_phone("08123456789");
        h.store.set_otp_code("0000");

        assert!(h.store.verify_phone_number().await.is_none());
        assert_eq!(h.handler.statuses(), vec![Some(422)]);
        assert!(!h.store.is_logged_in());
        assert_eq!(h.store.form().otp_code, "0000");
    }

    #[tokio::test]
    async fn test_get_profile_reveals_section() {
        let h = harness(RecordingFeedback::new());
        assert!(h.store.get_profile().await.is_none());
        assert_eq!(h.handler.statuses(), vec![Some(401)]);

        h.store.set_phone("08123456789");
        h.store.set_otp_code("4321");
        h.store.verify_phone_number().await.unwrap();

        let user = h.store.get_profile().await.unwrap();
        assert_eq!(user, kim());
        assert!(h.store.reveal_section());
    }

    #[test]
    fn test_set_token_and_user_write_session() {
        let h = harness(RecordingFeedback::new());
        assert!(!h.store.is_logged_in());

        h.store.set_token("abc").unwrap();
        h.store.set_user(kim()).unwrap();

        let saved = h.session.load().unwrap();
        assert_eq!(saved.token.as_deref(), Some("abc"));
        assert_eq!(saved.user, Some(kim()));
        assert_eq!(h.store.user(), Some(kim()));
        assert!(h.store.is_logged_in());
    }

    #[test]
    fn test_logout_runs_callback_instead_of_navigating() {
        let h = harness(RecordingFeedback::new());
        h.store.set_token("abc").unwrap();

        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        h.store
            .logout(LogoutOptions {
                callback: Some(Box::new(move || flag.store(true, Ordering::SeqCst))),
                next: "/auth/login".into(),
            })
            .unwrap();

        assert!(called.load(Ordering::SeqCst));
        assert!(h.feedback.navigations().is_empty());
        assert_eq!(h.session.load().unwrap(), UserAuth::default());
        assert!(!h.store.is_logged_in());
    }

    #[test]
    fn test_logout_navigates_to_next() {
        let h = harness(RecordingFeedback::new());
        h.store
            .logout(LogoutOptions {
                next: "/auth/login".into(),
                ..LogoutOptions::default()
            })
            .unwrap();
        assert_eq!(h.feedback.navigations(), vec![Navigation::to("/auth/login")]);

        h.store.logout(LogoutOptions::default()).unwrap();
        assert_eq!(h.feedback.navigations().len(), 1);
    }
}
