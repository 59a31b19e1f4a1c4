//! Session guard bound to the request and full-page cache lifecycle.

use std::sync::Arc;

use http::{Request, Response};
use tracing::debug;

use crate::cookies;
use crate::error::SessionError;
use crate::gate::FeatureGate;
use crate::session::{targeting_bags, Session};

/// Whether a request is the top-level request of the handling cycle or an
/// internally forwarded sub-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Main,
    Sub,
}

impl RequestKind {
    pub fn is_main(&self) -> bool {
        matches!(self, RequestKind::Main)
    }
}

/// Attaches the targeting attribute bags to fresh sessions and keeps their
/// data out of full-page cache keys and cached responses.
///
/// Every handler re-reads both gates and degrades to a no-op when either
/// is off. The guard holds no state of its own beyond the injected gate.
pub struct TargetingSessionGuard {
    gate: Arc<dyn FeatureGate>,
}

impl TargetingSessionGuard {
    pub fn new(gate: Arc<dyn FeatureGate>) -> Self {
        Self { gate }
    }

    fn is_active(&self) -> bool {
        self.gate.targeting_enabled() && self.gate.session_bags_enabled()
    }

    /// Request-time binding.
    ///
    /// Registers the session and visitor bags on the current session.
    /// Does nothing when targeting is disabled, the request is a
    /// sub-request, or the session was already started by another code
    /// path. Session-model failures propagate unchanged.
    pub async fn on_request(
        &self,
        kind: RequestKind,
        session: &Session,
    ) -> Result<(), SessionError> {
        if !self.is_active() {
            return Ok(());
        }

        if !kind.is_main() {
            return Ok(());
        }

        // bags can only be registered on a fresh session
        if session.is_started().await {
            return Ok(());
        }

        for bag in targeting_bags() {
            session.register_bag(bag).await?;
        }

        debug!("registered targeting session bags");
        Ok(())
    }

    /// Cache-key binding.
    ///
    /// Appends the two bag storage keys to the list of session keys the
    /// full-page cache ignores. Existing entries are never removed or
    /// reordered. Calling this more than once per assembly appends the
    /// keys again; consumers treat the list as a set, so duplicates are
    /// harmless.
    pub fn ignored_session_keys(&self, mut keys: Vec<String>) -> Vec<String> {
        if !self.is_active() {
            return keys;
        }

        for bag in targeting_bags() {
            keys.push(bag.storage_key());
        }
        keys
    }

    /// Cache-store binding.
    ///
    /// Removes the session cookie from a response that is about to enter
    /// the full-page cache, so a cached page cannot hand one user's
    /// session to another. Cookies unrelated to the session cookie name
    /// are untouched; each matching cookie is removed by its exact
    /// (name, path, domain) triple.
    pub async fn strip_session_cookie<B, C>(
        &self,
        request: &Request<B>,
        response: &mut Response<C>,
    ) {
        if !self.is_active() {
            return;
        }

        let Some(session) = request.extensions().get::<Session>() else {
            return;
        };

        let cookie_name = session.cookie_name().await;
        if cookie_name.is_empty() {
            return;
        }

        let matched: Vec<_> = cookies::response_cookies(response.headers())
            .into_iter()
            .filter(|cookie| cookie.name() == cookie_name)
            .collect();

        for cookie in &matched {
            cookies::remove_cookie(
                response.headers_mut(),
                cookie.name(),
                cookie.path(),
                cookie.domain(),
            );
        }

        if !matched.is_empty() {
            debug!(
                count = matched.len(),
                "stripped session cookie from cacheable response"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::SET_COOKIE;
    use http::HeaderValue;

    use crate::session::{TARGETING_BAG_SESSION, TARGETING_BAG_VISITOR};

    struct StaticGate {
        targeting: bool,
        session: bool,
    }

    impl FeatureGate for StaticGate {
        fn targeting_enabled(&self) -> bool {
            self.targeting
        }

        fn session_bags_enabled(&self) -> bool {
            self.session
        }
    }

    fn guard(targeting: bool, session: bool) -> TargetingSessionGuard {
        TargetingSessionGuard::new(Arc::new(StaticGate { targeting, session }))
    }

    fn response_with_cookies(values: &[&str]) -> Response<()> {
        let mut response = Response::new(());
        for value in values {
            response.headers_mut().append(
                SET_COOKIE,
                HeaderValue::from_str(value).expect("header value"),
            );
        }
        response
    }

    fn request_with_session(session: &Session) -> Request<()> {
        let mut request = Request::new(());
        request.extensions_mut().insert(session.clone());
        request
    }

    #[tokio::test]
    async fn registers_both_bags_on_a_fresh_main_request() {
        let guard = guard(true, true);
        let session = Session::default();

        guard
            .on_request(RequestKind::Main, &session)
            .await
            .expect("registration succeeds");

        assert!(session.has_bag(TARGETING_BAG_SESSION).await);
        assert!(session.has_bag(TARGETING_BAG_VISITOR).await);

        let mut keys = session.bag_storage_keys().await;
        keys.sort();
        assert_eq!(
            keys,
            vec!["_pimcore_targeting_session", "_pimcore_targeting_visitor"]
        );
    }

    #[tokio::test]
    async fn any_closed_gate_disables_all_handlers() {
        for (targeting, session_flag) in [(false, false), (false, true), (true, false)] {
            let guard = guard(targeting, session_flag);
            let session = Session::default();

            guard
                .on_request(RequestKind::Main, &session)
                .await
                .expect("no-op");
            assert!(session.bag_names().await.is_empty());

            assert_eq!(
                guard.ignored_session_keys(vec!["foo".to_string()]),
                vec!["foo"]
            );

            let request = request_with_session(&session);
            let mut response = response_with_cookies(&["session=abc; Path=/"]);
            guard.strip_session_cookie(&request, &mut response).await;
            assert_eq!(cookies::response_cookies(response.headers()).len(), 1);
        }
    }

    #[tokio::test]
    async fn sub_requests_never_touch_the_session() {
        let guard = guard(true, true);
        let session = Session::default();

        guard
            .on_request(RequestKind::Sub, &session)
            .await
            .expect("no-op");

        assert!(session.bag_names().await.is_empty());
        assert!(!session.is_started().await);
    }

    #[tokio::test]
    async fn started_sessions_are_left_alone() {
        let guard = guard(true, true);
        let session = Session::default();
        session.start().await;

        guard
            .on_request(RequestKind::Main, &session)
            .await
            .expect("no-op");

        assert!(session.bag_names().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_registration_is_idempotent() {
        let guard = guard(true, true);
        let session = Session::default();

        guard
            .on_request(RequestKind::Main, &session)
            .await
            .expect("first call");
        guard
            .on_request(RequestKind::Main, &session)
            .await
            .expect("second call");

        assert_eq!(session.bag_names().await.len(), 2);
    }

    #[test]
    fn ignored_keys_are_appended_in_order() {
        let guard = guard(true, true);

        assert_eq!(
            guard.ignored_session_keys(Vec::new()),
            vec!["_pimcore_targeting_session", "_pimcore_targeting_visitor"]
        );

        assert_eq!(
            guard.ignored_session_keys(vec!["foo".to_string()]),
            vec!["foo", "_pimcore_targeting_session", "_pimcore_targeting_visitor"]
        );
    }

    #[test]
    fn repeated_key_assembly_duplicates_the_keys() {
        let guard = guard(true, true);

        let once = guard.ignored_session_keys(Vec::new());
        let twice = guard.ignored_session_keys(once);
        assert_eq!(
            twice,
            vec![
                "_pimcore_targeting_session",
                "_pimcore_targeting_visitor",
                "_pimcore_targeting_session",
                "_pimcore_targeting_visitor"
            ]
        );
    }

    #[tokio::test]
    async fn strips_only_the_session_cookie() {
        let guard = guard(true, true);
        let session = Session::new("PHPSESSID");
        let request = request_with_session(&session);
        let mut response =
            response_with_cookies(&["PHPSESSID=abc123; Path=/", "other=value; Path=/"]);

        guard.strip_session_cookie(&request, &mut response).await;

        let remaining = cookies::response_cookies(response.headers());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name(), "other");
    }

    #[tokio::test]
    async fn strips_every_path_and_domain_variant_of_the_session_cookie() {
        let guard = guard(true, true);
        let session = Session::new("sid");
        let request = request_with_session(&session);
        let mut response = response_with_cookies(&[
            "sid=a; Path=/",
            "sid=b; Path=/admin",
            "sid=c; Path=/; Domain=example.com",
            "theme=dark; Path=/",
        ]);

        guard.strip_session_cookie(&request, &mut response).await;

        let remaining = cookies::response_cookies(response.headers());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name(), "theme");
    }

    #[tokio::test]
    async fn stripping_without_a_session_is_a_noop() {
        let guard = guard(true, true);
        let request = Request::new(());
        let mut response = response_with_cookies(&["session=abc; Path=/"]);

        guard.strip_session_cookie(&request, &mut response).await;

        assert_eq!(cookies::response_cookies(response.headers()).len(), 1);
    }

    #[tokio::test]
    async fn stripping_with_an_empty_cookie_name_is_a_noop() {
        let guard = guard(true, true);
        let session = Session::new("");
        let request = request_with_session(&session);
        let mut response = response_with_cookies(&["session=abc; Path=/"]);

        guard.strip_session_cookie(&request, &mut response).await;

        assert_eq!(cookies::response_cookies(response.headers()).len(), 1);
    }

    #[tokio::test]
    async fn stripping_twice_matches_stripping_once() {
        let guard = guard(true, true);
        let session = Session::new("sid");
        let request = request_with_session(&session);
        let mut response = response_with_cookies(&["sid=a; Path=/", "theme=dark; Path=/"]);

        guard.strip_session_cookie(&request, &mut response).await;
        guard.strip_session_cookie(&request, &mut response).await;

        let remaining = cookies::response_cookies(response.headers());
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name(), "theme");
    }
}
