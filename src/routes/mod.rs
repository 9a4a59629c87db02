pub mod admin;
pub mod analysis;
pub mod auth;
pub mod seed;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::analysis::{AnalyzerError, TextAnalyzer};
    use crate::identity::{IdentityProvider, local::LocalIdentity};
    use crate::models::account::{Account, Role};
    use crate::models::analysis::DriverReport;
    use crate::state::AppState;
    use crate::store::AccountStore;
    use crate::store::memory::MemoryStore;
    use crate::utils::time::time_now;

    struct CountingAnalyzer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextAnalyzer for CountingAnalyzer {
        async fn analyze(&self, _text: &str) -> Result<DriverReport, AnalyzerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DriverReport {
                motivations: vec!["Autonomie".to_string(), "Groei".to_string()],
                summary: "Gedreven door zelfstandigheid.".to_string(),
            })
        }
    }

    struct Harness {
        app: Router,
        store: Arc<MemoryStore>,
        identity: Arc<LocalIdentity>,
        analyzer: Arc<CountingAnalyzer>,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(LocalIdentity::new("test-secret"));
        let analyzer = Arc::new(CountingAnalyzer {
            calls: AtomicUsize::new(0),
        });
        let state = AppState::with_backends(
            store.clone(),
            store.clone(),
            store.clone(),
            identity.clone(),
            analyzer.clone(),
        );
        Harness {
            app: crate::app(state),
            store,
            identity,
            analyzer,
        }
    }

    impl Harness {
        /// Identity user plus account record plus live session.
        async fn provision(
            &self,
            email: &str,
            role: Role,
            parent_id: Option<&str>,
        ) -> (String, String) {
            let user = self
                .identity
                .create_user(email, "wachtwoord123")
                .await
                .unwrap();
            let account = Account {
                id: user.id.clone(),
                email: email.to_string(),
                display_name: email.split('@').next().unwrap().to_string(),
                role,
                parent_id: parent_id.map(str::to_string),
                created_at: time_now(),
                last_login: None,
            };
            AccountStore::create(self.store.as_ref(), account)
                .await
                .unwrap();
            let session = self
                .identity
                .sign_in(email, "wachtwoord123")
                .await
                .unwrap();
            (session.token, user.id)
        }

        async fn request(
            &self,
            method: &str,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> Response {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            self.app.clone().oneshot(request).await.unwrap()
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[tokio::test]
    async fn register_without_invitation_is_rejected() {
        let h = harness();
        let res = h
            .request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "display_name": "Sander",
                    "email": "sander@voorbeeld.nl",
                    "password": "wachtwoord"
                })),
            )
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(res).await.contains("invited"));
    }

    #[tokio::test]
    async fn invited_registration_copies_invitation_fields() {
        let h = harness();
        let (boss_token, boss_id) = h
            .provision("boss@voorbeeld.nl", Role::Superadmin, None)
            .await;

        let res = h
            .request(
                "POST",
                "/admin/users/invite",
                Some(&boss_token),
                Some(json!({
                    "display_name": "Nieuwe Beheerder",
                    "email": "nieuw@voorbeeld.nl",
                    "role": "admin"
                })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        // The form's display name loses against the invitation's.
        let res = h
            .request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "display_name": "Iemand Anders",
                    "email": "nieuw@voorbeeld.nl",
                    "password": "wachtwoord"
                })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let created = AccountStore::find_by_email(h.store.as_ref(), "nieuw@voorbeeld.nl")
            .await
            .unwrap()
            .expect("account record");
        assert_eq!(created.role, Role::Admin);
        assert_eq!(created.display_name, "Nieuwe Beheerder");
        assert_eq!(created.parent_id.as_deref(), Some(boss_id.as_str()));

        // Consumed invitation cannot gate a second registration in.
        let res = h
            .request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "display_name": "Iemand Anders",
                    "email": "nieuw@voorbeeld.nl",
                    "password": "wachtwoord"
                })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_invitations_and_existing_accounts_are_rejected() {
        let h = harness();
        let (boss_token, _) = h
            .provision("boss@voorbeeld.nl", Role::Superadmin, None)
            .await;

        let invite = |email: &str| {
            json!({
                "display_name": "Nieuwe",
                "email": email,
                "role": "user"
            })
        };

        let res = h
            .request(
                "POST",
                "/admin/users/invite",
                Some(&boss_token),
                Some(invite("nieuw@voorbeeld.nl")),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = h
            .request(
                "POST",
                "/admin/users/invite",
                Some(&boss_token),
                Some(invite("nieuw@voorbeeld.nl")),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(res).await.contains("invitation"));

        let res = h
            .request(
                "POST",
                "/admin/users/invite",
                Some(&boss_token),
                Some(invite("boss@voorbeeld.nl")),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(res).await.contains("already exists"));
    }

    #[tokio::test]
    async fn password_reset_response_is_identical_for_unknown_and_known_email() {
        let h = harness();
        let payload = json!({ "email": "sander@voorbeeld.nl" });

        let before = h
            .request("POST", "/auth/password/reset-request", None, Some(payload.clone()))
            .await;
        assert_eq!(before.status(), StatusCode::OK);
        let before_body = body_string(before).await;

        h.identity
            .create_user("sander@voorbeeld.nl", "wachtwoord")
            .await
            .unwrap();

        let after = h
            .request("POST", "/auth/password/reset-request", None, Some(payload))
            .await;
        assert_eq!(after.status(), StatusCode::OK);
        assert_eq!(before_body, body_string(after).await);
    }

    #[tokio::test]
    async fn short_text_never_reaches_the_analyzer() {
        let h = harness();
        let (token, _) = h.provision("user@voorbeeld.nl", Role::User, None).await;

        let res = h
            .request(
                "POST",
                "/analysis/scan",
                Some(&token),
                Some(json!({ "text": "short" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.analyzer.calls.load(Ordering::SeqCst), 0);

        let res = h
            .request(
                "POST",
                "/analysis/scan",
                Some(&token),
                Some(json!({ "text": "Ik wil graag begrijpen wat mij drijft in mijn werk." })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(h.analyzer.calls.load(Ordering::SeqCst), 1);

        let report = body_json(res).await;
        assert_eq!(report["motivations"][0], "Autonomie");
    }

    #[tokio::test]
    async fn admin_surface_requires_a_session() {
        let h = harness();
        let res = h.request("GET", "/admin/users", None, None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = h
            .request("GET", "/admin/users", Some("garbage-token"), None)
            .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn role_grants_outside_the_assignable_table_are_rejected() {
        let h = harness();
        let (admin_token, admin_id) = h
            .provision("admin@voorbeeld.nl", Role::Admin, None)
            .await;
        let (_, child_id) = h
            .provision("kind@voorbeeld.nl", Role::User, Some(&admin_id))
            .await;

        // admins may only grant `user`, UI or no UI
        let res = h
            .request(
                "PATCH",
                &format!("/admin/users/{child_id}/role"),
                Some(&admin_token),
                Some(json!({ "role": "hoofdadmin" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = h
            .request(
                "PATCH",
                &format!("/admin/users/{child_id}/role"),
                Some(&admin_token),
                Some(json!({ "role": "user" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        // even superadmin cannot mint another superadmin
        let (boss_token, _) = h
            .provision("boss@voorbeeld.nl", Role::Superadmin, None)
            .await;
        let res = h
            .request(
                "PATCH",
                &format!("/admin/users/{child_id}/role"),
                Some(&boss_token),
                Some(json!({ "role": "superadmin" })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn managers_only_reach_their_own_subtree() {
        let h = harness();
        let (admin_token, admin_id) = h
            .provision("admin@voorbeeld.nl", Role::Admin, None)
            .await;
        let (_, child_id) = h
            .provision("kind@voorbeeld.nl", Role::User, Some(&admin_id))
            .await;
        let (_, stranger_id) = h
            .provision("vreemde@voorbeeld.nl", Role::User, None)
            .await;

        let res = h
            .request(
                "GET",
                &format!("/admin/users/{child_id}"),
                Some(&admin_token),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let detail = body_json(res).await;
        assert_eq!(detail["parent_display_name"], "admin");

        let res = h
            .request(
                "GET",
                &format!("/admin/users/{stranger_id}"),
                Some(&admin_token),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = h.request("GET", "/admin/users", Some(&admin_token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let listed = body_json(res).await;
        let emails: Vec<&str> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["email"].as_str().unwrap())
            .collect();
        assert_eq!(emails, vec!["kind@voorbeeld.nl"]);
    }

    #[tokio::test]
    async fn plain_users_cannot_invite() {
        let h = harness();
        let (token, _) = h.provision("user@voorbeeld.nl", Role::User, None).await;

        let res = h
            .request(
                "POST",
                "/admin/users/invite",
                Some(&token),
                Some(json!({
                    "display_name": "Nieuwe",
                    "email": "nieuw@voorbeeld.nl",
                    "role": "user"
                })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn seeding_is_superadmin_only_and_runs_once() {
        let h = harness();
        let (boss_token, _) = h
            .provision("boss@voorbeeld.nl", Role::Superadmin, None)
            .await;
        let (user_token, _) = h.provision("user@voorbeeld.nl", Role::User, None).await;

        let res = h
            .request("POST", "/admin/seed/colors", Some(&user_token), None)
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = h
            .request("POST", "/admin/seed/colors", Some(&boss_token), None)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let first = body_json(res).await;
        assert_eq!(first["success"], true);

        let res = h
            .request("POST", "/admin/seed/colors", Some(&boss_token), None)
            .await;
        let second = body_json(res).await;
        assert_eq!(second["success"], false);
        assert!(second["message"].as_str().unwrap().contains("not empty"));
    }

    #[tokio::test]
    async fn sign_out_revokes_the_session() {
        let h = harness();
        let (token, _) = h.provision("user@voorbeeld.nl", Role::User, None).await;

        let res = h.request("POST", "/auth/signout", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = h.request("GET", "/admin/users", Some(&token), None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sign_in_route_stamps_last_login() {
        let h = harness();
        let (_, user_id) = h.provision("user@voorbeeld.nl", Role::User, None).await;
        assert!(h.store.get(&user_id).await.unwrap().unwrap().last_login.is_none());

        let res = h
            .request(
                "POST",
                "/auth/signin",
                None,
                Some(json!({
                    "email": "user@voorbeeld.nl",
                    "password": "wachtwoord123"
                })),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let account = h.store.get(&user_id).await.unwrap().unwrap();
        assert!(account.last_login.is_some());
    }
}
