use axum::{Router, routing::get};
use chrono::{Duration as ChronoDuration, Utc};
use clipgate_api::{CurrentIdentity, Gateway};
use clipgate_auth::{Hs256TokenCodec, IdentityClaims, Role, RoleSet, TokenCodec};
use clipgate_core::{DeploymentMode, GatewayConfig, SubjectId};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_METHOD, COOKIE, ORIGIN, SET_COOKIE,
};

const SECRET: &str = "test-secret";
const ALLOWED_ORIGIN: &str = "http://localhost:8081";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(app: Router) -> Self {
        // Same router as prod, but bound to an ephemeral port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn default_app() -> Self {
        Self::spawn(clipgate_api::build_app(&GatewayConfig::with_secret(SECRET)).unwrap()).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn codec(secret: &str) -> Hs256TokenCodec {
    Hs256TokenCodec::new(secret, ChronoDuration::hours(1))
}

fn token_for(subject: &str, role: Role) -> String {
    codec(SECRET).issue(&SubjectId::new(subject), role).unwrap()
}

/// Mint a token by hand, bypassing the codec's input checks.
fn mint_raw(secret: &str, subject: &str, role: Role) -> String {
    let now = Utc::now();
    let claims = IdentityClaims {
        sub: SubjectId::new(subject),
        role,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn session(token: &str) -> String {
    format!("authToken={token}")
}

async fn get_json(
    client: &reqwest::Client,
    url: String,
    cookie: Option<String>,
) -> (StatusCode, serde_json::Value) {
    let mut req = client.get(url);
    if let Some(cookie) = cookie {
        req = req.header(COOKIE, cookie);
    }
    let res = req.send().await.unwrap();
    let status = res.status();
    let body = res.json().await.unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_needs_no_session() {
    let srv = TestServer::default_app().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_cookie_is_login_required() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();

    for path in ["/auth/me", "/admin/session"] {
        let (status, body) = get_json(&client, srv.url(path), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body["message"], "login required", "{path}");
    }

    // Other cookies do not count as a session.
    let (status, _) = get_json(&client, srv.url("/auth/me"), Some("theme=dark".into())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn identity_is_derived_from_cookie_token() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();

    let cookie = format!("theme=dark; {}", session(&token_for("u1", Role::User)));
    let (status, body) = get_json(&client, srv.url("/auth/me"), Some(cookie)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject_id"], "u1");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn user_is_refused_admin_routes() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(
        &client,
        srv.url("/admin/session"),
        Some(session(&token_for("u1", Role::User))),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "admin privileges required");
}

#[tokio::test]
async fn admin_tier_roles_reach_admin_routes() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();

    for (subject, role) in [("a1", Role::Admin), ("g1", Role::God)] {
        let (status, body) =
            get_json(&client, srv.url("/admin/session"), Some(session(&token_for(subject, role)))).await;
        assert_eq!(status, StatusCode::OK, "{role}");
        assert_eq!(body["subject_id"], subject);
        assert_eq!(body["role"], role.as_str());
    }
}

#[tokio::test]
async fn god_passes_an_admin_only_guard() {
    let config = GatewayConfig::with_secret(SECRET);
    let gateway = Gateway::from_config(&config);

    async fn stats(CurrentIdentity(identity): CurrentIdentity) -> String {
        format!("stats for {}", identity.subject_id)
    }

    let app = gateway.require_role(
        Router::new().route("/stats", get(stats)),
        RoleSet::of([Role::Admin]),
    );
    let srv = TestServer::spawn(app).await;

    let res = reqwest::Client::new()
        .get(srv.url("/stats"))
        .header(COOKIE, session(&token_for("g1", Role::God)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "stats for g1");
}

#[tokio::test]
async fn foreign_secret_is_invalid_token() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();

    let forged = codec("someone-elses-secret")
        .issue(&SubjectId::new("g1"), Role::God)
        .unwrap();

    for path in ["/auth/me", "/admin/session"] {
        let (status, body) = get_json(&client, srv.url(path), Some(session(&forged))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(body["message"], "invalid token", "{path}");
    }
}

#[tokio::test]
async fn token_is_honoured_until_expiry_only() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();
    let codec = codec(SECRET);
    let subject = SubjectId::new("a1");

    let fresh = codec
        .issue_at(&subject, Role::Admin, Utc::now() - ChronoDuration::minutes(30))
        .unwrap();
    let (status, _) = get_json(&client, srv.url("/admin/session"), Some(session(&fresh))).await;
    assert_eq!(status, StatusCode::OK);

    let stale = codec
        .issue_at(&subject, Role::Admin, Utc::now() - ChronoDuration::minutes(61))
        .unwrap();
    let (status, body) = get_json(&client, srv.url("/admin/session"), Some(session(&stale))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "invalid token");
}

#[tokio::test]
async fn garbage_cookie_is_invalid_token() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, srv.url("/auth/me"), Some(session("not.a.jwt"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "invalid token");
}

#[tokio::test]
async fn malformed_identity_is_a_server_error() {
    let srv = TestServer::default_app().await;
    let client = reqwest::Client::new();

    // Validly signed, but with a subject the issuer would never produce.
    let token = mint_raw(SECRET, "", Role::God);
    let (status, body) = get_json(&client, srv.url("/admin/session"), Some(session(&token))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "server error");
}

#[tokio::test]
async fn foreign_origin_is_rejected_before_authentication() {
    let srv = TestServer::default_app().await;

    let res = reqwest::Client::new()
        .get(srv.url("/admin/session"))
        .header(ORIGIN, "http://evil.example")
        .header(COOKIE, session(&token_for("g1", Role::God)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "origin not allowed");
}

#[tokio::test]
async fn origin_match_is_exact() {
    let srv = TestServer::default_app().await;

    let res = reqwest::Client::new()
        .get(srv.url("/auth/me"))
        .header(ORIGIN, "HTTP://LOCALHOST:8081")
        .header(COOKIE, session(&token_for("u1", Role::User)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn blank_duplicate_cookie_does_not_hide_the_session() {
    let srv = TestServer::default_app().await;

    let cookie = format!("authToken=; {}", session(&token_for("u1", Role::User)));
    let (status, body) = get_json(&reqwest::Client::new(), srv.url("/auth/me"), Some(cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject_id"], "u1");
}

#[tokio::test]
async fn allowed_origin_gets_credentialed_cors_headers() {
    let srv = TestServer::default_app().await;

    let res = reqwest::Client::new()
        .get(srv.url("/auth/me"))
        .header(ORIGIN, ALLOWED_ORIGIN)
        .header(COOKIE, session(&token_for("u1", Role::User)))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], ALLOWED_ORIGIN);
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn preflight_lists_allowed_methods() {
    let srv = TestServer::default_app().await;

    let res = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, srv.url("/admin/session"))
        .header(ORIGIN, ALLOWED_ORIGIN)
        .header(ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    let methods = res.headers()[ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap().to_string();
    for m in ["GET", "HEAD", "PUT", "PATCH", "POST", "DELETE"] {
        assert!(methods.contains(m), "missing {m} in {methods}");
    }
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn logout_expires_the_session_cookie() {
    let srv = TestServer::default_app().await;

    let res = reqwest::Client::new().post(srv.url("/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("authToken=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn production_cookies_are_secure() {
    let mut config = GatewayConfig::with_secret(SECRET);
    config.mode = DeploymentMode::Production;
    let srv = TestServer::spawn(clipgate_api::build_app(&config).unwrap()).await;

    let res = reqwest::Client::new().post(srv.url("/auth/logout")).send().await.unwrap();
    let cookie = res.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.ends_with("; Secure"));
}

#[tokio::test]
async fn downstream_services_mount_behind_the_gateway() {
    async fn feed(CurrentIdentity(identity): CurrentIdentity) -> String {
        format!("feed for {}", identity.subject_id)
    }
    async fn daily() -> &'static str {
        "daily statistics"
    }
    async fn explode() -> &'static str {
        panic!("statistics backend exploded")
    }

    let members = Router::new()
        .route("/community/feed", get(feed))
        .route("/community/explode", get(explode));
    let admin = Router::new().route("/statistics/daily", get(daily));

    let app = clipgate_api::build_app_with(&GatewayConfig::with_secret(SECRET), members, admin).unwrap();
    let srv = TestServer::spawn(app).await;
    let client = reqwest::Client::new();
    let user = Some(session(&token_for("u1", Role::User)));

    let res = client
        .get(srv.url("/community/feed"))
        .header(COOKIE, user.clone().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "feed for u1");

    let (status, _) = get_json(&client, srv.url("/community/feed"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_json(&client, srv.url("/admin/statistics/daily"), user.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/admin/statistics/daily"))
        .header(COOKIE, session(&token_for("a1", Role::Admin)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = get_json(&client, srv.url("/community/explode"), user).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "server error");
}

#[tokio::test]
async fn issued_session_cookie_round_trips_through_the_gateway() {
    use clipgate_api::session::{SessionCookie, SessionSettings};

    let config = GatewayConfig::with_secret(SECRET);
    let gateway = Gateway::from_config(&config);
    let settings = SessionSettings::from_config(&config);

    let set_cookie = SessionCookie::issue(gateway.codec().as_ref(), &settings, &SubjectId::new("a1"), Role::Admin)
        .unwrap();
    let set_cookie = set_cookie.to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=3600"));

    // A browser echoes back only the name=value pair.
    let pair = set_cookie.split(';').next().unwrap().to_string();

    let srv = TestServer::spawn(clipgate_api::build_app(&config).unwrap()).await;
    let (status, body) = get_json(&reqwest::Client::new(), srv.url("/admin/session"), Some(pair)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject_id"], "a1");
    assert_eq!(body["role"], "admin");
    assert_eq!(body.as_object().map(|o| o.len()), Some(2));
}
