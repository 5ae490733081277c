use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uuid::Uuid;

use server::routes;
use server::startup::{build_cors, build_state, serve};
use service::auth::repository::mock::MockAuthRepository;

struct TestApp {
    base_url: String,
    stop: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestApp {
    async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await?
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    let auth_cfg = configs::AuthConfig { jwt_secret: "e2e-secret".into(), ..configs::AuthConfig::default() };
    let state = build_state(&auth_cfg, Arc::new(MockAuthRepository::default()))?;
    let app = routes::build_router(state, build_cors());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(serve(listener, app, async move {
        let _ = rx.await;
    }));

    Ok(TestApp { base_url: format!("http://{}:{}", addr.ip(), addr.port()), stop: Some(tx), handle })
}

#[tokio::test]
async fn e2e_register_login_and_act() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let res = c.post(format!("{}/register", app.base_url))
        .json(&json!({"username": "alice", "password": "pw1"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c.post(format!("{}/login", app.base_url))
        .json(&json!({"username": "alice", "password": "pw1"}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let token = res.json::<serde_json::Value>().await?["token"].as_str().unwrap().to_string();
    assert_eq!(token.split('.').count(), 3);

    let res = c.post(format!("{}/authorized-action", app.base_url))
        .bearer_auth(&token)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'Q' { 'R' } else { 'Q' });
    let res = c.post(format!("{}/authorized-action", app.base_url))
        .bearer_auth(&tampered)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    app.shutdown().await
}

#[tokio::test]
async fn e2e_missing_header_is_bad_request() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = reqwest::Client::new().post(format!("{}/authorized-action", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "No authorization header");
    app.shutdown().await
}

#[tokio::test]
async fn e2e_requests_run_concurrently() -> anyhow::Result<()> {
    let app = start_server().await?;
    let c = reqwest::Client::new();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let c = c.clone();
        let url = format!("{}/register", app.base_url);
        tasks.push(tokio::spawn(async move {
            c.post(url).json(&json!({"username": format!("user{i}"), "password": "pw"})).send().await
        }));
    }
    for t in tasks {
        assert_eq!(t.await??.status(), HttpStatusCode::OK);
    }
    app.shutdown().await
}

/// Full stack against Postgres; runs only when `DATABASE_URL` is set.
#[tokio::test]
async fn e2e_postgres_backed_server() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        return Ok(());
    }
    let mut cfg = configs::AppConfig::default();
    cfg.server.port = {
        let spare = std::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))?;
        spare.local_addr()?.port()
    };
    cfg.normalize_and_validate()?;
    let base_url = format!("http://{}:{}", cfg.server.host, cfg.server.port);

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::run_with_config(cfg, async move {
        let _ = rx.await;
    }));

    let c = reqwest::Client::new();
    let mut ready = false;
    for _ in 0..50 {
        if c.get(format!("{base_url}/health")).send().await.is_ok() {
            ready = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert!(ready, "server did not come up");

    let username = format!("e2e_{}", Uuid::new_v4());
    let body = json!({"username": username, "password": "pw1"});
    assert_eq!(c.post(format!("{base_url}/register")).json(&body).send().await?.status(), HttpStatusCode::OK);
    assert_eq!(c.post(format!("{base_url}/register")).json(&body).send().await?.status(), HttpStatusCode::CONFLICT);

    let res = c.post(format!("{base_url}/login")).json(&body).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let token = res.json::<serde_json::Value>().await?["token"].as_str().unwrap().to_string();
    let res = c.post(format!("{base_url}/authorized-action")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let _ = tx.send(());
    handle.await?
}
