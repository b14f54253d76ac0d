use crop_planner::{app, AppState};
use reqwest::Client;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn() -> TestServer {
    spawn_with(AppState::in_memory().expect("in-memory state")).await
}

pub async fn spawn_with(state: AppState) -> TestServer {
    let router = app(state).expect("router");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                rx.await.ok();
            })
            .await
            .unwrap();
    });

    let mut retries = 0;
    while retries < 10 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        retries += 1;
    }

    TestServer {
        addr,
        client: Client::new(),
        _shutdown: tx,
    }
}
