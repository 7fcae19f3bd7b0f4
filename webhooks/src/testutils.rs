use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::HeaderMap;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::sync::Arc;
use store::types::{Id, Survey, Webhook};
use store::{MemoryStore, Store};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const OWNER: Id = 3;

pub struct Received {
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Starts a server on an ephemeral port that records every request and
/// answers with `status`.
pub async fn start_receiver(status: StatusCode) -> (String, mpsc::UnboundedReceiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let tx = tx.clone();

            tokio::spawn(async move {
                let handler = move |req: Request<Incoming>| {
                    let tx = tx.clone();
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body
                            .collect()
                            .await
                            .map(|collected| collected.to_bytes())
                            .unwrap_or_default();
                        let _ = tx.send(Received {
                            headers: parts.headers,
                            body,
                        });

                        let mut response = Response::new(Full::new(Bytes::from_static(b"ok")));
                        *response.status_mut() = status;
                        Ok::<_, Infallible>(response)
                    }
                };

                if let Err(err) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, service_fn(handler))
                    .await
                {
                    eprintln!("Error serving connection: {:?}", err);
                }
            });
        }
    });

    (format!("http://127.0.0.1:{port}/hook"), rx)
}

pub async fn store_with_survey() -> (Arc<dyn Store>, Id) {
    let store = MemoryStore::new();
    let now = Utc::now();

    let mut tx = store.begin().await.unwrap();
    let survey = tx
        .insert_survey(&Survey {
            id: 0,
            user_id: OWNER,
            title: "Webhook target".into(),
            description: String::new(),
            release_date: None,
            close_date: None,
            response_limit: None,
            redirect_url: String::new(),
            closed_message: String::new(),
            custom_styles: String::new(),
            version: 1,
            is_published: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();

    (Arc::new(store), survey.id)
}

pub async fn register(
    store: &Arc<dyn Store>,
    survey_id: Id,
    url: &str,
    events: &str,
    secret: &str,
) -> Webhook {
    let mut tx = store.begin().await.unwrap();
    let webhook = tx
        .insert_webhook(&Webhook {
            id: 0,
            user_id: OWNER,
            survey_id,
            url: url.into(),
            events: events.into(),
            secret: secret.into(),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    webhook
}
