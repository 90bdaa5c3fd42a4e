use std::{
    io::{Read, Write},
    net::TcpListener,
    sync::{Arc, Mutex},
    time::Duration,
};

use actix_web::{dev::ServerHandle, web, App, HttpResponse, HttpServer};
use aries_domain::{GatewayError, Service, ServiceGateway, ServiceId};
use serde_json::{json, Value};

use crate::{HttpServiceGateway, SERVICES_PATH};

type Recorded = web::Data<Mutex<Vec<(String, Value)>>>;

async fn spawn_backend<F>(routes: F) -> (String, ServerHandle)
where
    F: Fn(&mut web::ServiceConfig) + Clone + Send + 'static,
{
    let server = HttpServer::new(move || App::new().configure(routes.clone()))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind test backend");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (format!("http://{addr}"), handle)
}

fn gateway(base_url: &str) -> HttpServiceGateway {
    HttpServiceGateway::builder()
        .base_url(base_url)
        .request_timeout(Duration::from_secs(2))
        .build()
        .expect("gateway builds")
}

fn unused_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}")
}

async fn list_ok() -> HttpResponse {
    HttpResponse::Ok().json(json!([
        {"id": 1, "name": "a"},
        {"id": "virgo", "name": "b", "url": "http://virgo"}
    ]))
}

async fn list_failing() -> HttpResponse {
    HttpResponse::InternalServerError().body("database offline")
}

async fn list_not_an_array() -> HttpResponse {
    HttpResponse::Ok().json(json!({"services": []}))
}

async fn record_put(recorded: Recorded, body: web::Json<Value>) -> HttpResponse {
    recorded
        .lock()
        .unwrap()
        .push(("PUT".into(), body.into_inner()));
    HttpResponse::Ok().json(json!({"id": 2, "name": "server copy"}))
}

async fn record_post(recorded: Recorded, body: web::Json<Value>) -> HttpResponse {
    recorded
        .lock()
        .unwrap()
        .push(("POST".into(), body.into_inner()));
    HttpResponse::Ok().body("added")
}

async fn reject_post() -> HttpResponse {
    HttpResponse::InternalServerError().body("bad request")
}

async fn reject_put_json() -> HttpResponse {
    HttpResponse::BadRequest().json("invalid request")
}

async fn created_instead_of_ok() -> HttpResponse {
    HttpResponse::Created().body("created")
}

async fn slow_list() -> HttpResponse {
    actix_web::rt::time::sleep(Duration::from_millis(500)).await;
    HttpResponse::Ok().json(json!([]))
}

#[actix_web::test]
async fn lists_services_from_backend() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::get().to(list_ok));
    })
    .await;

    let services = gateway(&base).list_services().await.expect("list succeeds");
    assert_eq!(services.len(), 2);
    assert_eq!(services[0].id(), Some(&ServiceId::Number(1)));
    assert_eq!(services[1].id(), Some(&ServiceId::Text("virgo".into())));
    assert_eq!(services[1].attribute("url"), Some(&json!("http://virgo")));

    handle.stop(true).await;
}

#[actix_web::test]
async fn non_ok_list_carries_body_as_detail() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::get().to(list_failing));
    })
    .await;

    let err = gateway(&base).list_services().await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 500,
            detail: "database offline".into()
        }
    );

    handle.stop(true).await;
}

#[actix_web::test]
async fn non_array_list_is_a_decode_failure() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::get().to(list_not_an_array));
    })
    .await;

    let err = gateway(&base).list_services().await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));

    handle.stop(true).await;
}

#[actix_web::test]
async fn unreachable_backend_is_a_transport_failure() {
    let err = gateway(&unused_origin()).list_services().await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
    assert_eq!(err.detail(), "Unable to reach any services");
}

#[actix_web::test]
async fn slow_backend_times_out_as_transport_failure() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::get().to(slow_list));
    })
    .await;

    let gateway = HttpServiceGateway::builder()
        .base_url(&base)
        .request_timeout(Duration::from_millis(50))
        .build()
        .expect("gateway builds");
    let err = gateway.list_services().await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));

    handle.stop(true).await;
}

#[actix_web::test]
async fn update_uses_put_with_full_payload() {
    let recorded: Recorded = web::Data::new(Mutex::new(Vec::new()));
    let shared = recorded.clone();
    let (base, handle) = spawn_backend(move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(shared.clone())
            .route(SERVICES_PATH, web::put().to(record_put));
    })
    .await;

    let service = Service::new(2_i64)
        .with_attribute("name", "b")
        .with_attribute("url", "http://b");
    gateway(&base)
        .update_service(&service)
        .await
        .expect("update succeeds");

    let calls = recorded.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            "PUT".to_string(),
            json!({"id": 2, "name": "b", "url": "http://b"})
        )]
    );

    handle.stop(true).await;
}

#[actix_web::test]
async fn create_uses_post_without_id() {
    let recorded: Recorded = web::Data::new(Mutex::new(Vec::new()));
    let shared = recorded.clone();
    let (base, handle) = spawn_backend(move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(shared.clone())
            .route(SERVICES_PATH, web::post().to(record_post));
    })
    .await;

    let service = Service::without_id().with_attribute("name", "c");
    gateway(&base)
        .create_service(&service)
        .await
        .expect("create succeeds");

    let calls = recorded.lock().unwrap().clone();
    assert_eq!(calls, vec![("POST".to_string(), json!({"name": "c"}))]);

    handle.stop(true).await;
}

#[actix_web::test]
async fn rejected_create_reports_plain_body() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::post().to(reject_post));
    })
    .await;

    let err = gateway(&base)
        .create_service(&Service::without_id().with_attribute("name", "c"))
        .await
        .unwrap_err();
    assert_eq!(err.detail(), "bad request");

    handle.stop(true).await;
}

#[actix_web::test]
async fn rejected_update_unwraps_json_string_body() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::put().to(reject_put_json));
    })
    .await;

    let err = gateway(&base)
        .update_service(&Service::new(9_i64))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 400,
            detail: "invalid request".into()
        }
    );

    handle.stop(true).await;
}

#[actix_web::test]
async fn other_success_codes_are_not_accepted() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::post().to(created_instead_of_ok));
    })
    .await;

    let err = gateway(&base)
        .create_service(&Service::without_id())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 201,
            detail: "created".into()
        }
    );

    handle.stop(true).await;
}

#[actix_web::test]
async fn gateway_is_usable_behind_a_trait_object() {
    let (base, handle) = spawn_backend(|cfg: &mut web::ServiceConfig| {
        cfg.route(SERVICES_PATH, web::get().to(list_ok));
    })
    .await;

    let shared: Arc<dyn ServiceGateway> = Arc::new(gateway(&base));
    assert_eq!(shared.list_services().await.unwrap().len(), 2);

    handle.stop(true).await;
}

#[actix_web::test]
async fn truncated_rejection_body_falls_back_to_reason_phrase() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind raw backend");
    let addr = listener.local_addr().expect("raw backend addr");
    let backend = std::thread::spawn(move || {
        let (mut socket, _) = listener.accept().expect("accept request");
        let mut request = Vec::new();
        let mut chunk = [0u8; 512];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            match socket.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(read) => request.extend_from_slice(&chunk[..read]),
            }
        }
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 64\r\n\r\nshort")
            .expect("write partial response");
    });

    let err = gateway(&format!("http://{addr}"))
        .list_services()
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 500,
            detail: "Internal Server Error".into()
        }
    );

    backend.join().expect("raw backend exits");
}
