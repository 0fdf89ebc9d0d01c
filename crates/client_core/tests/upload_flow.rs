use std::{sync::Arc, time::Duration};

use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use client_core::{
    view::{DetectionRow, ResultPanel},
    Completion, ControllerEvent, HttpPredictionTransport, LifecycleState, Settings,
    UploadController,
};
use shared::{domain::SelectedFile, error::DetectError};
use tokio::net::TcpListener;

async fn detect(mut multipart: Multipart) -> Result<Json<serde_json::Value>, StatusCode> {
    let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    else {
        return Err(StatusCode::BAD_REQUEST);
    };
    if field.name() != Some("file") {
        return Err(StatusCode::BAD_REQUEST);
    }
    let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;

    // Echo the upload back as the "annotated" image so the client side can
    // check what arrived.
    Ok(Json(serde_json::json!({
        "detections": [
            { "class": "cat", "conf": 0.873 },
            { "class": "sofa", "conf": null }
        ],
        "imagedetect": STANDARD.encode(&bytes),
    })))
}

async fn slow_detect(multipart: Multipart) -> Result<Json<serde_json::Value>, StatusCode> {
    tokio::time::sleep(Duration::from_millis(300)).await;
    detect(multipart).await
}

async fn spawn_detection_api() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/predict", post(detect))
        .route("/slow/predict", post(slow_detect));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn photo() -> SelectedFile {
    SelectedFile::new("living-room.jpg", "image/jpeg", b"jpeg-living-room".to_vec())
}

#[tokio::test]
async fn upload_detect_render_and_reset() {
    let settings = Settings {
        api_url: spawn_detection_api().await,
        ..Settings::default()
    };
    let mut controller = UploadController::from_settings(&settings).expect("controller");
    let mut events = controller.subscribe_events();

    controller.select_file(photo()).expect("accepted");
    let completion = controller.submit().await.expect("submitted");
    assert_eq!(completion, Completion::Applied);

    let result = controller.result().expect("result").clone();
    assert_eq!(
        result.annotated_image_bytes().expect("base64"),
        b"jpeg-living-room"
    );
    match ResultPanel::project(&controller) {
        ResultPanel::Detected { rows, .. } => assert_eq!(
            rows,
            vec![
                DetectionRow {
                    index: 1,
                    label: "cat".into(),
                    confidence: Some("87.3%".into()),
                },
                DetectionRow {
                    index: 2,
                    label: "sofa".into(),
                    confidence: None,
                },
            ]
        ),
        other => panic!("unexpected panel: {other:?}"),
    }

    assert_eq!(
        events.recv().await.expect("event"),
        ControllerEvent::LoadingChanged(true)
    );
    assert_eq!(
        events.recv().await.expect("event"),
        ControllerEvent::ResultAvailable(result)
    );
    assert_eq!(
        events.recv().await.expect("event"),
        ControllerEvent::LoadingChanged(false)
    );

    controller.reset();
    assert_eq!(controller.state(), &LifecycleState::Idle);
    assert_eq!(ResultPanel::project(&controller), ResultPanel::AwaitingUpload);
}

#[tokio::test]
async fn reset_during_request_discards_the_late_response() {
    let base = spawn_detection_api().await;
    let transport = Arc::new(
        HttpPredictionTransport::new(&Settings {
            api_url: format!("{base}/slow"),
            ..Settings::default()
        })
        .expect("transport"),
    );
    let mut controller = UploadController::new(transport.clone());
    controller.select_file(photo()).expect("accepted");

    let pending = controller.begin_submit().expect("submit");
    let request = tokio::spawn(async move { pending.send(transport.as_ref()).await });
    controller.reset();

    let outcome = request.await.expect("request task");
    assert!(outcome.result().is_ok());
    assert_eq!(controller.complete(outcome), Completion::Discarded);
    assert_eq!(controller.state(), &LifecycleState::Idle);
    assert!(controller.result().is_none());
}

#[tokio::test]
async fn unreachable_api_leaves_controller_ready_to_retry() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let mut controller = UploadController::from_settings(&Settings {
        api_url: format!("http://{addr}"),
        ..Settings::default()
    })
    .expect("controller");
    controller.select_file(photo()).expect("accepted");
    controller.submit().await.expect("submitted");

    assert_eq!(
        controller.state(),
        &LifecycleState::Error(DetectError::NetworkUnreachable)
    );
    assert!(controller.can_submit());
}
