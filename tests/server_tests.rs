use serde_json::{json, Value};
use step6502::loader::Image;
use step6502::metrics::init_metrics;
use step6502::server::{routes, AppState, MAX_RUN_PER_REQUEST};
use warp::http::StatusCode;
use warp::test::request;

// LDA #$05, ADC #$03, STA $10, then NOPs up to a reset vector pointing at $8000
fn boot_image() -> Image {
    let mut bytes = vec![0xEA; 0x8000];
    bytes[..6].copy_from_slice(&[0xA9, 0x05, 0x69, 0x03, 0x85, 0x10]);
    bytes[0x7FFC] = 0x00;
    bytes[0x7FFD] = 0x80;
    Image::from_bytes(0x8000, &bytes, 0x8000).unwrap()
}

fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

async fn create(state: &AppState) -> String {
    let api = routes(state.clone());
    let response = request().method("POST").path("/emulator").reply(&api).await;
    assert_eq!(response.status(), StatusCode::OK);

    body(&response)["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_boots_from_image() {
    let state = AppState::new(Some(boot_image()));
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("GET")
        .path(&format!("/emulator/{}", id))
        .reply(&api)
        .await;
    let json = body(&response);

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["cpu"]["pc"], 0x8000);
    assert_eq!(json["data"]["cpu"]["wait_cycles"], 6);
    assert_eq!(json["data"]["cpu"]["flags"]["interrupt_disable"], true);
    assert_eq!(json["data"]["cpu"]["next_instruction"], "LDA #$05");
}

#[tokio::test]
async fn test_step_and_execute() {
    let state = AppState::new(Some(boot_image()));
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/step", id))
        .reply(&api)
        .await;
    let json = body(&response);
    assert_eq!(json["data"]["cycles"], 2);
    assert_eq!(json["data"]["state"]["a"], 5);

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/execute", id))
        .json(&json!({ "steps": 2 }))
        .reply(&api)
        .await;
    let json = body(&response);
    assert_eq!(json["data"]["steps_executed"], 2);
    assert_eq!(json["data"]["cycles"], 5);
    assert_eq!(json["data"]["final_state"]["a"], 8);
    assert_eq!(json["data"]["final_state"]["instruction"], "STA");
}

#[tokio::test]
async fn test_tick_counts_reset_cycles() {
    let state = AppState::new(Some(boot_image()));
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/tick", id))
        .json(&json!({ "ticks": 7 }))
        .reply(&api)
        .await;
    let json = body(&response);

    assert_eq!(json["data"]["instructions"], 1);
    assert_eq!(json["data"]["cycles"], 7);
    assert_eq!(json["data"]["wait_cycles"], 1);
    assert_eq!(json["data"]["opcode"], 0xA9);
}

#[tokio::test]
async fn test_tick_budget_is_enforced() {
    let state = AppState::new(None);
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/tick", id))
        .json(&json!({ "ticks": MAX_RUN_PER_REQUEST + 1 }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&response)["success"], false);
}

#[tokio::test]
async fn test_unknown_emulator_is_not_found() {
    let api = routes(AppState::new(None));

    let response = request()
        .method("POST")
        .path("/emulator/does-not-exist/reset")
        .reply(&api)
        .await;
    let json = body(&response);

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Emulator does-not-exist not found");
}

#[tokio::test]
async fn test_program_load_and_memory_read() {
    let state = AppState::new(None);
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/program", id))
        .json(&json!({ "address": 0x0200, "data": [0xA2, 0x10, 0xE8] }))
        .reply(&api)
        .await;
    assert_eq!(body(&response)["data"], "Loaded 3 bytes at address $0200");

    let response = request()
        .method("GET")
        .path(&format!("/emulator/{}/memory?address=512&length=4", id))
        .reply(&api)
        .await;
    let json = body(&response);

    assert_eq!(json["data"]["address"], 0x0200);
    assert_eq!(json["data"]["data"], json!([0xA2, 0x10, 0xE8, 0x00]));
}

#[tokio::test]
async fn test_disassembly_defaults_to_pc() {
    let state = AppState::new(Some(boot_image()));
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("GET")
        .path(&format!("/emulator/{}/disassembly?count=3", id))
        .reply(&api)
        .await;
    let json = body(&response);
    let lines = json["data"].as_array().unwrap();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["address"], 0x8000);
    assert_eq!(lines[0]["text"], "LDA #$05");
    assert_eq!(lines[1]["text"], "ADC #$03");
    assert_eq!(lines[2]["text"], "STA $10");
}

#[tokio::test]
async fn test_snapshot_capture_and_restore() {
    let state = AppState::new(Some(boot_image()));
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/snapshots", id))
        .json(&json!({ "name": "at reset" }))
        .reply(&api)
        .await;
    let json = body(&response);
    let snapshot_id = json["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["pc"], 0x8000);

    request()
        .method("POST")
        .path(&format!("/emulator/{}/execute", id))
        .json(&json!({ "steps": 3 }))
        .reply(&api)
        .await;

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/restore", id))
        .json(&json!({ "snapshot_id": snapshot_id }))
        .reply(&api)
        .await;
    let json = body(&response);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["cpu"]["pc"], 0x8000);
    assert_eq!(json["data"]["cpu"]["a"], 0);

    let response = request().method("GET").path("/snapshots").reply(&api).await;
    let json = body(&response);
    assert_eq!(json["data"]["total_count"], 1);
    assert_eq!(json["data"]["snapshots"][0]["name"], "at reset");
}

#[tokio::test]
async fn test_restore_unknown_snapshot() {
    let state = AppState::new(None);
    let api = routes(state.clone());
    let id = create(&state).await;

    let response = request()
        .method("POST")
        .path(&format!("/emulator/{}/restore", id))
        .json(&json!({ "snapshot_id": "missing" }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(&response)["error"], "Snapshot missing not found");
}

#[tokio::test]
async fn test_list_and_delete() {
    let state = AppState::new(None);
    let api = routes(state.clone());
    let first = create(&state).await;
    create(&state).await;

    let response = request().method("GET").path("/emulators").reply(&api).await;
    assert_eq!(body(&response)["data"].as_array().unwrap().len(), 2);

    let response = request()
        .method("DELETE")
        .path(&format!("/emulator/{}", first))
        .reply(&api)
        .await;
    assert_eq!(body(&response)["success"], true);

    let response = request().method("GET").path("/emulators").reply(&api).await;
    let json = body(&response);
    let remaining = json["data"].as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_ne!(remaining[0]["id"], first.as_str());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    init_metrics();
    let api = routes(AppState::new(None));

    let response = request().method("GET").path("/metrics").reply(&api).await;
    let text = String::from_utf8(response.body().to_vec()).unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(text.contains("cpu_cycles_total"));
}
