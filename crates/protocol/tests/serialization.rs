use cc_protocol::*;
use std::path::PathBuf;

#[test]
fn test_lifecycle_state_serialization() {
    let state = LifecycleState::Stopping;
    let json = serde_json::to_value(state).expect("Failed to serialize LifecycleState");

    assert_eq!(json, "STOPPING");

    let deserialized: LifecycleState =
        serde_json::from_value(json).expect("Failed to deserialize LifecycleState");
    assert_eq!(deserialized, LifecycleState::Stopping);
}

#[test]
fn test_server_status_serialization() {
    let status = ServerStatus {
        name: "Paper 1".to_string(),
        state: LifecycleState::Running,
        running: true,
        pid: Some(4242),
        started_at: Some(chrono::Utc::now()),
    };

    let json = serde_json::to_string(&status).expect("Failed to serialize ServerStatus");
    let deserialized: ServerStatus =
        serde_json::from_str(&json).expect("Failed to deserialize ServerStatus");

    assert_eq!(deserialized, status);
}

#[test]
fn test_shutdown_protocol_defaults_terminators() {
    let protocol: ShutdownProtocol =
        serde_json::from_str(r#"{"command":"end"}"#).expect("Failed to deserialize ShutdownProtocol");

    assert_eq!(protocol.command, "end");
    assert_eq!(protocol.terminator_repeats, 3);
}

#[test]
fn test_launch_descriptor_defaults() {
    let json = r#"{"target":"servers/paper1/start.sh","program":"sh"}"#;
    let ld: LaunchDescriptor = serde_json::from_str(json).expect("Failed to deserialize LaunchDescriptor");

    assert!(ld.args.is_empty());
    assert_eq!(ld.stdio, StdioMode::Piped);
    assert_eq!(ld.working_dir(), std::path::Path::new("servers/paper1"));
}

#[test]
fn test_op_enum_serialization() {
    let op = Op::StartServer {
        name: "BungeeCord".to_string(),
    };

    let json = serde_json::to_value(&op).expect("Failed to serialize Op");
    assert_eq!(json["type"], "startServer");
    assert_eq!(json["payload"]["name"], "BungeeCord");

    let deserialized: Op = serde_json::from_value(json).expect("Failed to deserialize Op");
    assert_eq!(deserialized, op);

    let json = serde_json::to_value(Op::StopAll).expect("Failed to serialize Op::StopAll");
    assert_eq!(json["type"], "stopAll");

    let json = serde_json::to_value(Op::Repair { version: None }).expect("Failed to serialize Op::Repair");
    assert_eq!(json["type"], "repair");
}

#[test]
fn test_event_enum_serialization() {
    let event = Event::ServerExited {
        name: "Paper 2".to_string(),
        exit_code: Some(1),
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["type"], "serverExited");
    assert_eq!(json["payload"]["exit_code"], 1);

    let bulk = Event::BulkCompleted {
        action: BulkAction::StopAll,
        outcomes: vec![
            OpOutcome::ok("Paper 1", "stopped"),
            OpOutcome::failed("Paper 2", "Paper 2 is not running"),
        ],
    };
    let json = serde_json::to_value(&bulk).expect("Failed to serialize Event");
    assert_eq!(json["type"], "bulkCompleted");
    assert_eq!(json["payload"]["action"], "stopAll");
    assert_eq!(json["payload"]["outcomes"][1]["success"], false);

    let eula = Event::EulaPending {
        name: "Paper 1".to_string(),
        path: PathBuf::from("servers/paper1/eula.txt"),
    };
    let deserialized: Event = serde_json::from_value(
        serde_json::to_value(&eula).expect("Failed to serialize Event"),
    )
    .expect("Failed to deserialize Event");
    assert_eq!(deserialized, eula);
}

#[test]
fn test_op_outcome_from_result() {
    let ok: Result<u32, String> = Ok(7);
    let outcome = OpOutcome::from_result("Paper 1", &ok, |pid| format!("started (pid {pid})"));
    assert!(outcome.success);
    assert_eq!(outcome.message, "started (pid 7)");

    let err: Result<u32, String> = Err("boom".to_string());
    let outcome = OpOutcome::from_result("Paper 1", &err, |_| String::new());
    assert!(!outcome.success);
    assert_eq!(outcome.message, "boom");
}

#[test]
fn test_missing_item_display() {
    let item = MissingItem {
        server: "BungeeCord".to_string(),
        kind: MissingKind::Jar,
        path: PathBuf::from("servers/bungee/BungeeCord.jar"),
    };

    let text = item.to_string();
    assert!(text.contains("BungeeCord"));
    assert!(text.contains("server jar"));
}
