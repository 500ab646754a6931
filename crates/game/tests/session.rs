use glam::Vec3;

use rollsync::{
    Command, GateState, InputOutcome, NetworkStatus, Session, SyncError, DEFAULT_PLAYER_ID,
};

struct Link {
    connected: bool,
    ping_ms: f32,
}

impl NetworkStatus for Link {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn current_ping_ms(&self) -> f32 {
        self.ping_ms
    }
}

const ONLINE: Link = Link {
    connected: true,
    ping_ms: 20.0,
};

fn terrain_json() -> String {
    let heights = vec!["0"; 16].join(",");
    format!(
        r#"{{"type":"create","id":"terrain","object_type":"terrain","x":0,"y":0,"z":0,
            "heightmap_w":4,"heightmap_h":4,"height_data":[{heights}],
            "scale_x":10,"scale_y":1,"scale_z":10,"physics_by":"ammo"}}"#
    )
}

fn sphere_json(id: &str, y: f32, physics_by: &str) -> String {
    format!(
        r#"{{"type":"create","id":"{id}","object_type":"sphere","x":0,"y":{y},"z":0,
            "radius":1,"mass":1,"physics_by":"{physics_by}"}}"#
    )
}

fn update_json(id: &str, position: Vec3) -> String {
    format!(
        r#"{{"type":"update","id":"{id}","position":{{"x":{},"y":{},"z":{}}},
            "velocity":{{"x":0,"y":0,"z":0}},"timestamp":0}}"#,
        position.x, position.y, position.z
    )
}

fn ready_session() -> Session {
    let mut session = Session::default();
    session.handle_text(&terrain_json(), 0.0).unwrap();
    session
        .handle_text(&sphere_json(DEFAULT_PLAYER_ID, 10.0, "both"), 0.0)
        .unwrap();
    assert_eq!(session.gate(), GateState::Ready);
    session
}

#[test]
fn nothing_moves_before_gate_opens() {
    let mut session = Session::default();
    session
        .handle_text(&sphere_json(DEFAULT_PLAYER_ID, 10.0, "both"), 0.0)
        .unwrap();

    let report = session.frame_with(0.1, 100.0, &ONLINE);

    assert_eq!(report.steps, 0);
    assert_eq!(report.gate, GateState::WaitingForTerrain { player_seen: true });
    assert_eq!(
        session.body_position(DEFAULT_PLAYER_ID),
        Some(Vec3::new(0.0, 10.0, 0.0))
    );
    assert_eq!(session.pending().len(), 1);
}

#[test]
fn pending_objects_jump_to_server_position_on_ready() {
    let mut session = Session::default();
    session
        .handle_text(&sphere_json(DEFAULT_PLAYER_ID, 10.0, "both"), 0.0)
        .unwrap();
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, Vec3::new(3.0, 12.0, 0.0)), 10.0)
        .unwrap();

    session.handle_text(&terrain_json(), 20.0).unwrap();

    assert_eq!(session.gate(), GateState::Ready);
    assert!(session.pending().is_empty());
    assert_eq!(
        session.body_position(DEFAULT_PLAYER_ID),
        Some(Vec3::new(3.0, 12.0, 0.0))
    );
}

#[test]
fn small_divergence_snaps_visual_only() {
    let mut session = ready_session();
    let server = Vec3::new(0.0, 10.03, 0.0);
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, server), 1000.0)
        .unwrap();

    let report = session.frame_with(0.0, 1010.0, &ONLINE);

    assert_eq!(report.steps, 0);
    assert_eq!(report.reconcile.dead_zone, 1);
    assert_eq!(session.visual_position(DEFAULT_PLAYER_ID), Some(server));
    assert_eq!(
        session.body_position(DEFAULT_PLAYER_ID),
        Some(Vec3::new(0.0, 10.0, 0.0))
    );
}

#[test]
fn correction_does_not_stack_between_steps() {
    let mut session = ready_session();
    let server = Vec3::new(0.0, 10.03, 0.0);
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, server), 1000.0)
        .unwrap();

    // Display frames faster than the physics tick: neither frame steps.
    let first = session.frame_with(1.0 / 144.0, 1005.0, &ONLINE);
    let second = session.frame_with(1.0 / 144.0, 1010.0, &ONLINE);
    assert_eq!((first.steps, second.steps), (0, 0));
    assert_eq!(second.reconcile.dead_zone, 1);

    let handle = session.object(DEFAULT_PLAYER_ID).unwrap().body();
    let force = session.physics().queued_force(handle).unwrap();
    let distance = server.y - 10.0;
    assert!(
        (force.length() - 0.5 * distance).abs() < 1e-6,
        "queued force {} for distance {}",
        force.length(),
        distance
    );
}

#[test]
fn frame_reads_the_session_monitor() {
    let mut session = ready_session();
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, Vec3::new(0.0, 10.03, 0.0)), 1000.0)
        .unwrap();

    let closed = session.frame(0.0, 1005.0);
    assert_eq!(closed.reconcile.local_fallback, 1);

    session.monitor_mut().on_open();
    let open = session.frame(0.0, 1010.0);
    assert_eq!(open.reconcile.dead_zone, 1);
}

#[test]
fn large_divergence_teleports() {
    let mut session = ready_session();
    let server = Vec3::new(0.0, 25.0, 0.0);
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, server), 1000.0)
        .unwrap();

    let report = session.frame_with(0.0, 1010.0, &ONLINE);

    assert_eq!(report.reconcile.teleports, 1);
    assert_eq!(session.body_position(DEFAULT_PLAYER_ID), Some(server));
    assert_eq!(session.visual_position(DEFAULT_PLAYER_ID), Some(server));
}

#[test]
fn silence_falls_back_to_local_physics() {
    let mut session = ready_session();
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, Vec3::new(0.0, 11.0, 0.0)), 1000.0)
        .unwrap();

    let report = session.frame_with(0.0, 1200.0, &ONLINE);

    assert_eq!(report.reconcile.local_fallback, 1);
    assert_eq!(
        session.visual_position(DEFAULT_PLAYER_ID),
        session.body_position(DEFAULT_PLAYER_ID)
    );
}

#[test]
fn disconnected_session_trusts_local_physics() {
    let mut session = ready_session();
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, Vec3::new(0.0, 11.0, 0.0)), 1000.0)
        .unwrap();

    let offline = Link {
        connected: false,
        ping_ms: 0.0,
    };
    let report = session.frame_with(1.0 / 60.0, 1005.0, &offline);

    assert_eq!(report.reconcile.local_fallback, 1);
    let body = session.body_position(DEFAULT_PLAYER_ID).unwrap();
    assert_eq!(session.visual_position(DEFAULT_PLAYER_ID), Some(body));
}

#[test]
fn high_ping_widens_teleport_threshold() {
    let mut session = ready_session();
    // 12 units off: past the base threshold of 10, inside 1.5x at high ping.
    session
        .handle_text(&update_json(DEFAULT_PLAYER_ID, Vec3::new(12.0, 10.0, 0.0)), 1000.0)
        .unwrap();

    let laggy = Link {
        connected: true,
        ping_ms: 500.0,
    };
    let report = session.frame_with(0.0, 1010.0, &laggy);

    assert_eq!(report.reconcile.teleports, 0);
    assert_eq!(report.reconcile.blended, 1);
    let params = report.reconcile.params.unwrap();
    assert!((params.teleport_threshold - 15.0).abs() < 1e-4);
}

#[test]
fn one_broken_object_does_not_block_others() {
    let mut session = ready_session();
    session
        .handle_text(&sphere_json("ball", 5.0, "both"), 0.0)
        .unwrap();
    let handle = session.object("ball").unwrap().body();
    session.physics_mut().remove_body(handle);

    let report = session.frame_with(0.0, 10.0, &ONLINE);

    assert_eq!(report.reconcile.failed, 1);
    assert_eq!(report.reconcile.static_objects, 1);
    assert_eq!(report.reconcile.local_fallback, 1);
}

#[test]
fn server_only_objects_follow_server() {
    let mut session = ready_session();
    session
        .handle_text(&sphere_json("npc", 5.0, "bullet"), 0.0)
        .unwrap();
    let server = Vec3::new(-4.0, 6.0, 2.0);
    session.handle_text(&update_json("npc", server), 100.0).unwrap();

    let report = session.frame_with(0.0, 110.0, &ONLINE);

    assert_eq!(report.reconcile.server_driven, 1);
    assert_eq!(session.body_position("npc"), Some(server));
    assert_eq!(session.visual_position("npc"), Some(server));
}

#[test]
fn batch_update_fills_every_buffer() {
    let mut session = ready_session();
    session
        .handle_text(&sphere_json("ball", 5.0, "both"), 0.0)
        .unwrap();

    session
        .handle_text(
            &format!(
                r#"{{"type":"batch_update","updates":{{
                    "{DEFAULT_PLAYER_ID}":{{"position":{{"x":0,"y":10,"z":0}}}},
                    "ball":{{"velocity":{{"x":1,"y":0,"z":0}}}},
                    "ghost":{{"position":{{"x":0,"y":0,"z":0}}}}
                }}}}"#
            ),
            50.0,
        )
        .unwrap();

    assert_eq!(session.buffers().len(), 2);
    assert!(session.buffers().latest("ghost").is_none());
    assert!(session.buffers().latest("ball").unwrap().position.is_none());
}

#[test]
fn remove_frees_the_body() {
    let mut session = ready_session();
    session
        .handle_text(&sphere_json("ball", 5.0, "both"), 0.0)
        .unwrap();
    let bodies = session.physics().body_count();

    session
        .handle_text(r#"{"type":"remove","id":"ball"}"#, 10.0)
        .unwrap();

    assert!(session.object("ball").is_none());
    assert_eq!(session.physics().body_count(), bodies - 1);
    assert!(matches!(
        session.handle_text(r#"{"type":"remove","id":"ball"}"#, 20.0),
        Err(SyncError::UnknownObject(_))
    ));
}

#[test]
fn duplicate_create_is_rejected() {
    let mut session = ready_session();
    let result = session.handle_text(&sphere_json(DEFAULT_PLAYER_ID, 3.0, "both"), 10.0);

    assert!(matches!(result, Err(SyncError::DuplicateObject(_))));
    assert_eq!(session.registry().len(), 2);
}

#[test]
fn decorative_objects_are_skipped() {
    let mut session = ready_session();
    session
        .handle_text(
            r#"{"id":"oak","object_type":"tree","x":3,"y":0,"z":3}"#,
            0.0,
        )
        .unwrap();

    assert!(session.object("oak").is_none());
}

#[test]
fn malformed_frame_is_an_error() {
    let mut session = ready_session();
    assert!(matches!(
        session.handle_text("{", 0.0),
        Err(SyncError::Protocol(_))
    ));
}

#[test]
fn pong_updates_ping() {
    let mut session = Session::default();
    session.monitor_mut().on_open();
    let ping = session.ping(1000.0);
    assert!(matches!(ping, rollsync::ClientMessage::Ping { client_time } if client_time == 1000.0));

    session
        .handle_text(
            r#"{"type":"pong","client_time":1000,"server_time":90000}"#,
            1060.0,
        )
        .unwrap();

    assert_eq!(session.monitor().current_ping_ms(), 60.0);
    assert_eq!(session.monitor().clock().offset_ms(), 90000.0 + 30.0 - 1060.0);
}

#[test]
fn single_update_feeds_clock_offset() {
    let mut session = Session::default();
    session
        .handle_text(
            r#"{"type":"update","id":"ball","velocity":{"x":1,"y":0,"z":0},"server_time":5000}"#,
            1000.0,
        )
        .unwrap();

    assert!(session.monitor().clock().is_synced());
    assert_eq!(session.monitor().clock().offset_ms(), 4000.0);
}

#[test]
fn physics_config_changes_gravity_and_impulse() {
    let mut session = ready_session();
    session
        .handle_text(
            r#"{"type":"physics_config","config":{"base_impulse":4,"gravity_y":-20}}"#,
            0.0,
        )
        .unwrap();

    assert_eq!(session.physics().gravity(), Vec3::new(0.0, -20.0, 0.0));

    session.monitor_mut().on_open();
    let InputOutcome::Send(message) = session.input(Command::Right, 5.0) else {
        panic!("connected input should be sent");
    };
    let json: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
    assert_eq!(json["cmd"], "RIGHT");
    assert_eq!(json["data"]["x"], 4.0);
}

#[test]
fn offline_input_moves_player_locally() {
    let mut session = ready_session();

    let outcome = session.input(Command::Jump, 0.0);
    assert_eq!(
        outcome,
        InputOutcome::Applied {
            impulse: Vec3::new(0.0, 16.0, 0.0)
        }
    );
    assert_eq!(session.input(Command::Jump, 5.0), InputOutcome::Debounced);
}

#[test]
fn teardown_releases_everything() {
    let mut session = ready_session();
    session.teardown();

    assert!(session.registry().is_empty());
    assert_eq!(session.physics().body_count(), 0);
    assert_eq!(session.gate(), GateState::default());
}
