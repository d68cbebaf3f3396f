//! HTTP + WebSocket debug API for WhisperGate
//!
//! Endpoints:
//! - POST /room/new - Create a scripted room session
//! - GET /room/{id} - Room status
//! - POST /room/{id}/step - Advance scripted frames
//! - GET /room/{id}/gates - Gate pool introspection
//! - WS /ws/{id} - Live updates per step
//! - GET /health - Health check

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::core::gate::GateSlotInfo;
use crate::core::room::Room;
use crate::core::scenario::ScenarioPlayer;
use crate::types::{PlayerId, RoomConfig};

/// One hosted room session with its scripted choreography
pub struct RoomSession {
    pub id: String,
    pub room: Room,
    pub player: ScenarioPlayer,
    pub update_tx: broadcast::Sender<RoomUpdate>,
}

/// Live update message
#[derive(Debug, Clone, Serialize)]
pub struct RoomUpdate {
    pub frame: u64,
    pub now: f32,
    pub participants: Vec<ParticipantStatus>,
}

/// Per-participant status row
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantStatus {
    pub id: PlayerId,
    pub name: String,
    pub whispering: bool,
    pub receiving: bool,
    pub status: String,
}

/// App state
pub struct AppState {
    pub rooms: RwLock<HashMap<String, RoomSession>>,
}

/// Create new room request
#[derive(Debug, Deserialize)]
pub struct NewRoomRequest {
    pub participants: Option<Vec<String>>,
}

/// Create new room response
#[derive(Debug, Serialize)]
pub struct NewRoomResponse {
    pub room_id: String,
    pub websocket_url: String,
    pub participant_ids: Vec<PlayerId>,
}

/// Room status response
#[derive(Debug, Serialize)]
pub struct RoomStatusResponse {
    pub room_id: String,
    pub frame: u64,
    pub now: f32,
    pub script_done: bool,
    pub participants: Vec<ParticipantStatus>,
}

/// Step request
#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub frames: Option<u32>,
}

/// Step response
#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub frame: u64,
    pub now: f32,
    pub script_done: bool,
    pub participants: Vec<ParticipantStatus>,
}

/// Gate introspection response
#[derive(Debug, Serialize)]
pub struct GatesResponse {
    pub room_id: String,
    pub slots: Vec<GateSlotInfo>,
    pub hud: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub rooms_active: usize,
}

/// Create the API router
pub fn create_router() -> Router {
    let state = Arc::new(AppState {
        rooms: RwLock::new(HashMap::new()),
    });

    Router::new()
        .route("/health", get(health))
        .route("/room/new", post(create_room))
        .route("/room/:id", get(get_room))
        .route("/room/:id/step", post(step_room))
        .route("/room/:id/gates", get(get_gates))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let rooms = state.rooms.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        rooms_active: rooms.len(),
    })
}

/// Create a room running the demo script; the first two participants are
/// the scripted speaker and listener, the rest stand by
async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewRoomRequest>,
) -> Result<Json<NewRoomResponse>, StatusCode> {
    let names = req
        .participants
        .unwrap_or_else(|| vec!["alice".to_string(), "bob".to_string()]);
    if names.len() < 2 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut room = Room::new(RoomConfig::default());
    let ids: Vec<PlayerId> = names.iter().map(|n| room.join(n.clone())).collect();
    let player = ScenarioPlayer::new(
        ids[0],
        ids[1],
        ids[2..].to_vec(),
        demo_phases(),
    );

    let room_id = generate_room_id();
    let (tx, _) = broadcast::channel(100);

    let session = RoomSession {
        id: room_id.clone(),
        room,
        player,
        update_tx: tx,
    };

    let mut rooms = state.rooms.write().await;
    rooms.insert(room_id.clone(), session);

    Ok(Json(NewRoomResponse {
        room_id: room_id.clone(),
        websocket_url: format!("/ws/{}", room_id),
        participant_ids: ids,
    }))
}

fn demo_phases() -> Vec<crate::core::scenario::Phase> {
    use crate::core::scenario::Phase;
    vec![
        Phase::Apart { frames: 36 },
        Phase::Whisper { frames: 144 },
        Phase::Withdraw { frames: 144 },
    ]
}

/// Get room status
async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RoomStatusResponse>, StatusCode> {
    let rooms = state.rooms.read().await;
    let session = rooms.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(RoomStatusResponse {
        room_id: id,
        frame: session.room.frame(),
        now: session.room.now(),
        script_done: session.player.done(),
        participants: participant_statuses(session),
    }))
}

/// Advance the scripted scenario
async fn step_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StepRequest>,
) -> Result<Json<StepResponse>, StatusCode> {
    let mut rooms = state.rooms.write().await;
    let session = rooms.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;

    let frames = req.frames.unwrap_or(1).min(10_000);
    for _ in 0..frames {
        let RoomSession { room, player, .. } = session;
        player.step(room);
    }

    let update = RoomUpdate {
        frame: session.room.frame(),
        now: session.room.now(),
        participants: participant_statuses(session),
    };
    let _ = session.update_tx.send(update.clone());

    Ok(Json(StepResponse {
        frame: update.frame,
        now: update.now,
        script_done: session.player.done(),
        participants: update.participants,
    }))
}

/// Gate pool introspection
async fn get_gates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GatesResponse>, StatusCode> {
    let rooms = state.rooms.read().await;
    let session = rooms.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(GatesResponse {
        room_id: id,
        slots: session.room.gate_snapshot(),
        hud: session.room.render_gate_hud(session.player.listener()),
    }))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let rooms = state.rooms.read().await;
    let session = rooms.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.update_tx.subscribe();
    drop(rooms);

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Forward broadcast updates to the socket until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<RoomUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            update = rx.recv() => {
                let Ok(update) = update else { break };
                let json = serde_json::to_string(&update).unwrap_or_default();
                if sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                // Client messages are ignored; a close or error ends the loop
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
}

fn participant_statuses(session: &RoomSession) -> Vec<ParticipantStatus> {
    session
        .room
        .roster()
        .iter()
        .map(|p| ParticipantStatus {
            id: p.id,
            name: p.display_name.clone(),
            whispering: session.room.is_whispering(p.id),
            receiving: session.room.is_receiving(p.id),
            status: session
                .room
                .receive_status(p.id)
                .unwrap_or("recv: pending")
                .to_string(),
        })
        .collect()
}

/// Generate room id
fn generate_room_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("room_{:x}", nanos as u64)
}

/// Run the API server
pub async fn run_server(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("🤫 WhisperGate API running on {}", addr);
    println!("  POST /room/new       - Create room");
    println!("  GET  /room/:id       - Room status");
    println!("  POST /room/:id/step  - Advance scripted frames");
    println!("  GET  /room/:id/gates - Gate pool introspection");
    println!("  WS   /ws/:id         - Live updates");
    println!("  GET  /health         - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
