//! Integration tests for the session engine and message dispatch.
//!
//! These drive `SessionEngine::dispatch` directly, without sockets, on
//! paused tokio time.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quizroom::prelude::*;
use quizroom::protocol::payload::{
    ChatBroadcast, LeaderboardUpdate, RoundResult, RoundTick, UserAnswered,
};
use quizroom::protocol::QuestionView;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Mock collaborators
// =========================================================================

struct MemoryQuizzes {
    quizzes: HashMap<InviteCode, Quiz>,
}

impl QuizStore for MemoryQuizzes {
    type Error = Infallible;

    async fn get_quiz(&self, invite_code: &InviteCode) -> Result<Option<Quiz>, Infallible> {
        Ok(self.quizzes.get(invite_code).cloned())
    }
}

/// A quiz store whose backend is always down.
struct BrokenQuizzes;

impl QuizStore for BrokenQuizzes {
    type Error = std::io::Error;

    async fn get_quiz(&self, _invite_code: &InviteCode) -> Result<Option<Quiz>, std::io::Error> {
        Err(std::io::Error::other("db down"))
    }
}

#[derive(Default)]
struct MockRecorder {
    starts: Mutex<Vec<SessionStart>>,
    ends: Mutex<Vec<SessionEnd>>,
}

impl SessionRecorder for MockRecorder {
    type Error = Infallible;

    async fn record_start(&self, record: SessionStart) -> Result<(), Infallible> {
        self.starts.lock().unwrap().push(record);
        Ok(())
    }

    async fn record_end(&self, record: SessionEnd) -> Result<(), Infallible> {
        self.ends.lock().unwrap().push(record);
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

const OWNER: UserId = UserId(1);
const PLAYER: UserId = UserId(2);

/// One question, correct answer 2, three-second round, 10 points.
fn quiz() -> Quiz {
    Quiz {
        id: 5,
        invite_code: InviteCode::new("QUIZ"),
        topic: "Rust".into(),
        round_time: 3,
        points: 10.0,
        owner: OWNER,
        questions: vec![Question {
            name: "Which keyword declares a trait?".into(),
            options: ["struct", "impl", "trait", "mod"]
                .into_iter()
                .enumerate()
                .map(|(i, name)| QuizOption {
                    name: name.into(),
                    correct: i == 2,
                })
                .collect(),
        }],
    }
}

type Engine = SessionEngine<MemoryQuizzes, MockRecorder>;

fn engine() -> (Engine, Arc<MockRecorder>) {
    let quiz = quiz();
    let quizzes = MemoryQuizzes {
        quizzes: HashMap::from([(quiz.invite_code.clone(), quiz)]),
    };
    let recorder = Arc::new(MockRecorder::default());
    let config = EngineConfig {
        start_delay_secs: 2,
        ..EngineConfig::default()
    };
    (SessionEngine::new(quizzes, Arc::clone(&recorder), config), recorder)
}

fn profile(id: UserId) -> Profile {
    Profile {
        id,
        name: format!("user-{}", id.0),
        avatar: format!("https://example.test/{}.png", id.0),
    }
}

async fn connect<Q: QuizStore>(
    engine: &SessionEngine<Q, MockRecorder>,
    id: UserId,
) -> (Participant, UnboundedReceiver<Reply>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let participant = engine.connect(profile(id), tx).await.unwrap();
    (participant, rx)
}

fn join(code: &str) -> ClientMessage {
    ClientMessage::JoinGame {
        invite_code: InviteCode::new(code),
    }
}

async fn expect(rx: &mut UnboundedReceiver<Reply>, kind: ReplyKind) -> Reply {
    let reply = tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for reply")
        .expect("reply channel closed");
    assert_eq!(reply.message, kind, "unexpected reply: {reply:?}");
    reply
}

async fn expect_error(rx: &mut UnboundedReceiver<Reply>, kind: ReplyKind) -> Reply {
    let reply = expect(rx, kind).await;
    assert!(reply.error, "expected an error reply: {reply:?}");
    reply
}

/// Owner opens the room and the player joins. Drains the join traffic.
async fn open_room(
    engine: &Engine,
) -> (
    Participant,
    UnboundedReceiver<Reply>,
    Participant,
    UnboundedReceiver<Reply>,
) {
    let (owner, mut owner_rx) = connect(engine, OWNER).await;
    let (player, mut player_rx) = connect(engine, PLAYER).await;

    engine.dispatch(&owner, join("QUIZ")).await;
    expect(&mut owner_rx, ReplyKind::JoinedGame).await;
    engine.dispatch(&player, join("QUIZ")).await;
    expect(&mut owner_rx, ReplyKind::UserJoined).await;
    expect(&mut player_rx, ReplyKind::JoinedGame).await;

    (owner, owner_rx, player, player_rx)
}

// =========================================================================
// Connections
// =========================================================================

#[tokio::test]
async fn test_connect_second_connection_is_rejected() {
    let (engine, _) = engine();
    let _first = connect(&engine, OWNER).await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let result = engine.connect(profile(OWNER), tx).await;

    assert!(matches!(result, Err(SessionError::AlreadyConnected(id)) if id == OWNER));
    assert_eq!(engine.connection_count().await, 1);
}

#[tokio::test]
async fn test_disconnect_allows_reconnect() {
    let (engine, _) = engine();
    let _first = connect(&engine, PLAYER).await;

    engine.disconnect(PLAYER).await;
    assert_eq!(engine.connection_count().await, 0);

    let (_participant, _rx) = connect(&engine, PLAYER).await;
    assert_eq!(engine.connection_count().await, 1);
}

// =========================================================================
// Dispatch: stateless replies and refusals
// =========================================================================

#[tokio::test]
async fn test_dispatch_ping_replies_pong_without_room() {
    let (engine, _) = engine();
    let (player, mut rx) = connect(&engine, PLAYER).await;

    engine.dispatch(&player, ClientMessage::Ping).await;

    let reply = expect(&mut rx, ReplyKind::Pong).await;
    assert!(!reply.error);
    assert!(reply.data.is_none());
}

#[tokio::test]
async fn test_dispatch_unknown_invite_code_is_game_not_found() {
    let (engine, _) = engine();
    let (owner, mut rx) = connect(&engine, OWNER).await;

    engine.dispatch(&owner, join("NOPE")).await;

    expect_error(&mut rx, ReplyKind::GameNotFound).await;
    assert_eq!(engine.room_count().await, 0);
}

#[tokio::test]
async fn test_dispatch_lookup_failure_is_data_error() {
    let recorder = Arc::new(MockRecorder::default());
    let engine = SessionEngine::new(BrokenQuizzes, recorder, EngineConfig::default());
    let (owner, mut rx) = connect(&engine, OWNER).await;

    engine.dispatch(&owner, join("QUIZ")).await;

    let reply = expect_error(&mut rx, ReplyKind::DataError).await;
    let detail: String = reply.parse_data().unwrap();
    assert!(detail.contains("db down"));
}

#[tokio::test]
async fn test_dispatch_non_owner_cannot_open_room() {
    let (engine, _) = engine();
    let (player, mut rx) = connect(&engine, PLAYER).await;

    engine.dispatch(&player, join("QUIZ")).await;

    expect_error(&mut rx, ReplyKind::NotOwner).await;
    assert_eq!(engine.room_count().await, 0);
}

#[tokio::test]
async fn test_dispatch_join_twice_is_already_in_game() {
    let (engine, _) = engine();
    let (owner, mut owner_rx, _player, _player_rx) = open_room(&engine).await;

    engine.dispatch(&owner, join("QUIZ")).await;

    expect_error(&mut owner_rx, ReplyKind::AlreadyInGame).await;
}

#[tokio::test]
async fn test_dispatch_room_operations_without_room_are_not_in_game() {
    let (engine, _) = engine();
    let (player, mut rx) = connect(&engine, PLAYER).await;

    for message in [
        ClientMessage::LeaveGame,
        ClientMessage::GetGame,
        ClientMessage::IsOwner,
        ClientMessage::StartGame,
        ClientMessage::ResetGame,
        ClientMessage::AnswerQuestion { option: 0 },
        ClientMessage::NextRound,
        ClientMessage::SendChat {
            message: "hi".into(),
        },
    ] {
        engine.dispatch(&player, message).await;
        expect_error(&mut rx, ReplyKind::NotInGame).await;
    }
}

#[tokio::test]
async fn test_dispatch_start_by_member_is_not_owner() {
    let (engine, _) = engine();
    let (_owner, _owner_rx, player, mut player_rx) = open_room(&engine).await;

    engine.dispatch(&player, ClientMessage::StartGame).await;

    expect_error(&mut player_rx, ReplyKind::NotOwner).await;
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_start_twice_replies_current_status() {
    let (engine, _) = engine();
    let (owner, mut owner_rx, _player, _player_rx) = open_room(&engine).await;

    engine.dispatch(&owner, ClientMessage::StartGame).await;
    engine.dispatch(&owner, ClientMessage::StartGame).await;

    expect_error(&mut owner_rx, ReplyKind::GameStarting).await;
}

#[tokio::test]
async fn test_dispatch_is_owner_answers_per_caller() {
    let (engine, _) = engine();
    let (owner, mut owner_rx, player, mut player_rx) = open_room(&engine).await;

    engine.dispatch(&owner, ClientMessage::IsOwner).await;
    engine.dispatch(&player, ClientMessage::IsOwner).await;

    let owner_reply = expect(&mut owner_rx, ReplyKind::IsOwner).await;
    assert!(owner_reply.parse_data::<bool>().unwrap());
    let player_reply = expect(&mut player_rx, ReplyKind::IsOwner).await;
    assert!(!player_reply.parse_data::<bool>().unwrap());
}

// =========================================================================
// Disconnect cleanup
// =========================================================================

#[tokio::test]
async fn test_member_disconnect_leaves_room() {
    let (engine, _) = engine();
    let (_owner, mut owner_rx, _player, _player_rx) = open_room(&engine).await;

    engine.disconnect(PLAYER).await;

    let left: Profile = expect(&mut owner_rx, ReplyKind::UserLeft)
        .await
        .parse_data()
        .unwrap();
    assert_eq!(left.id, PLAYER);
    assert_eq!(engine.room_count().await, 1);
    assert_eq!(engine.connection_count().await, 1);
}

#[tokio::test]
async fn test_owner_disconnect_deletes_room() {
    let (engine, _) = engine();
    let (_owner, _owner_rx, player, mut player_rx) = open_room(&engine).await;

    engine.disconnect(OWNER).await;

    expect(&mut player_rx, ReplyKind::GameDeleted).await;
    assert_eq!(engine.room_count().await, 0);

    engine.dispatch(&player, ClientMessage::GetGame).await;
    expect_error(&mut player_rx, ReplyKind::NotInGame).await;
}

#[tokio::test]
async fn test_disconnect_without_room_only_unregisters() {
    let (engine, _) = engine();
    let _player = connect(&engine, PLAYER).await;

    engine.disconnect(PLAYER).await;
    engine.disconnect(PLAYER).await;

    assert_eq!(engine.connection_count().await, 0);
}

// =========================================================================
// A full game through dispatch
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_game_through_dispatch() {
    let (engine, recorder) = engine();
    let (owner, mut owner_rx, player, mut player_rx) = open_room(&engine).await;

    engine.dispatch(&owner, ClientMessage::StartGame).await;
    for n in [2u32, 1] {
        let reply = expect(&mut player_rx, ReplyKind::GameStarting).await;
        assert_eq!(reply.parse_data::<u32>().unwrap(), n);
    }
    expect(&mut player_rx, ReplyKind::GameInProgress).await;

    let tick: RoundTick = expect(&mut player_rx, ReplyKind::RoundInProgress)
        .await
        .parse_data()
        .unwrap();
    assert_eq!(tick.timer, 3);
    assert!(matches!(tick.question, QuestionView::Redacted(_)));

    engine
        .dispatch(&player, ClientMessage::AnswerQuestion { option: 2 })
        .await;
    let accepted: LeaderboardUpdate = expect(&mut player_rx, ReplyKind::AnswerAccepted)
        .await
        .parse_data()
        .unwrap();
    assert_eq!(accepted.leaderboard[&PLAYER], 0.0);

    for _ in 0..2 {
        expect(&mut player_rx, ReplyKind::RoundInProgress).await;
    }
    let result: RoundResult = expect(&mut player_rx, ReplyKind::RoundFinished)
        .await
        .parse_data()
        .unwrap();
    assert!(result.correct);
    assert_eq!(result.leaderboard[&PLAYER], 10.0);

    let finished: LeaderboardUpdate = expect(&mut player_rx, ReplyKind::GameFinished)
        .await
        .parse_data()
        .unwrap();
    assert_eq!(finished.leaderboard[&PLAYER], 10.0);
    assert_eq!(finished.leaderboard[&OWNER], 0.0);

    // The owner saw the answer come in between ticks.
    for _ in 0..2 {
        expect(&mut owner_rx, ReplyKind::GameStarting).await;
    }
    expect(&mut owner_rx, ReplyKind::GameInProgress).await;
    let owner_tick: RoundTick = expect(&mut owner_rx, ReplyKind::RoundInProgress)
        .await
        .parse_data()
        .unwrap();
    assert!(matches!(owner_tick.question, QuestionView::Full(_)));
    let answered: UserAnswered = expect(&mut owner_rx, ReplyKind::UserAnswered)
        .await
        .parse_data()
        .unwrap();
    assert_eq!(answered, UserAnswered { user: PLAYER, option: 2 });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(recorder.starts.lock().unwrap().len(), 2);
    let ends = recorder.ends.lock().unwrap();
    let player_end = ends.iter().find(|end| end.user_id == PLAYER).unwrap();
    assert_eq!(player_end.place, 1);
    assert_eq!(player_end.points, 10.0);
    assert_eq!(player_end.player_count, 1);
    assert_eq!(player_end.question_count, 1);

    engine.dispatch(&owner, ClientMessage::ResetGame).await;
    // Drain the owner's remaining round traffic before the reset reply.
    loop {
        let reply = tokio::time::timeout(Duration::from_secs(60), owner_rx.recv())
            .await
            .unwrap()
            .unwrap();
        if reply.message == ReplyKind::ResetGame {
            assert!(!reply.error);
            break;
        }
    }
}

#[tokio::test]
async fn test_chat_reaches_every_member() {
    let (engine, _) = engine();
    let (_owner, mut owner_rx, player, mut player_rx) = open_room(&engine).await;

    engine
        .dispatch(
            &player,
            ClientMessage::SendChat {
                message: "good luck".into(),
            },
        )
        .await;

    for rx in [&mut owner_rx, &mut player_rx] {
        let chat: ChatBroadcast = expect(rx, ReplyKind::ReceiveChat)
            .await
            .parse_data()
            .unwrap();
        assert_eq!(chat.user_id, PLAYER);
        assert_eq!(chat.name, "user-2");
        assert_eq!(chat.message, "good luck");
    }
}
