//! Room actor: an isolated Tokio task that owns one live room.
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel. The start countdown and the round countdown are
//! polled in the same `select!` loop as the commands, so a room's state
//! only ever changes on this task.
//!
//! Successful operations are answered by the actor itself, straight into
//! the members' reply channels, so a member always sees replies and
//! broadcasts in the order the room produced them. Refusals come back to
//! the caller as a [`RoomError`].
//!
//! Session records go through a second task per room, fed in order, so a
//! member's end record is never written before their start record.

use std::collections::BTreeMap;
use std::sync::Arc;

use quizroom_protocol::payload::{
    ChatBroadcast, GameSnapshot, LeaderboardUpdate, RoundResult, RoundTick, UserAnswered,
};
use quizroom_protocol::{
    InviteCode, Leaderboard, Profile, QuestionView, Quiz, Reply, ReplyKind, RoomStatus,
    RoundStatus, UserId,
};
use quizroom_session::Participant;
use quizroom_tick::Countdown;
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::scoring::{self, RoundLedger};
use crate::{EngineConfig, RoomError, SessionEnd, SessionRecorder, SessionStart};

/// Upper bound (exclusive) for room instance ids.
const INSTANCE_ID_RANGE: u64 = 100_000_000_000;

type Responder<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to a room actor through its channel.
enum RoomCommand {
    Join {
        participant: Participant,
        reply: Responder<()>,
    },
    Leave {
        user: UserId,
        reply: Responder<LeaveOutcome>,
    },
    Start {
        user: UserId,
        reply: Responder<()>,
    },
    Reset {
        user: UserId,
        reply: Responder<()>,
    },
    NextRound {
        user: UserId,
        reply: Responder<()>,
    },
    Answer {
        user: UserId,
        option: usize,
        reply: Responder<()>,
    },
    GetGame {
        user: UserId,
        reply: Responder<()>,
    },
    IsOwner {
        user: UserId,
        reply: Responder<()>,
    },
    Chat {
        user: UserId,
        message: String,
        reply: Responder<()>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// What a successful leave did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// A regular member left; the room lives on.
    Left,
    /// The owner left; the room is gone and every member was sent
    /// `GAME_DELETED`.
    Deleted,
}

/// A snapshot of room metadata, for the registry and for tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub invite_code: InviteCode,
    pub instance_id: u64,
    pub owner: UserId,
    pub status: RoomStatus,
    pub round_status: RoundStatus,
    pub current_round: usize,
    pub members: Vec<UserId>,
    pub leaderboard: Leaderboard,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the invite code. The
/// [`RoomManager`](crate::RoomManager) holds one per room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    invite_code: InviteCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn invite_code(&self) -> &InviteCode {
        &self.invite_code
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Adds a member. The joiner gets `JOINED_GAME`, everyone else
    /// `USER_JOINED`.
    pub async fn join(&self, participant: Participant) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join { participant, reply })
            .await
    }

    /// Removes a member, or deletes the room if `user` is the owner.
    pub async fn leave(&self, user: UserId) -> Result<LeaveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Leave { user, reply }).await
    }

    /// Starts the `GAME_STARTING` countdown. Owner only, from standby.
    pub async fn start(&self, user: UserId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { user, reply }).await
    }

    /// Returns a finished room to standby. Owner only.
    pub async fn reset(&self, user: UserId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Reset { user, reply }).await
    }

    /// Starts the next round. Owner only, between rounds.
    pub async fn next_round(&self, user: UserId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::NextRound { user, reply })
            .await
    }

    /// Records `user`'s answer for the running round.
    pub async fn answer(&self, user: UserId, option: usize) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Answer {
            user,
            option,
            reply,
        })
        .await
    }

    /// Sends `user` a `GET_GAME` snapshot.
    pub async fn get_game(&self, user: UserId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::GetGame { user, reply })
            .await
    }

    /// Sends `user` an `IS_OWNER` reply.
    pub async fn is_owner(&self, user: UserId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::IsOwner { user, reply })
            .await
    }

    /// Broadcasts a chat line from `user` to every member.
    pub async fn chat(&self, user: UserId, message: String) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Chat {
            user,
            message,
            reply,
        })
        .await
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Responder<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.invite_code.clone())
    }
}

/// A session record queued for the room's recorder task.
enum SessionRecord {
    Start(SessionStart),
    End(SessionEnd),
}

/// Writes queued records one at a time until the room's sender is gone.
async fn record_sessions<R: SessionRecorder>(
    recorder: Arc<R>,
    mut records: mpsc::UnboundedReceiver<SessionRecord>,
) {
    while let Some(record) = records.recv().await {
        match record {
            SessionRecord::Start(record) => {
                let user_id = record.user_id;
                if let Err(e) = recorder.record_start(record).await {
                    warn!(%user_id, error = %e, "failed to record session start");
                }
            }
            SessionRecord::End(record) => {
                let user_id = record.user_id;
                if let Err(e) = recorder.record_end(record).await {
                    warn!(%user_id, error = %e, "failed to record session end");
                }
            }
        }
    }
}

/// Which countdown is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Starting,
    Round,
}

struct Timer {
    phase: Phase,
    countdown: Countdown,
}

/// Waits for the running timer's next step; pends forever when idle.
async fn next_step(timer: &mut Option<Timer>) -> (Phase, Option<u32>) {
    match timer {
        Some(timer) => (timer.phase, timer.countdown.next().await),
        None => std::future::pending().await,
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    quiz: Arc<Quiz>,
    instance_id: u64,
    owner: UserId,
    members: BTreeMap<UserId, Participant>,
    status: RoomStatus,
    round_status: RoundStatus,
    current_round: usize,
    leaderboard: Leaderboard,
    ledger: RoundLedger,
    timer: Option<Timer>,
    records: mpsc::UnboundedSender<SessionRecord>,
    config: EngineConfig,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the owner leaves or every handle is
    /// dropped.
    async fn run(mut self) {
        info!(
            invite_code = %self.quiz.invite_code,
            instance_id = self.instance_id,
            owner = %self.owner,
            "room created"
        );
        self.send_snapshot(self.owner, ReplyKind::JoinedGame);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle(cmd) {
                        break;
                    }
                }
                (phase, step) = next_step(&mut self.timer) => {
                    self.on_timer(phase, step);
                }
            }
        }

        info!(invite_code = %self.quiz.invite_code, "room actor stopped");
    }

    /// Handles one command. Returns `true` when the room is gone.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { participant, reply } => {
                let _ = reply.send(self.handle_join(participant));
            }
            RoomCommand::Leave { user, reply } => {
                let result = self.handle_leave(user);
                let deleted = matches!(result, Ok(LeaveOutcome::Deleted));
                let _ = reply.send(result);
                return deleted;
            }
            RoomCommand::Start { user, reply } => {
                let _ = reply.send(self.handle_start(user));
            }
            RoomCommand::Reset { user, reply } => {
                let _ = reply.send(self.handle_reset(user));
            }
            RoomCommand::NextRound { user, reply } => {
                let _ = reply.send(self.handle_next_round(user));
            }
            RoomCommand::Answer {
                user,
                option,
                reply,
            } => {
                let _ = reply.send(self.handle_answer(user, option));
            }
            RoomCommand::GetGame { user, reply } => {
                let result = self.require_member(user).map(|()| {
                    self.send_snapshot(user, ReplyKind::GetGame);
                });
                let _ = reply.send(result);
            }
            RoomCommand::IsOwner { user, reply } => {
                let result = self.require_member(user).map(|()| {
                    self.send_to(user, Reply::data(ReplyKind::IsOwner, &(user == self.owner)));
                });
                let _ = reply.send(result);
            }
            RoomCommand::Chat {
                user,
                message,
                reply,
            } => {
                let _ = reply.send(self.handle_chat(user, message));
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
        }
        false
    }

    // -- membership ---------------------------------------------------------

    fn handle_join(&mut self, participant: Participant) -> Result<(), RoomError> {
        let user = participant.id();
        if self.members.contains_key(&user) {
            return Err(RoomError::AlreadyInGame);
        }

        self.broadcast(Reply::data(ReplyKind::UserJoined, &participant.profile));
        self.members.insert(user, participant);
        self.leaderboard.insert(user, 0.0);
        self.send_snapshot(user, ReplyKind::JoinedGame);

        info!(
            invite_code = %self.quiz.invite_code,
            %user,
            members = self.members.len(),
            "member joined"
        );
        Ok(())
    }

    fn handle_leave(&mut self, user: UserId) -> Result<LeaveOutcome, RoomError> {
        if user == self.owner {
            self.require_member(user)?;
            self.broadcast(Reply::message(ReplyKind::GameDeleted));
            self.timer = None;
            info!(
                invite_code = %self.quiz.invite_code,
                members = self.members.len(),
                "owner left, room deleted"
            );
            return Ok(LeaveOutcome::Deleted);
        }

        let participant = self.members.remove(&user).ok_or(RoomError::NotInGame)?;
        participant.send(Reply::message(ReplyKind::LeftGame));
        self.broadcast(Reply::data(ReplyKind::UserLeft, &participant.profile));

        info!(
            invite_code = %self.quiz.invite_code,
            %user,
            members = self.members.len(),
            "member left"
        );
        Ok(LeaveOutcome::Left)
    }

    fn handle_chat(&self, user: UserId, message: String) -> Result<(), RoomError> {
        let sender = self.members.get(&user).ok_or(RoomError::NotInGame)?;
        let chat = ChatBroadcast {
            name: sender.profile.name.clone(),
            user_id: user,
            message,
        };
        self.broadcast(Reply::data(ReplyKind::ReceiveChat, &chat));
        Ok(())
    }

    // -- room state machine -------------------------------------------------

    fn handle_start(&mut self, user: UserId) -> Result<(), RoomError> {
        self.require_owner(user)?;
        if self.status != RoomStatus::Standby {
            return Err(RoomError::RoomStatus(self.status));
        }

        self.set_status(RoomStatus::Starting);
        self.timer = Some(Timer {
            phase: Phase::Starting,
            countdown: Countdown::new(self.config.start_delay_secs, self.config.tick_period()),
        });
        Ok(())
    }

    fn handle_reset(&mut self, user: UserId) -> Result<(), RoomError> {
        self.require_owner(user)?;
        if self.status != RoomStatus::Finished {
            return Err(RoomError::RoomStatus(self.status));
        }

        self.set_status(RoomStatus::Standby);
        self.round_status = RoundStatus::Waiting;
        self.current_round = 0;
        self.leaderboard.clear();
        self.ledger = RoundLedger::default();
        self.instance_id = new_instance_id();

        self.send_snapshot(user, ReplyKind::ResetGame);
        Ok(())
    }

    /// The start countdown reached zero.
    fn begin_game(&mut self) {
        self.set_status(RoomStatus::InProgress);
        self.broadcast(Reply::message(ReplyKind::GameInProgress));

        for &user_id in self.members.keys() {
            let record = SessionStart {
                game_id: self.quiz.id,
                user_id,
                instance_id: self.instance_id,
            };
            self.record(SessionRecord::Start(record));
        }

        if self.current_round < self.quiz.question_count() {
            self.begin_round();
        } else {
            self.finish_game();
        }
    }

    fn finish_game(&mut self) {
        self.set_status(RoomStatus::Finished);
        self.broadcast(Reply::data(
            ReplyKind::GameFinished,
            &LeaderboardUpdate {
                leaderboard: self.leaderboard.clone(),
            },
        ));

        let places = scoring::placements(&self.leaderboard, self.members.keys().copied());
        let player_count = self.members.len().saturating_sub(1);
        for (user_id, place) in places {
            let record = SessionEnd {
                game_id: self.quiz.id,
                user_id,
                instance_id: self.instance_id,
                place,
                question_count: self.quiz.question_count(),
                player_count,
                points: self.leaderboard.get(&user_id).copied().unwrap_or(0.0),
            };
            self.record(SessionRecord::End(record));
        }
    }

    // -- round state machine ------------------------------------------------

    fn handle_next_round(&mut self, user: UserId) -> Result<(), RoomError> {
        self.require_owner(user)?;
        if self.status != RoomStatus::InProgress {
            return Err(RoomError::RoomStatus(self.status));
        }
        if self.round_status != RoundStatus::Waiting {
            return Err(RoomError::RoundStatus(self.round_status));
        }

        self.send_to(user, Reply::message(ReplyKind::RoundInProgress));
        self.begin_round();
        Ok(())
    }

    fn handle_answer(&mut self, user: UserId, option: usize) -> Result<(), RoomError> {
        self.require_member(user)?;
        if self.status != RoomStatus::InProgress || self.round_status != RoundStatus::InProgress {
            return Err(RoomError::RoundStatus(RoundStatus::Waiting));
        }
        let count = self
            .quiz
            .questions
            .get(self.current_round)
            .map_or(0, |question| question.options.len());
        if option >= count {
            return Err(RoomError::InvalidOption { option, count });
        }

        self.ledger.record(user, option);
        self.send_to(
            user,
            Reply::data(
                ReplyKind::AnswerAccepted,
                &LeaderboardUpdate {
                    leaderboard: self.leaderboard.clone(),
                },
            ),
        );
        self.send_to(
            self.owner,
            Reply::data(ReplyKind::UserAnswered, &UserAnswered { user, option }),
        );
        Ok(())
    }

    fn begin_round(&mut self) {
        self.round_status = RoundStatus::InProgress;
        self.ledger = RoundLedger::new(self.current_round);
        self.timer = Some(Timer {
            phase: Phase::Round,
            countdown: Countdown::new(self.quiz.round_time, self.config.tick_period()),
        });
        debug!(
            invite_code = %self.quiz.invite_code,
            round = self.current_round,
            "round started"
        );
    }

    /// The round countdown reached zero: score, report, advance.
    ///
    /// The round is `Finished` only while it is scored. Commands are
    /// handled on this task too, so none of them ever sees that status;
    /// between rounds the room rests in `Waiting`.
    fn finish_round(&mut self) {
        let quiz = Arc::clone(&self.quiz);
        let Some(question) = quiz.questions.get(self.current_round) else {
            self.finish_game();
            return;
        };
        self.round_status = RoundStatus::Finished;

        let results = scoring::score_round(
            question,
            &self.ledger,
            self.members.keys().copied(),
            quiz.points,
            &mut self.leaderboard,
        );
        for (user, correct) in results {
            let result = RoundResult {
                correct,
                options: question.options.clone(),
                leaderboard: self.leaderboard.clone(),
            };
            self.send_to(user, Reply::data(ReplyKind::RoundFinished, &result));
        }

        debug!(
            invite_code = %quiz.invite_code,
            round = self.ledger.round(),
            answers = self.ledger.len(),
            "round finished"
        );

        self.current_round += 1;
        self.round_status = RoundStatus::Waiting;
        if self.current_round >= quiz.question_count() {
            self.finish_game();
        }
    }

    fn on_timer(&mut self, phase: Phase, step: Option<u32>) {
        match (phase, step) {
            (Phase::Starting, Some(remaining)) => {
                self.broadcast(Reply::data(ReplyKind::GameStarting, &remaining));
            }
            (Phase::Round, Some(remaining)) => self.broadcast_round_tick(remaining),
            (Phase::Starting, None) => {
                self.timer = None;
                self.begin_game();
            }
            (Phase::Round, None) => {
                self.timer = None;
                self.finish_round();
            }
        }
    }

    fn broadcast_round_tick(&self, remaining: u32) {
        let Some(question) = self.quiz.questions.get(self.current_round) else {
            return;
        };
        for (&user, member) in &self.members {
            let tick = RoundTick {
                timer: remaining,
                question: QuestionView::for_recipient(question, user == self.owner),
            };
            member.send(Reply::data(ReplyKind::RoundInProgress, &tick));
        }
    }

    // -- helpers ------------------------------------------------------------

    fn record(&self, record: SessionRecord) {
        if self.records.send(record).is_err() {
            warn!(invite_code = %self.quiz.invite_code, "session recorder task is gone");
        }
    }

    fn require_member(&self, user: UserId) -> Result<(), RoomError> {
        if self.members.contains_key(&user) {
            Ok(())
        } else {
            Err(RoomError::NotInGame)
        }
    }

    fn require_owner(&self, user: UserId) -> Result<(), RoomError> {
        self.require_member(user)?;
        if user == self.owner {
            Ok(())
        } else {
            Err(RoomError::NotOwner)
        }
    }

    fn set_status(&mut self, status: RoomStatus) {
        debug_assert!(self.status.can_transition_to(status));
        info!(
            invite_code = %self.quiz.invite_code,
            from = %self.status,
            to = %status,
            "room status changed"
        );
        self.status = status;
    }

    fn snapshot_for(&self, recipient: UserId) -> GameSnapshot {
        let members: BTreeMap<_, _> = self
            .members
            .iter()
            .map(|(&id, member)| (id, member.profile.clone()))
            .collect();
        let owner = members
            .get(&self.owner)
            .cloned()
            .unwrap_or_else(|| Profile {
                id: self.owner,
                name: String::new(),
                avatar: String::new(),
            });

        GameSnapshot {
            id: self.quiz.id,
            status: self.status,
            round_status: self.round_status,
            current_round: self.current_round,
            points: self.quiz.points,
            topic: self.quiz.topic.clone(),
            round_time: self.quiz.round_time,
            question_count: self.quiz.question_count(),
            invite_code: self.quiz.invite_code.clone(),
            members,
            owner,
            leaderboard: self.leaderboard.clone(),
            questions: (recipient == self.owner).then(|| self.quiz.questions.clone()),
        }
    }

    fn send_snapshot(&self, recipient: UserId, kind: ReplyKind) {
        self.send_to(recipient, Reply::data(kind, &self.snapshot_for(recipient)));
    }

    fn send_to(&self, user: UserId, reply: Reply) {
        if let Some(member) = self.members.get(&user) {
            member.send(reply);
        }
    }

    /// Sends a reply to every member. Members whose connection is already
    /// gone are skipped; their disconnect path removes them.
    fn broadcast(&self, reply: Reply) {
        for member in self.members.values() {
            member.send(reply.clone());
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            invite_code: self.quiz.invite_code.clone(),
            instance_id: self.instance_id,
            owner: self.owner,
            status: self.status,
            round_status: self.round_status,
            current_round: self.current_round,
            members: self.members.keys().copied().collect(),
            leaderboard: self.leaderboard.clone(),
        }
    }
}

fn new_instance_id() -> u64 {
    rand::rng().random_range(0..INSTANCE_ID_RANGE)
}

/// Spawns a room actor for `quiz` with `owner` as its only member and
/// returns a handle to it. The owner is sent `JOINED_GAME` straight away.
pub(crate) fn spawn_room<R: SessionRecorder>(
    quiz: Arc<Quiz>,
    owner: Participant,
    recorder: Arc<R>,
    config: EngineConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_channel_size.max(1));
    let (records_tx, records_rx) = mpsc::unbounded_channel();
    let invite_code = quiz.invite_code.clone();
    let owner_id = owner.id();

    let actor = RoomActor {
        quiz,
        instance_id: new_instance_id(),
        owner: owner_id,
        members: BTreeMap::from([(owner_id, owner)]),
        status: RoomStatus::Standby,
        round_status: RoundStatus::Waiting,
        current_round: 0,
        leaderboard: Leaderboard::from([(owner_id, 0.0)]),
        ledger: RoundLedger::default(),
        timer: None,
        records: records_tx,
        config,
        receiver: rx,
    };

    tokio::spawn(record_sessions(recorder, records_rx));
    tokio::spawn(actor.run());

    RoomHandle {
        invite_code,
        sender: tx,
    }
}
