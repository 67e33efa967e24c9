use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use quizroom::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SAMPLE_QUIZZES: &str = include_str!("../quizzes.json");

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Quizzes loaded once from a JSON array.
struct JsonQuizStore {
    quizzes: HashMap<InviteCode, Quiz>,
}

impl JsonQuizStore {
    fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let quizzes: Vec<Quiz> = serde_json::from_str(json)?;
        Ok(Self {
            quizzes: quizzes
                .into_iter()
                .map(|quiz| (quiz.invite_code.clone(), quiz))
                .collect(),
        })
    }
}

impl QuizStore for JsonQuizStore {
    type Error = Infallible;

    async fn get_quiz(&self, invite_code: &InviteCode) -> Result<Option<Quiz>, Infallible> {
        Ok(self.quizzes.get(invite_code).cloned())
    }
}

/// Accepts `"<id>:<name>"` tokens. Development only.
struct DevAuth;

impl Authenticator for DevAuth {
    async fn authenticate(&self, token: &str) -> Result<Profile, SessionError> {
        let (id, name) = token
            .split_once(':')
            .ok_or_else(|| SessionError::AuthFailed("token must be id:name".into()))?;
        let id: u64 = id
            .parse()
            .map_err(|_| SessionError::AuthFailed("id must be a number".into()))?;
        if name.is_empty() {
            return Err(SessionError::AuthFailed("name must not be empty".into()));
        }
        Ok(Profile {
            id: UserId(id),
            name: name.to_string(),
            avatar: String::new(),
        })
    }
}

/// Writes session records to the log instead of a database.
struct LogRecorder;

impl SessionRecorder for LogRecorder {
    type Error = Infallible;

    async fn record_start(&self, record: SessionStart) -> Result<(), Infallible> {
        info!(
            game_id = record.game_id,
            user_id = %record.user_id,
            instance_id = record.instance_id,
            "session started"
        );
        Ok(())
    }

    async fn record_end(&self, record: SessionEnd) -> Result<(), Infallible> {
        info!(
            game_id = record.game_id,
            user_id = %record.user_id,
            instance_id = record.instance_id,
            place = record.place,
            points = record.points,
            players = record.player_count,
            questions = record.question_count,
            "session ended"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,quizroom=debug")),
        )
        .init();

    let bind = std::env::var("QUIZROOM_BIND").unwrap_or_else(|_| "127.0.0.1:8080".into());

    let quizzes = match std::env::var("QUIZROOM_QUIZZES") {
        Ok(path) => JsonQuizStore::from_json(&std::fs::read_to_string(&path)?)?,
        Err(_) => JsonQuizStore::from_json(SAMPLE_QUIZZES)?,
    };
    info!(quizzes = quizzes.quizzes.len(), "quizzes loaded");

    let mut config = EngineConfig::default();
    if let Ok(delay) = std::env::var("QUIZROOM_START_DELAY") {
        config.start_delay_secs = delay.parse()?;
    }

    let server = QuizroomServerBuilder::new()
        .bind(&bind)
        .engine_config(config)
        .build(DevAuth, quizzes, Arc::new(LogRecorder))
        .await?;

    info!(addr = %server.local_addr()?, "connect with ws://<addr>/ws?token=<id>:<name>");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}
