use anyhow::Result;
use clap::Parser;
use interview_engine::{
    EngineConfig, MemoryDraftStore, MemoryInteractionRecorder, MemoryQuestionProvider,
    MemorySessionStore, ScriptedSpeechBackend, SessionController, SessionProfile, SpeechEvent,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "interview-engine", about = "Run a scripted mock-interview session")]
struct Args {
    /// Target role for the session
    #[arg(long, default_value = "Software Engineer")]
    role: String,

    /// Session type
    #[arg(long, default_value = "Technical")]
    session_type: String,

    /// Number of questions
    #[arg(long, default_value_t = 3)]
    questions: u32,

    /// Optional config file (TOML/YAML/JSON, via the config crate)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = EngineConfig::load(args.config.as_deref())?;

    info!("Interview engine demo");

    let profile = SessionProfile {
        role: args.role,
        session_type: args.session_type,
        max_questions: args.questions,
        ..Default::default()
    };
    let session = profile.into_session("demo-user");
    let session_id = session.id.clone();

    let store = Arc::new(MemorySessionStore::new());
    store.insert(session.clone()).await;

    let questions = Arc::new(MemoryQuestionProvider::new(vec![
        "Tell me about yourself.".to_string(),
        "Describe a technical challenge you solved recently.".to_string(),
        "Where do you want to grow over the next two years?".to_string(),
    ]));
    let recorder = Arc::new(MemoryInteractionRecorder::new());
    let drafts = Arc::new(MemoryDraftStore::new());

    let mut backend = ScriptedSpeechBackend::supported();
    for take in [
        "I have five years of backend experience.",
        "I led the migration of our billing service to an event-driven design.",
        "I want to move toward staff-level systems work.",
    ] {
        backend.push_script(vec![
            SpeechEvent::Interim(take.split_whitespace().next().unwrap_or("").to_string()),
            SpeechEvent::Final(take.to_string()),
            SpeechEvent::End,
        ]);
    }

    let controller = SessionController::new(
        session,
        store,
        questions,
        recorder,
        drafts,
        Box::new(backend),
        &config,
    );

    controller.start().await?;

    while let Some(question) = controller.current_question_text().await {
        info!("Q{}: {}", controller.current_question_number().await.unwrap_or(0), question);

        controller.start_capture().await?;
        // Let the scripted events drain
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        controller.stop_capture().await?;

        let interaction = controller.submit_answer().await?;
        info!("A{}: {}", interaction.order, interaction.answer_text);
    }

    let report = controller.report().await?;
    info!(
        "Session {} complete: {} answered, {} skipped, score {}",
        session_id, report.questions_answered, report.questions_skipped, report.final_score
    );

    Ok(())
}
