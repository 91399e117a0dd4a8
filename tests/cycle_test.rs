//! End-to-end cycles against real git repositories with a stand-in generator.

mod common;

use std::sync::Arc;

use aac::commands::{set_api_key, toggle_auto_commit};
use aac::config::{CUSTOM_PROMPT, ConfigStore, FileSettings, SecretStore, SettingValue};
use aac::error::{CycleError, GenerateError};
use aac::gemini::{GeminiClient, MessageGenerator};
use aac::git::GitCli;
use aac::orchestrator::{Approval, Approver, ChangeOrchestrator, CycleOutcome, Phase};
use common::{FixedApprover, FixedGenerator, TestRepo};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Settings in a temp directory with a key stored and auto-commit as given.
fn settings(auto_commit: bool) -> (tempfile::TempDir, Arc<FileSettings>) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let settings = FileSettings::at(dir.path());
    set_api_key(&settings, "AIza-test").unwrap();
    if auto_commit {
        assert!(toggle_auto_commit(&settings).unwrap());
    }
    (dir, Arc::new(settings))
}

fn orchestrator<G: MessageGenerator, A: Approver>(
    settings: Arc<FileSettings>,
    generator: G,
    approver: A,
) -> ChangeOrchestrator<GitCli, G, A> {
    let config: Arc<dyn ConfigStore> = settings.clone();
    let secrets: Arc<dyn SecretStore> = settings;
    ChangeOrchestrator::new(GitCli, generator, approver, config, secrets)
}

#[tokio::test]
async fn test_auto_commit_creates_commit_with_sanitized_message() {
    let repo = TestRepo::new();
    repo.stage("login.rs", "fn login() {}\n");

    let (_dir, settings) = settings(true);
    let raw = "以下がコミットメッセージです。\n```\n【add】ログイン処理を追加\n\nログイン関数を新規作成\n```";
    let orch = orchestrator(settings, FixedGenerator::answering(raw), FixedApprover::new(Approval::Decline));

    let outcome = orch.handle_change(&repo.id()).await;

    assert!(matches!(outcome, CycleOutcome::Committed(_)), "got {:?}", outcome);
    assert_eq!(repo.head_message(), "【add】ログイン処理を追加\n\nログイン関数を新規作成");
    assert_eq!(repo.commit_count(), 2);
    assert_eq!(orch.phase(&repo.id()), Phase::Idle);
}

#[tokio::test]
async fn test_prompt_contains_template_and_staged_diff_only() {
    let repo = TestRepo::new();
    repo.stage("staged.txt", "staged content\n");
    repo.write("README.md", "unstaged edit\n");

    let (_dir, settings) = settings(true);
    ConfigStore::set(
        settings.as_ref(),
        CUSTOM_PROMPT,
        SettingValue::String("MY TEMPLATE".into()),
    )
    .unwrap();
    let generator = Arc::new(FixedGenerator::answering("【add】ファイルを追加"));
    let orch = orchestrator(
        settings,
        SharedGenerator(Arc::clone(&generator)),
        FixedApprover::new(Approval::Decline),
    );

    orch.handle_change(&repo.id()).await;

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("MY TEMPLATE"));
    assert!(prompts[0].contains("+staged content"));
    assert!(!prompts[0].contains("unstaged edit"));
    drop(prompts);

    assert_eq!(repo.head_message(), "【add】ファイルを追加");
}

#[tokio::test]
async fn test_unstaged_only_does_nothing() {
    let repo = TestRepo::new();
    repo.write("README.md", "edited but not staged\n");

    let (_dir, settings) = settings(true);
    let generator = Arc::new(FixedGenerator::answering("fix: should not happen"));
    let orch = orchestrator(settings, SharedGenerator(Arc::clone(&generator)), FixedApprover::new(Approval::Approve));

    let outcome = orch.handle_change(&repo.id()).await;

    assert!(matches!(outcome, CycleOutcome::NothingStaged));
    assert_eq!(generator.calls(), 0);
    assert_eq!(repo.commit_count(), 1);
}

#[tokio::test]
async fn test_decline_leaves_changes_staged() {
    let repo = TestRepo::new();
    repo.stage("feature.txt", "feature\n");

    let (_dir, settings) = settings(false);
    let approver = Arc::new(FixedApprover::new(Approval::Decline));
    let orch = orchestrator(
        settings,
        FixedGenerator::answering("**feat: add feature file**"),
        SharedApprover(Arc::clone(&approver)),
    );

    let outcome = orch.handle_change(&repo.id()).await;

    assert!(matches!(outcome, CycleOutcome::Declined));
    assert_eq!(approver.shown.lock().unwrap().as_slice(), ["feat: add feature file"]);
    assert_eq!(repo.commit_count(), 1);

    let statuses = repo.repo.statuses(None).unwrap();
    assert!(statuses.iter().any(|s| s.status().is_index_new()));
}

#[tokio::test]
async fn test_approve_commits_everything_staged() {
    let repo = TestRepo::new();
    repo.stage("a.txt", "a\n");
    repo.stage("b.txt", "b\n");

    let (_dir, settings) = settings(false);
    let orch = orchestrator(
        settings,
        FixedGenerator::answering("feat: add a and b"),
        FixedApprover::new(Approval::Approve),
    );

    let outcome = orch.handle_change(&repo.id()).await;

    assert!(matches!(outcome, CycleOutcome::Committed(_)));
    assert_eq!(repo.head_message(), "feat: add a and b");
    let statuses = repo.repo.statuses(None).unwrap();
    assert!(statuses.is_empty(), "everything staged should be committed");
}

#[tokio::test]
async fn test_rejected_output_commits_nothing() {
    let repo = TestRepo::new();
    repo.stage("x.txt", "x\n");

    let (_dir, settings) = settings(true);
    let orch = orchestrator(
        settings,
        FixedGenerator::answering("```\n\n```"),
        FixedApprover::new(Approval::Approve),
    );

    let outcome = orch.handle_change(&repo.id()).await;

    assert!(matches!(outcome, CycleOutcome::Failed(CycleError::SanitizeRejected)));
    assert_eq!(repo.commit_count(), 1);
}

#[tokio::test]
async fn test_generation_failure_commits_nothing_and_next_cycle_runs() {
    let repo = TestRepo::new();
    repo.stage("x.txt", "x\n");

    let (_dir, settings) = settings(true);
    let failing = orchestrator(
        settings.clone(),
        FixedGenerator::failing(GenerateError::Unavailable("connection refused".into())),
        FixedApprover::new(Approval::Approve),
    );
    let outcome = failing.handle_change(&repo.id()).await;
    assert!(matches!(outcome, CycleOutcome::Failed(CycleError::GenUnavailable(_))));
    assert_eq!(repo.commit_count(), 1);

    // The latch was released: the same orchestrator accepts the next change.
    let outcome = failing.handle_change(&repo.id()).await;
    assert!(matches!(outcome, CycleOutcome::Failed(CycleError::GenUnavailable(_))));
}

#[tokio::test]
async fn test_message_with_quotes_reaches_git_verbatim() {
    let repo = TestRepo::new();
    repo.stage("q.txt", "q\n");

    let (_dir, settings) = settings(true);
    let raw = r#"fix: handle "quoted" names and C:\path\to $VAR"#;
    let orch = orchestrator(settings, FixedGenerator::answering(raw), FixedApprover::new(Approval::Approve));

    orch.handle_change(&repo.id()).await;

    assert_eq!(repo.head_message(), raw);
}

#[tokio::test]
async fn test_gemini_auth_error_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash-001:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{ "reason": "API_KEY_INVALID" }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let repo = TestRepo::new();
    repo.stage("x.txt", "x\n");

    let (_dir, settings) = settings(true);
    let client = GeminiClient::new().with_base_url(server.uri());
    let orch = orchestrator(settings, client, FixedApprover::new(Approval::Approve));

    let outcome = orch.handle_change(&repo.id()).await;

    assert!(matches!(outcome, CycleOutcome::Failed(CycleError::GenAuth(_))));
    assert!(outcome.user_message().unwrap().contains("Invalid Gemini API key"));
    assert_eq!(repo.commit_count(), 1);
}

#[tokio::test]
async fn test_gemini_success_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash-001:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "`【update】READMEを更新`\n" }] }
            }]
        })))
        .mount(&server)
        .await;

    let repo = TestRepo::new();
    repo.stage("README.md", "# updated\n");

    let (_dir, settings) = settings(true);
    let client = GeminiClient::new().with_base_url(server.uri());
    let orch = orchestrator(settings, client, FixedApprover::new(Approval::Approve));

    let outcome = orch.handle_change(&repo.id()).await;

    assert!(matches!(outcome, CycleOutcome::Committed(_)));
    assert_eq!(repo.head_message(), "【update】READMEを更新");
}

/// Lets a test keep a handle on the generator it gives away.
struct SharedGenerator(Arc<FixedGenerator>);

#[async_trait::async_trait]
impl MessageGenerator for SharedGenerator {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, GenerateError> {
        self.0.generate(api_key, prompt).await
    }
}

struct SharedApprover(Arc<FixedApprover>);

#[async_trait::async_trait]
impl Approver for SharedApprover {
    async fn confirm(
        &self,
        repo: &aac::git::RepoId,
        message: &aac::commit::CommitMessage,
    ) -> Approval {
        self.0.confirm(repo, message).await
    }
}
