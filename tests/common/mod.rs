//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;

use aac::commit::CommitMessage;
use aac::error::GenerateError;
use aac::gemini::MessageGenerator;
use aac::git::RepoId;
use aac::orchestrator::{Approval, Approver};
use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

/// A test git repository with one initial commit and an identity configured
/// for the system `git` binary.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
            config
                .set_bool("commit.gpgsign", false)
                .expect("Failed to disable signing");
        }
        let test_repo = Self { dir, repo };
        test_repo.commit_file("README.md", "# test\n", "init");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn id(&self) -> RepoId {
        RepoId::new(self.path())
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write, stage and commit one file. Returns the commit OID.
    pub fn commit_file(&self, name: &str, content: &str, message: &str) -> Oid {
        self.stage(name, content);

        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let sig = self.signature();

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Write a file and add it to the index.
    pub fn stage(&self, name: &str, content: &str) {
        self.write(name, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Write a file without staging it.
    pub fn write(&self, name: &str, content: &str) {
        std::fs::write(self.path().join(name), content).expect("Failed to write file");
    }

    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .expect("No HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit")
            .message()
            .expect("Message is not UTF-8")
            .trim_end()
            .to_string()
    }

    pub fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        walk.push_head().expect("Failed to push HEAD");
        walk.count()
    }
}

/// Generator returning a fixed answer and recording the prompts it saw.
pub struct FixedGenerator {
    answer: Result<String, GenerateError>,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedGenerator {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: GenerateError) -> Self {
        Self {
            answer: Err(err),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageGenerator for FixedGenerator {
    async fn generate(&self, _api_key: &str, prompt: &str) -> Result<String, GenerateError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer.clone()
    }
}

/// Approver with a fixed answer that records the messages it was shown.
pub struct FixedApprover {
    answer: Approval,
    pub shown: Mutex<Vec<String>>,
}

impl FixedApprover {
    pub fn new(answer: Approval) -> Self {
        Self {
            answer,
            shown: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Approver for FixedApprover {
    async fn confirm(&self, _repo: &RepoId, message: &CommitMessage) -> Approval {
        self.shown.lock().unwrap().push(message.as_str().to_string());
        self.answer
    }
}
