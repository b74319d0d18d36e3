//! Idea-approval workflow — the per-Principal state machine behind
//! free-text intake.
//!
//! States per submission: Idle (no record) → AwaitingApproval →
//! Approved. Submissions live in an injected keyed arena; the workflow
//! is the only writer.

use crate::content;
use pitchbot_core::{
    event::{InboundEvent, OutgoingMessage, Response},
    traits::{Planner, Transport},
};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// One idea/plan/approval cycle for a Principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaSubmission {
    pub idea: String,
    pub plan: String,
    pub approved: bool,
}

/// Keyed store of submissions, indexed by Principal id.
#[derive(Default)]
pub struct SubmissionArena {
    inner: Mutex<HashMap<String, IdeaSubmission>>,
}

impl SubmissionArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the submission for a Principal, if any.
    pub fn get(&self, principal_id: &str) -> Option<IdeaSubmission> {
        self.inner.lock().unwrap().get(principal_id).cloned()
    }

    /// Create or overwrite the submission for a Principal (last-write-wins).
    fn put(&self, principal_id: &str, submission: IdeaSubmission) {
        self.inner
            .lock()
            .unwrap()
            .insert(principal_id.to_string(), submission);
    }

    /// Whether the Principal has a submission still awaiting approval.
    fn has_pending(&self, principal_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .get(principal_id)
            .is_some_and(|s| !s.approved)
    }

    /// Flip the approval flag and return the approved pair.
    ///
    /// Returns the submission only on a false→true transition; `None`
    /// when there is nothing to approve.
    fn approve(&self, principal_id: &str) -> ApprovalOutcome {
        let mut inner = self.inner.lock().unwrap();
        match inner.get_mut(principal_id) {
            None => ApprovalOutcome::NoSubmission,
            Some(sub) if sub.approved => ApprovalOutcome::AlreadyApproved,
            Some(sub) => {
                sub.approved = true;
                ApprovalOutcome::Approved {
                    idea: sub.idea.clone(),
                    plan: sub.plan.clone(),
                }
            }
        }
    }
}

enum ApprovalOutcome {
    NoSubmission,
    AlreadyApproved,
    Approved { idea: String, plan: String },
}

/// The idea → plan → approval → forward workflow.
pub struct Workflow {
    planner: Arc<dyn Planner>,
    transport: Arc<dyn Transport>,
    arena: SubmissionArena,
    reviewer_chat_id: String,
    max_tokens: u32,
    temperature: f32,
    approval: Regex,
}

impl Workflow {
    pub fn new(
        planner: Arc<dyn Planner>,
        transport: Arc<dyn Transport>,
        arena: SubmissionArena,
        reviewer_chat_id: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            planner,
            transport,
            arena,
            reviewer_chat_id,
            max_tokens,
            temperature,
            // Word-boundary match, case-insensitive: "Approve", "I approve".
            approval: Regex::new(r"(?i)\bapprove\b").expect("approval regex is valid"),
        }
    }

    /// Snapshot accessor for status reporting and tests.
    pub fn submission(&self, principal_id: &str) -> Option<IdeaSubmission> {
        self.arena.get(principal_id)
    }

    /// Route a free-text message into the state machine.
    pub async fn handle_text(&self, event: &InboundEvent) -> Response {
        let Some(body) = event.text().map(str::trim).filter(|b| !b.is_empty()) else {
            return Response::empty();
        };

        if self.approval.is_match(body) {
            return self.approve(event).await;
        }

        // While a submission is pending, a one-word message reads as a
        // reply to the approval question, not a new idea.
        if self.arena.has_pending(&event.principal.id) && body.split_whitespace().count() == 1 {
            return content::approval_reminder();
        }

        self.submit(event, body).await
    }

    /// Idle/AwaitingApproval --submit--> AwaitingApproval.
    ///
    /// Generator call and state write are atomic as a unit: on failure
    /// nothing is committed and the state is unchanged.
    async fn submit(&self, event: &InboundEvent, idea: &str) -> Response {
        let prompt = format!("Create a simple business plan for this product idea: {idea}");

        let plan = match self
            .planner
            .generate(&prompt, self.max_tokens, self.temperature)
            .await
        {
            Ok(plan) => plan,
            Err(e) => {
                warn!(
                    "plan generation failed for principal {}: {e}",
                    event.principal.id
                );
                return content::generation_failed();
            }
        };

        self.arena.put(
            &event.principal.id,
            IdeaSubmission {
                idea: idea.to_string(),
                plan: plan.clone(),
                approved: false,
            },
        );

        info!(
            "submission recorded for principal {} (awaiting approval)",
            event.principal.id
        );
        content::plan_reply(idea, &plan)
    }

    /// AwaitingApproval --approve--> Approved, then forward to the
    /// reviewer chat. Approval is final even if forwarding fails.
    async fn approve(&self, event: &InboundEvent) -> Response {
        let (idea, plan) = match self.arena.approve(&event.principal.id) {
            ApprovalOutcome::NoSubmission => return content::submit_first(),
            ApprovalOutcome::AlreadyApproved => return content::already_approved(),
            ApprovalOutcome::Approved { idea, plan } => (idea, plan),
        };

        let forward = OutgoingMessage {
            chat_id: self.reviewer_chat_id.clone(),
            text: content::reviewer_payload(&idea, &plan),
            keyboard: Vec::new(),
        };

        match self.transport.send(forward).await {
            Ok(()) => {
                info!(
                    "approved idea from principal {} forwarded to reviewer",
                    event.principal.id
                );
                content::approval_confirmed()
            }
            Err(e) => {
                error!(
                    "reviewer forward failed for principal {}: {e}",
                    event.principal.id
                );
                content::forward_failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{text_event, MockPlanner, MockTransport};

    fn workflow(planner: MockPlanner, transport: Arc<MockTransport>) -> Workflow {
        Workflow::new(
            Arc::new(planner),
            transport,
            SubmissionArena::new(),
            "4242".into(),
            200,
            0.7,
        )
    }

    #[tokio::test]
    async fn test_submit_creates_unapproved_submission_with_plan() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("Step 1: build it"), transport);

        let response = wf.handle_text(&text_event("42", "an AI fridge")).await;

        let sub = wf.submission("42").unwrap();
        assert_eq!(sub.idea, "an AI fridge");
        assert_eq!(sub.plan, "Step 1: build it");
        assert!(!sub.approved);
        assert!(!sub.plan.is_empty());
        assert!(response.text.contains("an AI fridge"));
        assert!(response.text.contains("Step 1: build it"));
    }

    #[tokio::test]
    async fn test_submit_feeds_idea_into_planner_prompt() {
        let transport = Arc::new(MockTransport::default());
        let planner = Arc::new(MockPlanner::with_plan("plan"));
        let wf = Workflow::new(
            planner.clone(),
            transport,
            SubmissionArena::new(),
            "4242".into(),
            200,
            0.7,
        );

        wf.handle_text(&text_event("42", "an AI fridge")).await;

        let prompts = planner.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Create a simple business plan"));
        assert!(prompts[0].contains("an AI fridge"));
    }

    #[tokio::test]
    async fn test_generation_failure_commits_nothing() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::default(), transport);

        let response = wf.handle_text(&text_event("42", "an AI fridge")).await;

        assert!(wf.submission("42").is_none());
        assert!(response.text.contains("couldn't generate"));
    }

    #[tokio::test]
    async fn test_approve_without_submission_prompts_and_keeps_state() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("plan"), transport.clone());

        let response = wf.handle_text(&text_event("42", "approve")).await;

        assert_eq!(response, content::submit_first());
        assert!(wf.submission("42").is_none());
        assert!(transport.sent.lock().unwrap().is_empty());

        // Still stable on repeat.
        let again = wf.handle_text(&text_event("42", "APPROVE")).await;
        assert_eq!(again, content::submit_first());
    }

    #[tokio::test]
    async fn test_approve_forwards_pair_to_reviewer() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("Step 1: build it"), transport.clone());

        wf.handle_text(&text_event("42", "an AI fridge")).await;
        let response = wf.handle_text(&text_event("42", "I Approve!")).await;

        assert!(wf.submission("42").unwrap().approved);
        assert_eq!(response, content::approval_confirmed());

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, "4242");
        assert!(sent[0].text.contains("an AI fridge"));
        assert!(sent[0].text.contains("Step 1: build it"));
    }

    #[tokio::test]
    async fn test_resubmission_overwrites_and_forwards_latest_only() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("the plan"), transport.clone());

        wf.handle_text(&text_event("42", "first idea")).await;
        wf.handle_text(&text_event("42", "second better idea")).await;
        wf.handle_text(&text_event("42", "approve")).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("second better idea"));
        assert!(!sent[0].text.contains("first idea"));
    }

    #[tokio::test]
    async fn test_single_word_reply_while_pending_gets_reminder() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("the plan"), transport.clone());

        wf.handle_text(&text_event("42", "an AI fridge")).await;
        let response = wf.handle_text(&text_event("42", "nope")).await;

        assert_eq!(response, content::approval_reminder());
        let sub = wf.submission("42").unwrap();
        assert_eq!(sub.idea, "an AI fridge");
        assert!(!sub.approved);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forward_failure_keeps_approval_final() {
        let transport = Arc::new(MockTransport::failing());
        let wf = workflow(MockPlanner::with_plan("the plan"), transport);

        wf.handle_text(&text_event("42", "an AI fridge")).await;
        let response = wf.handle_text(&text_event("42", "approve")).await;

        assert_eq!(response, content::forward_failed());
        assert!(wf.submission("42").unwrap().approved);
    }

    #[tokio::test]
    async fn test_approve_twice_flips_flag_once() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("the plan"), transport.clone());

        wf.handle_text(&text_event("42", "an AI fridge")).await;
        wf.handle_text(&text_event("42", "approve")).await;
        let response = wf.handle_text(&text_event("42", "approve")).await;

        assert_eq!(response, content::already_approved());
        // Reviewer got exactly one forward.
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_new_idea_after_approval_starts_fresh_cycle() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("the plan"), transport.clone());

        wf.handle_text(&text_event("42", "first idea")).await;
        wf.handle_text(&text_event("42", "approve")).await;
        wf.handle_text(&text_event("42", "a brand new idea")).await;

        let sub = wf.submission("42").unwrap();
        assert_eq!(sub.idea, "a brand new idea");
        assert!(!sub.approved);
    }

    #[tokio::test]
    async fn test_submissions_are_per_principal() {
        let transport = Arc::new(MockTransport::default());
        let wf = workflow(MockPlanner::with_plan("the plan"), transport);

        wf.handle_text(&text_event("1", "idea from one")).await;
        wf.handle_text(&text_event("2", "idea from two")).await;

        assert_eq!(wf.submission("1").unwrap().idea, "idea from one");
        assert_eq!(wf.submission("2").unwrap().idea, "idea from two");
    }
}
