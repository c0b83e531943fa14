//! The request pipeline end to end
//!
//! utterance -> IntentExtractor -> ParsedRequest -> PlanBuilder -> Plan
//! -> Dispatcher -> ExecutionResult -> message

use crate::command::{
    format_response, DirectoryResolver, Dispatcher, ExecutionResult, Plan, PlanBuilder,
};
use crate::core::config::AgentConfig;
use crate::core::error::Result;
use crate::files;
use crate::llm::context::DEFAULT_HISTORY_LIMIT;
use crate::llm::{IntentExtractor, LlmClient, ParsedRequest, UnavailableBackend};
use crate::memory::ActionLog;

/// Everything produced while handling one utterance
#[derive(Debug)]
pub struct Response {
    pub request: ParsedRequest,
    pub plan: Plan,
    pub result: ExecutionResult,
    pub message: String,
}

/// A file agent: understands requests, plans them and carries them out
pub struct Agent {
    extractor: IntentExtractor,
    planner: PlanBuilder,
    log: ActionLog,
    history_limit: usize,
}

impl Agent {
    pub fn new(extractor: IntentExtractor, planner: PlanBuilder, log: ActionLog) -> Self {
        Self {
            extractor,
            planner,
            log,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Build an agent from configuration
    ///
    /// Creates the default workspace if it is missing. Without an API key
    /// every request goes through keyword matching.
    pub fn from_config(config: &AgentConfig) -> Self {
        let extractor = match LlmClient::from_config(&config.llm) {
            Ok(client) => {
                tracing::info!(model = %client.model(), "Language backend configured");
                IntentExtractor::new(client)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Running without language backend - keyword matching only");
                IntentExtractor::new(UnavailableBackend::new(e.to_string()))
            }
        }
        .with_history_limit(config.history_limit);

        if let Err(e) = files::ensure_directory(&config.default_workspace) {
            tracing::warn!(
                error = %e,
                workspace = %config.default_workspace.display(),
                "Could not create default workspace"
            );
        }

        let planner = PlanBuilder::new(
            config.default_workspace.clone(),
            DirectoryResolver::from_config(&config.directories),
        );
        let log = ActionLog::open(&config.memory_file);

        Self {
            extractor,
            planner,
            log,
            history_limit: config.history_limit,
        }
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Understand an utterance without acting on it
    pub async fn plan(&self, utterance: &str) -> (ParsedRequest, Plan) {
        let history = self.log.recent_actions(self.history_limit);
        let request = self.extractor.extract(utterance, history).await;
        let plan = self.planner.build(&request);
        (request, plan)
    }

    /// Carry out a plan and record it
    pub fn execute(&mut self, plan: &Plan) -> Result<ExecutionResult> {
        Dispatcher::execute(&mut self.log, plan)
    }

    /// Handle one utterance end to end
    pub async fn handle(&mut self, utterance: &str) -> Result<Response> {
        let (request, plan) = self.plan(utterance).await;
        tracing::info!(intent = %request.intent, action = plan.action_name(), "Handling request");

        let result = self.execute(&plan)?;
        let message = format_response(&plan, &result);

        Ok(Response {
            request,
            plan,
            result,
            message,
        })
    }
}
