//! Calendar agent

use super::{failure, AgentHandler};
use crate::calendar::CalendarService;
use crate::error::Result;
use crate::types::{AgentRequest, AgentResponse, AgentType};
use async_trait::async_trait;
use tracing::warn;

/// Calendar add / delete / edit / check
///
/// Backend and model failures become an error response; they never reach
/// the orchestrator as errors.
pub struct CalendarAgent {
    service: CalendarService,
}

impl CalendarAgent {
    /// Create the agent
    #[must_use]
    pub fn new(service: CalendarService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AgentHandler for CalendarAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Calendar
    }

    async fn handle(&self, request: &AgentRequest) -> Result<AgentResponse> {
        match self
            .service
            .handle(&request.query, &request.english_query, &request.token)
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(uid = %request.uid, error = %e, "Calendar request failed");
                Ok(failure(&e))
            }
        }
    }
}
