//! Dog and cat agents

use super::{failure, AgentHandler};
use crate::error::Result;
use crate::types::{AgentRequest, AgentResponse, AgentType};
use agentic_tools::AnimalApi;
use async_trait::async_trait;
use std::sync::Arc;

/// Random dog picture
pub struct DogAgent {
    animals: Arc<dyn AnimalApi>,
}

impl DogAgent {
    /// Create the agent
    #[must_use]
    pub fn new(animals: Arc<dyn AnimalApi>) -> Self {
        Self { animals }
    }
}

#[async_trait]
impl AgentHandler for DogAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Dog
    }

    async fn handle(&self, _request: &AgentRequest) -> Result<AgentResponse> {
        Ok(match self.animals.random_dog_image().await {
            Ok(url) => AgentResponse::text("Here is a dog for you!")
                .with_metadata("image_url", url.clone())
                .with_url(url),
            Err(e) => failure(&e.into()),
        })
    }
}

/// Random cat picture with a cat fact
pub struct CatAgent {
    animals: Arc<dyn AnimalApi>,
}

impl CatAgent {
    /// Create the agent
    #[must_use]
    pub fn new(animals: Arc<dyn AnimalApi>) -> Self {
        Self { animals }
    }
}

#[async_trait]
impl AgentHandler for CatAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Cat
    }

    async fn handle(&self, _request: &AgentRequest) -> Result<AgentResponse> {
        let url = match self.animals.random_cat_image().await {
            Ok(url) => url,
            Err(e) => return Ok(failure(&e.into())),
        };
        // The picture alone is still an answer
        let response = match self.animals.random_cat_fact().await {
            Ok(fact) => format!("Here is a cat for you! Did you know? {fact}"),
            Err(_) => "Here is a cat for you!".to_string(),
        };

        Ok(AgentResponse::text(response)
            .with_metadata("image_url", url.clone())
            .with_url(url))
    }
}
