//! Post pipeline: validate, research, generate, deliver.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::ai::{AIProvider, ImageProvider, OpenAIProvider};
use crate::config::ServiceConfig;
use crate::error::{PosterError, PosterResult};
use crate::generate::{analyze, EngagementAnalysis, GeneratedPost, ImageGenerator, PostWriter, PromptManager};
use crate::publish::{DeliveryReceipt, Mailer, Publisher, SmtpMailer};
use crate::request::{validate, DeliveryMethod, PostRequest};
use crate::research::{HttpFetcher, ModelWebSearcher, PageFetcher, ResearchResult, Researcher};

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub method: DeliveryMethod,
    pub receipt: DeliveryReceipt,
    pub post: GeneratedPost,
    pub analysis: EngagementAnalysis,
    pub research: ResearchResult,
}

/// Runs requests end to end. Holds only immutable configuration and pooled
/// clients, so one instance serves concurrent requests.
pub struct Pipeline {
    config: ServiceConfig,
    http: reqwest::Client,
    fetcher: Arc<dyn PageFetcher>,
    mailer: Arc<dyn Mailer>,
    prompts: Arc<PromptManager>,
}

impl Pipeline {
    /// Create a pipeline with explicit research and mail backends.
    pub fn new(
        config: ServiceConfig,
        fetcher: Arc<dyn PageFetcher>,
        mailer: Arc<dyn Mailer>,
    ) -> PosterResult<Self> {
        let prompts = PromptManager::new()
            .map_err(|e| PosterError::Internal(format!("failed to load prompt templates: {e}")))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PosterError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            fetcher,
            mailer,
            prompts: Arc::new(prompts),
        })
    }

    /// Create a pipeline with the production fetcher and SMTP mailer.
    pub fn with_defaults(config: ServiceConfig) -> PosterResult<Self> {
        let fetcher = HttpFetcher::new(config.research.timeout)
            .map_err(|e| PosterError::Internal(format!("failed to build page fetcher: {e}")))?;
        let mailer = SmtpMailer::new(config.smtp.clone());
        Self::new(config, Arc::new(fetcher), Arc::new(mailer))
    }

    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validate a raw body and run it.
    pub async fn handle(&self, body: &Value) -> PosterResult<PipelineOutcome> {
        let request = validate(body)?;
        self.run(request).await
    }

    /// Run a validated request within the request timeout.
    ///
    /// The deadline covers research, generation and delivery together. If it
    /// passes during delivery, the generated text is still returned.
    pub async fn run(&self, request: PostRequest) -> PosterResult<PipelineOutcome> {
        let started = Instant::now();
        let budget = self.config.server.request_timeout;
        let deadline = started + budget;
        let method = request.delivery.method();

        tracing::info!(
            topic = %request.topic,
            links = request.links.len(),
            generate_image = request.generate_image,
            delivery = %method,
            "Starting post pipeline"
        );

        let (post, analysis, research) = timeout_at(deadline, self.compose(&request))
            .await
            .map_err(|_| timed_out(budget, None))??;

        let publisher = Publisher::new(self.http.clone(), self.config.linkedin.clone(), self.mailer.clone());
        let receipt = timeout_at(
            deadline,
            publisher.deliver(&request.delivery, &request.topic, &post, &analysis),
        )
        .await
        .map_err(|_| timed_out(budget, Some(post.body.clone())))?
        .map_err(|source| {
            tracing::error!(error = %source, "Delivery failed");
            PosterError::Delivery {
                source,
                post_content: Some(post.body.clone()),
            }
        })?;

        tracing::info!(
            delivery = %method,
            chars = post.body.chars().count(),
            has_image = post.image.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Post pipeline complete"
        );

        Ok(PipelineOutcome {
            method,
            receipt,
            post,
            analysis,
            research,
        })
    }

    /// Research, write, illustrate and score the post.
    async fn compose(
        &self,
        request: &PostRequest,
    ) -> PosterResult<(GeneratedPost, EngagementAnalysis, ResearchResult)> {
        let openai = Arc::new(
            OpenAIProvider::new(request.openai_api_key.as_str())
                .with_base_url(self.config.openai.api_base.as_str())
                .with_client(self.http.clone())
                .with_timeout(self.config.openai.timeout),
        );
        let text_provider: Arc<dyn AIProvider> = openai.clone();
        let image_provider: Arc<dyn ImageProvider> = openai;

        // Research
        let mut researcher = Researcher::new(self.fetcher.clone(), self.config.research.clone());
        if self.config.research.web_search {
            researcher = researcher.with_searcher(Arc::new(ModelWebSearcher::new(
                text_provider.clone(),
                self.config.openai.search_model.as_str(),
            )));
        }
        let research = researcher.research(&request.topic, &request.links).await;
        tracing::info!(
            sources = research.sources.len(),
            failures = research.failures.len(),
            "Research complete"
        );

        // Generation
        let max_length = self.config.post.clamp_length(request.max_length);
        if max_length != request.max_length {
            tracing::debug!(requested = request.max_length, max_length, "Clamped post length");
        }

        let writer = PostWriter::new(
            text_provider,
            self.prompts.clone(),
            self.config.openai.clone(),
            self.config.post.clone(),
        );
        let body = writer.write(&request.topic, &research, max_length).await?;

        let image = if request.generate_image {
            ImageGenerator::new(
                image_provider,
                self.http.clone(),
                self.prompts.clone(),
                self.config.openai.clone(),
                self.config.post.clone(),
            )
            .generate(&request.topic, &body)
            .await
        } else {
            None
        };

        let post = GeneratedPost { body, image };
        let analysis = analyze(&post.body, self.config.post.max_hashtags);
        tracing::debug!(score = analysis.engagement_score, "Engagement analysed");

        Ok((post, analysis, research))
    }
}

fn timed_out(budget: Duration, post_content: Option<String>) -> PosterError {
    tracing::error!(
        timeout_ms = budget.as_millis() as u64,
        generated = post_content.is_some(),
        "Request timed out"
    );
    PosterError::TimedOut {
        budget,
        post_content,
    }
}
