use crate::error::ConfigError;
use crate::pipeline::{Task, WritePipeline};
use async_trait::async_trait;
use shortline_cache::BloomFilter;
use shortline_core::{Repository, ShortCode, ShortenParams, Shortener, ShortenerError};
use shortline_generator::Generator;
use std::sync::Arc;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Tuning for [`ShortenerService`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ShortenerConfig {
    /// How many freshly generated codes may collide with stored ones before
    /// a request fails with [`ShortenerError::CollisionExhausted`].
    #[builder(default = 3)]
    pub max_attempts: usize,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ShortenerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts(self.max_attempts));
        }
        Ok(())
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service coordinates a `Generator`, the Bloom filter, a `Repository`
/// and the [`WritePipeline`]:
/// - a code the filter has never seen is accepted straight away
/// - a filter hit is confirmed against the repository and regenerated on a
///   real collision, up to `max_attempts` times
/// - the accepted mapping is queued for the pipeline under the request deadline
///
/// Lookups read the repository directly.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    filter: Arc<BloomFilter>,
    pipeline: Arc<WritePipeline>,
    config: ShortenerConfig,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            filter: Arc::clone(&self.filter),
            pipeline: Arc::clone(&self.pipeline),
            config: self.config,
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService`.
    ///
    /// `pipeline` must have been spawned with the same repository and filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroAttempts`] if `config.max_attempts` is zero.
    pub fn new(
        repository: Arc<R>,
        generator: G,
        filter: Arc<BloomFilter>,
        pipeline: Arc<WritePipeline>,
        config: ShortenerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            repository,
            generator: Arc::new(generator),
            filter,
            pipeline,
            config,
        })
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn pipeline(&self) -> &WritePipeline {
        &self.pipeline
    }

    /// Stops accepting new codes and waits for queued writes to land.
    pub async fn shutdown(&self) {
        self.pipeline.shutdown().await;
    }

    /// Validates that the URL has a valid format (has a scheme and host).
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        };
        if scheme.is_empty() || rest.is_empty() || rest.starts_with('/') {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {}",
                url
            )));
        }

        let scheme = scheme.to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                scheme
            )));
        }

        Ok(())
    }

    /// Generates a code nobody holds yet.
    ///
    /// The filter is consulted first; only a filter hit costs a repository
    /// lookup.
    async fn allocate_code(&self) -> Result<ShortCode, ShortenerError> {
        for attempt in 1..=self.config.max_attempts {
            let code: ShortCode = self
                .generator
                .generate()
                .map_err(|e| ShortenerError::Generator(e.to_string()))?
                .into();

            if !self.filter.might_contain(code.as_str()) {
                return Ok(code);
            }

            if !self.repository.exists(&code).await? {
                debug!(code = %code, attempt, "bloom filter false positive");
                return Ok(code);
            }

            warn!(code = %code, attempt, "generated short code already taken, regenerating");
        }

        warn!(
            attempts = self.config.max_attempts,
            "giving up on short code generation"
        );
        Err(ShortenerError::CollisionExhausted {
            attempts: self.config.max_attempts,
        })
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn shorten(&self, params: ShortenParams) -> Result<ShortCode, ShortenerError> {
        Self::validate_url(&params.original_url)?;

        let code = self.allocate_code().await?;

        let task = Task {
            code: code.clone(),
            target: params.original_url,
        };
        self.pipeline.submit(task, params.deadline).await?;

        debug!(code = %code, "short code issued");
        Ok(code)
    }

    async fn resolve(&self, code: &ShortCode) -> Result<String, ShortenerError> {
        match self.repository.get(code).await? {
            Some(target) => {
                debug!(code = %code, url = %target, "resolved short code");
                Ok(target)
            }
            None => {
                debug!(code = %code, "short code not found");
                Err(ShortenerError::NotFound(code.to_string()))
            }
        }
    }
}
