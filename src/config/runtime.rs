// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::BackendFactory;
use crate::config::Config;
use crate::errors::PipelineError;
use crate::pipeline::ProfilePipeline;

/// Profiling runtime builder - wires the backend cascade, dispatcher and
/// error handler settings from configuration.
///
/// The builder does not validate; pair it with
/// [`load_and_validate_config`](crate::config::load_and_validate_config) or
/// call [`Config::validate`] first.
///
/// # Examples
///
/// ```
/// use the_layercake::config::{BackendConfig, Config, RuntimeBuilder};
///
/// let mut config = Config::default();
/// config.cascade.backends = vec![BackendConfig::Fixed {
///     name: "offline".into(),
///     response: "{}".into(),
/// }];
/// config.dispatcher.max_concurrent = Some(4);
///
/// let pipeline = RuntimeBuilder::from_config(&config).unwrap();
/// assert_eq!(pipeline.cascade().backend_names(), vec!["offline"]);
/// assert_eq!(pipeline.dispatcher_options().max_concurrent, Some(4));
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a ready-to-run [`ProfilePipeline`].
    ///
    /// Fails only when a backend cannot be constructed, e.g. an HTTP client
    /// that cannot be initialised.
    pub fn from_config(cfg: &Config) -> Result<ProfilePipeline, PipelineError> {
        let cascade = BackendFactory::create_cascade(&cfg.cascade)?;
        Ok(ProfilePipeline::new(cascade, cfg.pipeline.clone())
            .with_dispatcher_options(cfg.dispatcher.clone())
            .with_error_handler_options(cfg.error_handler.clone()))
    }
}
