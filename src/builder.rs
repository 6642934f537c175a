//! Builder for configuring a [`ThreadPoolMetrics`] binder.
//!
//! The builder supports multiple configuration sources using figment:
//! - Default values
//! - Config files (TOML, YAML, JSON)
//! - Environment variables
//! - Programmatic overrides
//! - CLI arguments via clap

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;

use crate::binder::ThreadPoolMetrics;
use crate::config::ThreadPoolMetricsConfig;
use crate::error::Result;
use crate::pool::ThreadPool;
use crate::tags::Tag;

/// Builder for a [`ThreadPoolMetrics`] binder.
///
/// Configuration sources are merged in the following order (later sources override earlier):
/// 1. Default values
/// 2. Config files (in order added)
/// 3. Environment variables
/// 4. Programmatic overrides
/// 5. CLI arguments
///
/// Tags from different sources are unioned; a later source replaces the value
/// of a key it also sets.
///
/// # Examples
///
/// ```ignore
/// use threadpool_metrics::{MeterBinder, ThreadPoolMetricsBuilder};
///
/// let metrics = ThreadPoolMetricsBuilder::new()
///     .file("metrics.toml")
///     .env_prefix("POOL_METRICS")
///     .tag("pool", "server")
///     .build(&pool)?;
/// metrics.bind_to(&registry)?;
/// ```
#[derive(Debug)]
pub struct ThreadPoolMetricsBuilder {
    figment: Figment,
}

impl Default for ThreadPoolMetricsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadPoolMetricsBuilder {
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(ThreadPoolMetricsConfig::default())),
        }
    }

    /// Add a configuration file.
    ///
    /// Format is detected by extension; unknown extensions are read as TOML.
    /// Missing files are skipped.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        self.figment = match extension.to_lowercase().as_str() {
            "yaml" | "yml" => self.figment.merge(Yaml::file(path)),
            "json" => self.figment.merge(Json::file(path)),
            _ => self.figment.merge(Toml::file(path)),
        };
        self
    }

    /// Add environment variables with a prefix.
    ///
    /// Nested keys are separated by a double underscore, e.g.
    /// `{PREFIX}_STRONG_REFERENCE=true` and `{PREFIX}_TAGS__POOL=server`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.figment = self
            .figment
            .merge(Env::prefixed(&format!("{}_", prefix)).split("__"));
        self
    }

    /// Add a tag.
    pub fn tag(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.merge_tags(std::iter::once(Tag::new(key, value)))
    }

    /// Keep the pool alive from its gauges.
    pub fn strong_reference(mut self, strong: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("strong_reference", strong));
        self
    }

    /// Apply CLI argument overrides.
    pub fn with_cli_args(mut self, args: &MetricsArgs) -> Self {
        if !args.pool_metrics_tag.is_empty() {
            self = self.merge_tags(args.pool_metrics_tag.iter().cloned());
        }
        if args.pool_metrics_strong_reference {
            self = self.strong_reference(true);
        }
        self
    }

    fn merge_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        let tags: BTreeMap<String, String> = tags.into_iter().map(|t| (t.key, t.value)).collect();
        self.figment = self.figment.merge(Serialized::default("tags", tags));
        self
    }

    /// Extract the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed into
    /// [`ThreadPoolMetricsConfig`].
    pub fn extract(&self) -> Result<ThreadPoolMetricsConfig> {
        let config: ThreadPoolMetricsConfig = self.figment.extract().map_err(Box::new)?;
        Ok(config)
    }

    /// Build a binder for `pool`.
    pub fn build<P: ThreadPool + 'static>(self, pool: &Arc<P>) -> Result<ThreadPoolMetrics> {
        let config = self.extract()?;
        Ok(ThreadPoolMetrics::new(pool, config.tag_set()).strong_reference(config.strong_reference))
    }
}

fn parse_tag(s: &str) -> std::result::Result<Tag, String> {
    s.parse::<Tag>().map_err(|e| e.to_string())
}

/// CLI arguments for thread-pool metrics.
///
/// Use with clap's `Parser` derive macro:
///
/// ```ignore
/// use clap::Parser;
/// use threadpool_metrics::{MetricsArgs, ThreadPoolMetricsBuilder};
///
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     metrics: MetricsArgs,
/// }
///
/// let args = MyArgs::parse();
/// let metrics = ThreadPoolMetricsBuilder::new()
///     .with_cli_args(&args.metrics)
///     .build(&pool)?;
/// ```
#[derive(Debug, Default, Clone, clap::Args)]
pub struct MetricsArgs {
    /// Tag attached to every pool gauge (repeatable)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_tag)]
    pub pool_metrics_tag: Vec<Tag>,

    /// Keep the pool alive from its gauges
    #[arg(long)]
    pub pool_metrics_strong_reference: bool,
}
