//! Run orchestrator
//!
//! [`BugInjector`] holds the parser, renderer, rule set and limits. Each call
//! to [`BugInjector::inject`] is one run with its own policy, tracker and
//! log; the injector itself is immutable and can be shared across threads.

use bugsmith_syntax::{PythonParser, PythonRenderer, SourceParser, SourceRenderer};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::api::{ErrorResponse, MutationRequest, MutationResponse, MutationResult};
use crate::config::EngineConfig;
use crate::error::InjectError;
use crate::policy::{ChaosLevel, ChaosPolicy, Entropy, MAX_LEVEL};
use crate::rules::{MutationContext, RuleSet};
use crate::walker::TreeWalker;

/// Name written into the metadata header
pub const GENERATOR_NAME: &str = "bugsmith";

/// Parses, mutates and re-renders Python source
#[derive(Debug)]
pub struct BugInjector<P = PythonParser, R = PythonRenderer> {
    parser: P,
    renderer: R,
    rules: RuleSet,
    config: EngineConfig,
}

impl BugInjector {
    /// Create injector with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create injector with `config`
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let parser = PythonParser::new().with_max_depth(config.max_nesting_depth);
        Self::from_parts(parser, PythonRenderer::new(), config)
    }
}

impl Default for BugInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SourceParser, R: SourceRenderer> BugInjector<P, R> {
    /// Create injector from explicit collaborators
    pub fn from_parts(parser: P, renderer: R, config: EngineConfig) -> Self {
        Self {
            parser,
            renderer,
            rules: RuleSet::standard(),
            config,
        }
    }

    /// With a custom rule set
    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get parser
    #[inline]
    #[must_use]
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Get rule set
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run once, drawing decisions from `entropy`
    ///
    /// # Errors
    /// - [`InjectError::InvalidConfiguration`] for a level outside 1..=10
    ///   (checked before anything else)
    /// - [`InjectError::EmptyInput`] for empty or whitespace-only source
    /// - [`InjectError::SourceTooLarge`] above `max_source_bytes`
    /// - [`InjectError::InvalidSyntax`] if the source does not parse
    /// - [`InjectError::UnsupportedSyntax`] for valid Python the tree cannot
    ///   represent
    /// - [`InjectError::SourceTooComplex`] past the parser's nesting limit
    /// - [`InjectError::InternalConsistency`] if the mutant does not re-parse
    pub fn inject(
        &self,
        source: &str,
        level: i64,
        entropy: &mut dyn Entropy,
    ) -> Result<MutationResult, InjectError> {
        let level = ChaosLevel::new(level)?;
        self.config.validate()?;

        if source.trim().is_empty() {
            return Err(InjectError::EmptyInput);
        }
        if source.len() > self.config.max_source_bytes {
            return Err(InjectError::SourceTooLarge {
                size: source.len(),
                limit: self.config.max_source_bytes,
            });
        }

        let module = self.parser.parse(source)?;

        let mut cx = MutationContext::new(ChaosPolicy::new(level, entropy));
        let module = TreeWalker::new(&self.rules).walk(module, &mut cx);
        let bug_log = cx.into_log();

        let body = self.renderer.render(&module);
        let mutated_text = if self.config.include_header {
            let mut text = header(level, bug_log.len());
            text.push_str(&body);
            text
        } else {
            body
        };

        if let Err(e) = self.parser.check(&mutated_text) {
            tracing::error!("Mutated program failed to re-parse: {}", e);
            return Err(InjectError::InternalConsistency(e.to_string()));
        }

        tracing::info!(
            "Injected {} bugs at chaos level {} ({} bytes in, {} bytes out)",
            bug_log.len(),
            level,
            source.len(),
            mutated_text.len()
        );

        Ok(MutationResult {
            mutated_text,
            bug_log,
            chaos_level: level,
        })
    }

    /// Run once with a `StdRng` seeded from `seed`
    ///
    /// # Errors
    /// Same as [`BugInjector::inject`]
    pub fn inject_seeded(
        &self,
        source: &str,
        level: i64,
        seed: u64,
    ) -> Result<MutationResult, InjectError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.inject(source, level, &mut rng)
    }

    /// Serve a wire request
    ///
    /// # Errors
    /// Returns the [`ErrorResponse`] of the failed run
    pub fn handle(
        &self,
        request: &MutationRequest,
        entropy: &mut dyn Entropy,
    ) -> Result<MutationResponse, ErrorResponse> {
        self.inject(&request.source_text, request.chaos_level, entropy)
            .map(MutationResponse::from)
            .map_err(|e| {
                tracing::warn!("Injection request rejected: {}", e);
                ErrorResponse::from(e)
            })
    }
}

/// Metadata docstring placed above the mutated program
#[must_use]
pub fn header(level: ChaosLevel, bug_count: usize) -> String {
    format!(
        "\"\"\"\n\
         🐛 DELIBERATELY BUGGED CODE 🐛\n\
         Chaos Level: {}/{}\n\
         Bugs Injected: {}\n\
         Generated by: {}\n\
         \n\
         ⚠️  WARNING: This code has been intentionally modified for educational/entertainment purposes.\n\
         ⚠️  Do not use in production unless you enjoy living dangerously.\n\
         \"\"\"\n\
         \n",
        level, MAX_LEVEL, bug_count, GENERATOR_NAME
    )
}
