//! Library errors, following `lib_tsalign/src/error.rs`'s
//! `#[derive(Debug, Error)]` pattern. Configuration errors are surfaced as
//! `Result`s rather than calling `process::exit` directly — the CLI binary
//! is the boundary that maps them to process exit codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A driver (`IteratedSync`/`AnytimeBeauty`) was configured with no
    /// child engine configuration to run.
    #[error("driver has no engine_configs to run")]
    EmptyEngineConfigs,

    /// A lazily-revalidated evaluator was configured without caching, which
    /// makes lazy revalidation meaningless.
    #[error("evaluator is marked lazy but does not cache its estimates")]
    LazyEvaluatorNotCaching,

    /// `AnytimeBeauty` ran past its configured `max_iter` without
    /// terminating.
    #[error("iteration {iter} exceeds max_iter {max_iter}")]
    IterationLimitExceeded { iter: u32, max_iter: u32 },
}
