//! Progress callbacks and the cooperative yield point between iterations.

/// Receives the 1-based iteration number while a trainer runs.
///
/// Implementations must return quickly; they are called on the same task
/// that does the numerical work.
pub trait ProgressReporter: Send {
    fn on_progress(&mut self, iteration: usize);
}

impl<F> ProgressReporter for F
where
    F: FnMut(usize) + Send,
{
    fn on_progress(&mut self, iteration: usize) {
        self(iteration)
    }
}

/// Reporter that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_progress(&mut self, _iteration: usize) {}
}

/// Forwards progress to a reporter, keeps it strictly increasing, and yields
/// to the scheduler after each forwarded report.
pub struct ProgressTracker<'a> {
    reporter: &'a mut dyn ProgressReporter,
    last: Option<usize>,
    reports: usize,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(reporter: &'a mut dyn ProgressReporter) -> Self {
        Self {
            reporter,
            last: None,
            reports: 0,
        }
    }

    /// Report `iteration`, then yield once.
    ///
    /// An iteration at or below the last reported one is dropped without
    /// yielding.
    pub async fn report(&mut self, iteration: usize) {
        if self.last.is_some_and(|last| iteration <= last) {
            return;
        }
        self.last = Some(iteration);
        self.reports += 1;
        tracing::trace!(iteration, "progress");
        self.reporter.on_progress(iteration);
        tokio::task::yield_now().await;
    }

    pub fn last_reported(&self) -> Option<usize> {
        self.last
    }

    pub fn reports(&self) -> usize {
        self.reports
    }
}

/// Gradient-descent reporting stride: every fifth zero-based iteration and
/// the final one.
pub fn should_report(iteration: usize, iterations: usize) -> bool {
    iteration % 5 == 0 || iteration + 1 == iterations
}
