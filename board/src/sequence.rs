//! Ordered step lists.
//!
//! Every sequencer declares its steps once as a [StepList]. A [StepRunner] walks the list: each
//! step runs only after the previous one succeeded, a failing step is reported with its
//! [Stage], and nothing is retried. A list may name a re-entry stage, where a sequencer resumes
//! when its subsystem is already live (the USB host only needs a restart).
//!
//! Operations whose outcome must never change a bring-up result, such as media notifications,
//! go through [best_effort] instead.
use crate::{
    debug_ex,
    error::{BringUpError, DriverError, Stage},
    registry::SubsystemKind,
};
use log::{error, warn};

#[derive(Debug)]
pub struct StepList {
    pub kind: SubsystemKind,
    pub steps: &'static [Stage],
    /// Stage to resume at when the subsystem is already live; `None` skips the whole list.
    pub reentry: Option<Stage>,
}

impl StepList {
    pub fn position(&self, stage: Stage) -> Option<usize> {
        self.steps.iter().position(|&s| s == stage)
    }

    /// Runner positioned at the first step.
    pub fn runner(&'static self) -> StepRunner {
        StepRunner {
            list: self,
            next: 0,
        }
    }

    /// Runner positioned at the re-entry stage, or past the end if there is none.
    pub fn resume(&'static self) -> StepRunner {
        let next = self
            .reentry
            .and_then(|stage| self.position(stage))
            .unwrap_or(self.steps.len());
        StepRunner { list: self, next }
    }
}

#[derive(Debug)]
pub struct StepRunner {
    list: &'static StepList,
    next: usize,
}

impl StepRunner {
    /// The stage the runner expects next, `None` once the list is done.
    pub fn next_stage(&self) -> Option<Stage> {
        self.list.steps.get(self.next).copied()
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.list.steps.len()
    }

    /// Run `stage`. On failure the driver error is tagged with `stage` and the runner stays put.
    ///
    /// Running a stage other than [StepRunner::next_stage] is a bug in the sequencer.
    pub fn run<T>(
        &mut self,
        stage: Stage,
        step: impl FnOnce() -> Result<T, DriverError>,
    ) -> Result<T, BringUpError> {
        debug_assert_eq!(
            self.next_stage(),
            Some(stage),
            "{} sequence ran out of order",
            self.list.kind
        );
        debug_ex!("\t{}: {}...", self.list.kind, stage);
        match step() {
            Ok(res) => {
                self.next += 1;
                Ok(res)
            }
            Err(cause) => {
                error!("{}: {} failed: {}", self.list.kind, stage, cause);
                Err(BringUpError::new(stage, cause))
            }
        }
    }

    /// Pass over an optional stage the board does not need.
    pub fn skip(&mut self, stage: Stage) {
        debug_assert_eq!(
            self.next_stage(),
            Some(stage),
            "{} sequence skipped out of order",
            self.list.kind
        );
        debug_ex!("\t{}: {} not needed.", self.list.kind, stage);
        self.next += 1;
    }
}

/// Outcome of an operation that never affects the result of the sequence it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestEffort {
    Done,
    Ignored(BringUpError),
}

/// Outcome of a teardown. Every variant means the subsystem is considered gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// Nothing was live; no driver was called.
    NotLive,
    Clean,
    /// The driver reported a failure on the way down. Logged, never escalated.
    Unclean(BringUpError),
}

/// Run `op`, log a failure at warn level and hand the outcome back for inspection.
pub fn best_effort(
    kind: SubsystemKind,
    stage: Stage,
    op: impl FnOnce() -> Result<(), DriverError>,
) -> BestEffort {
    match op() {
        Ok(()) => BestEffort::Done,
        Err(cause) => {
            warn!("{}: {} failed, ignored: {}", kind, stage, cause);
            BestEffort::Ignored(BringUpError::new(stage, cause))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Errno;

    static LIST: StepList = StepList {
        kind: SubsystemKind::UsbHost,
        steps: &[Stage::HalRegister, Stage::ControllerAcquire, Stage::ControllerStart],
        reentry: Some(Stage::ControllerStart),
    };

    static NO_REENTRY: StepList = StepList {
        kind: SubsystemKind::Storage,
        steps: &[Stage::TransportAcquire, Stage::MediaBind],
        reentry: None,
    };

    #[test]
    fn runs_in_order_and_passes_values_along() {
        let mut runner = LIST.runner();
        assert_eq!(runner.next_stage(), Some(Stage::HalRegister));
        runner.run(Stage::HalRegister, || Ok(())).unwrap();
        let id = runner.run(Stage::ControllerAcquire, || Ok(7)).unwrap();
        runner
            .run(Stage::ControllerStart, || match id {
                7 => Ok(()),
                _ => Err(Errno::EINVAL.into()),
            })
            .unwrap();
        assert!(runner.is_done());
    }

    #[test]
    fn failure_is_tagged_and_does_not_advance() {
        let mut runner = LIST.runner();
        let err = runner
            .run(Stage::HalRegister, || Err::<(), _>(DriverError::from_code(-5)))
            .unwrap_err();
        assert_eq!(err, BringUpError::new(Stage::HalRegister, Errno::EIO.into()));
        assert_eq!(runner.next_stage(), Some(Stage::HalRegister));
    }

    #[test]
    fn resume_starts_at_reentry_stage() {
        let runner = LIST.resume();
        assert_eq!(runner.next_stage(), Some(Stage::ControllerStart));
        assert!(NO_REENTRY.resume().is_done());
        assert_eq!(LIST.position(Stage::ControllerAcquire), Some(1));
        assert_eq!(LIST.position(Stage::MediaBind), None);
    }

    #[test]
    fn skip_advances_past_optional_stage() {
        let mut runner = NO_REENTRY.runner();
        runner.skip(Stage::TransportAcquire);
        assert_eq!(runner.next_stage(), Some(Stage::MediaBind));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "ran out of order")]
    fn out_of_order_step_is_caught() {
        let mut runner = LIST.runner();
        let _ = runner.run(Stage::ControllerStart, || Ok(()));
    }

    #[test]
    fn best_effort_reports_but_never_fails() {
        let done = best_effort(SubsystemKind::Storage, Stage::MediaNotify, || Ok(()));
        assert_eq!(done, BestEffort::Done);
        let ignored = best_effort(SubsystemKind::Storage, Stage::MediaNotify, || {
            Err(Errno::EBUSY.into())
        });
        assert_eq!(
            ignored,
            BestEffort::Ignored(BringUpError::new(Stage::MediaNotify, Errno::EBUSY.into()))
        );
    }
}
