// src/batch/scheduler.rs
//! Two passes over the subject list with a fixed pool of worker threads.
//!
//! Each worker owns one contiguous chunk and walks it in order. A subject
//! moves `Pending → Attempting(n) → Processed | Failed`; a cancelled pass
//! leaves it `Cancelled`, which is recorded nowhere.
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{atomic::{AtomicBool, Ordering}, mpsc, Arc},
    thread,
    time::{Duration, Instant},
};

use super::tracker::{self, Persist, Tracker};
use crate::config::consts::PAUSE_SLICE_MS;
use crate::config::options::BatchOptions;
use crate::pipeline::{Outcome, Subject, SubjectProcessor};
use crate::progress::Progress;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Extra wait before another attempt at the same subject.
    pub retry_delay: Duration,
    /// Wait after every attempt, success or not.
    pub rate_limit: Duration,
}

impl From<&BatchOptions> for RetryPolicy {
    fn from(o: &BatchOptions) -> Self {
        Self { max_attempts: o.max_attempts.max(1), retry_delay: o.retry_delay, rate_limit: o.rate_limit }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubjectState {
    Pending,
    Attempting(u32),
    Processed,
    Failed,
    Cancelled,
}

impl SubjectState {
    pub fn is_final(self) -> bool {
        matches!(self, SubjectState::Processed | SubjectState::Failed | SubjectState::Cancelled)
    }
}

/// Blocking waits between attempts.
pub trait Pacer: Send + Sync {
    /// Wait for `d`. Returns false if `cancel` was raised before the time
    /// was up.
    fn pause(&self, d: Duration, cancel: &AtomicBool) -> bool;
}

/// Sleeps in short slices so a cancelled pass is noticed quickly.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, d: Duration, cancel: &AtomicBool) -> bool {
        let slice = Duration::from_millis(PAUSE_SLICE_MS);
        let until = Instant::now() + d;
        loop {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            let now = Instant::now();
            if now >= until {
                return true;
            }
            thread::sleep(slice.min(until - now));
        }
    }
}

/// How one subject ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Driven {
    pub state: SubjectState,
    pub attempts: u32,
    pub outcome: Option<Outcome>,
    pub last_error: Option<String>,
}

/// Run one subject through its state machine.
pub fn drive_subject(
    subject: &Subject,
    processor: &dyn SubjectProcessor,
    policy: &RetryPolicy,
    pacer: &dyn Pacer,
    cancel: &AtomicBool,
) -> Driven {
    let mut state = SubjectState::Pending;
    let mut attempts = 0;
    let mut outcome = None;
    let mut last_error = None;

    while !state.is_final() {
        state = match state {
            SubjectState::Pending => SubjectState::Attempting(1),
            SubjectState::Attempting(_) if cancel.load(Ordering::Relaxed) => SubjectState::Cancelled,
            SubjectState::Attempting(n) => {
                attempts = n;
                let result = catch_unwind(AssertUnwindSafe(|| processor.process(subject)));
                let ok = match result {
                    Ok(Ok(o)) => {
                        outcome = Some(o);
                        true
                    }
                    Ok(Err(e)) => {
                        logw!("{}: attempt {n}/{} failed: {e}", subject.id, policy.max_attempts);
                        last_error = Some(e.to_string());
                        false
                    }
                    Err(_) => {
                        loge!("{}: attempt {n} panicked", subject.id);
                        last_error = Some(s!("processor panicked"));
                        false
                    }
                };

                let not_cancelled = pacer.pause(policy.rate_limit, cancel);
                if ok {
                    SubjectState::Processed
                } else if n >= policy.max_attempts {
                    SubjectState::Failed
                } else if not_cancelled && pacer.pause(policy.retry_delay, cancel) {
                    SubjectState::Attempting(n + 1)
                } else {
                    SubjectState::Cancelled
                }
            }
            done => done,
        };
    }

    Driven { state, attempts, outcome, last_error }
}

/// Contiguous chunks of `ceil(N / workers)` subjects.
pub fn chunk_subjects(subjects: &[Subject], workers: usize) -> Vec<Vec<Subject>> {
    if subjects.is_empty() {
        return Vec::new();
    }
    let size = subjects.len().div_ceil(workers.max(1)).max(1);
    subjects.chunks(size).map(<[Subject]>::to_vec).collect()
}

/// Records results for one pass. Once closed, late results are dropped.
struct PassGuard {
    tracker: Arc<Tracker>,
    cancel: Arc<AtomicBool>,
}

impl PassGuard {
    /// Record under the tracker lock, so nothing lands after `close`.
    fn record(&self, id: &str, state: SubjectState) -> bool {
        self.tracker.update(|st| {
            if self.cancel.load(Ordering::SeqCst) {
                return (false, Persist::NONE);
            }
            match state {
                SubjectState::Processed => tracker::mark_processed(st, id),
                SubjectState::Failed => tracker::mark_failed(st, id),
                _ => (false, Persist::NONE),
            }
        })
    }

    fn close(&self) {
        self.tracker.update(|_| {
            self.cancel.store(true, Ordering::SeqCst);
            ((), Persist::NONE)
        })
    }
}

enum Event {
    Subject { subject: Subject, driven: Driven },
    ChunkDone,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub processed: Vec<String>,
    pub failed: Vec<String>,
    /// Subjects the pass never reported on before its deadline.
    pub cancelled: usize,
    pub timed_out: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Successes across both passes.
    pub processed: usize,
    /// Failed list after the retry pass.
    pub failed: Vec<String>,
    /// Already processed in an earlier run.
    pub skipped: usize,
    pub cancelled: usize,
    /// Failed ids that match no subject in this run's list.
    pub orphans: Vec<String>,
    /// The tracker completed a cycle and was reset.
    pub reset: bool,
}

pub struct Scheduler {
    tracker: Arc<Tracker>,
    processor: Arc<dyn SubjectProcessor>,
    pacer: Arc<dyn Pacer>,
    policy: RetryPolicy,
    workers: usize,
    pass_timeout: Duration,
}

impl Scheduler {
    pub fn new(tracker: Arc<Tracker>, processor: Arc<dyn SubjectProcessor>, opts: &BatchOptions) -> Self {
        Self {
            tracker,
            processor,
            pacer: Arc::new(ThreadPacer),
            policy: RetryPolicy::from(opts),
            workers: opts.workers.max(1),
            pass_timeout: opts.pass_timeout,
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Initial pass over unprocessed subjects, then one retry pass over the
    /// failed list.
    pub fn run(&self, subjects: &[Subject], progress: &mut dyn Progress) -> RunSummary {
        self.tracker.set_total(subjects.len());

        let pending: Vec<Subject> = subjects
            .iter()
            .filter(|s| !self.tracker.is_processed(&s.id))
            .cloned()
            .collect();
        let skipped = subjects.len() - pending.len();
        if skipped > 0 {
            progress.log(&format!("Skipping {skipped} subject(s) already processed"));
        }
        progress.begin(pending.len());
        logf!("Pass 1: {} subject(s), {} worker(s)", pending.len(), self.workers);

        let first = self.run_pass(&pending, progress);

        // Retry exactly what is in the failed list now.
        let failed_ids = self.tracker.take_failed();
        let mut retry = Vec::with_capacity(failed_ids.len());
        let mut orphans = Vec::new();
        for id in failed_ids {
            match subjects.iter().find(|s| s.id == id) {
                Some(s) => retry.push(s.clone()),
                None => orphans.push(id),
            }
        }
        for id in &orphans {
            logw!("Failed id {id} is not in the subject list; keeping it in the failed log");
            self.tracker.mark_failed(id);
        }
        if !orphans.is_empty() {
            progress.log(&format!("{} failed id(s) not in the subject list were kept", orphans.len()));
        }

        let second = if retry.is_empty() {
            PassReport::default()
        } else {
            progress.log(&format!("Retrying {} failed subject(s)", retry.len()));
            progress.begin(retry.len());
            logf!("Pass 2: {} subject(s)", retry.len());
            self.run_pass(&retry, progress)
        };

        let reset = self.tracker.reset_if_complete();
        let failed = self.tracker.snapshot().failed;
        progress.finish();

        RunSummary {
            processed: first.processed.len() + second.processed.len(),
            failed,
            skipped,
            cancelled: first.cancelled + second.cancelled,
            orphans,
            reset,
        }
    }

    /// One sweep over `subjects`, bounded by the pass timeout.
    pub fn run_pass(&self, subjects: &[Subject], progress: &mut dyn Progress) -> PassReport {
        let mut report = PassReport::default();
        let chunks = chunk_subjects(subjects, self.workers);
        if chunks.is_empty() {
            return report;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let guard = Arc::new(PassGuard { tracker: Arc::clone(&self.tracker), cancel: Arc::clone(&cancel) });
        let (tx, rx) = mpsc::channel::<Event>();
        let n_chunks = chunks.len();

        for chunk in chunks {
            let tx = tx.clone();
            let guard = Arc::clone(&guard);
            let cancel = Arc::clone(&cancel);
            let processor = Arc::clone(&self.processor);
            let pacer = Arc::clone(&self.pacer);
            let policy = self.policy;

            thread::spawn(move || {
                for subject in chunk {
                    if cancel.load(Ordering::Relaxed) {
                        break;
                    }
                    let driven = drive_subject(&subject, processor.as_ref(), &policy, pacer.as_ref(), &cancel);
                    if !guard.record(&subject.id, driven.state) && driven.state != SubjectState::Cancelled {
                        logd!("{}: result not recorded", subject.id);
                    }
                    // receiver gone means the pass timed out
                    if tx.send(Event::Subject { subject, driven }).is_err() {
                        break;
                    }
                }
                let _ = tx.send(Event::ChunkDone);
            });
        }
        drop(tx); // main thread is sole receiver now

        let deadline = Instant::now() + self.pass_timeout;
        let mut done_chunks = 0;
        let mut reported = 0;
        while done_chunks < n_chunks {
            let left = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(left) {
                Ok(Event::ChunkDone) => done_chunks += 1,
                Ok(Event::Subject { subject, driven }) => {
                    reported += 1;
                    match driven.state {
                        SubjectState::Processed => {
                            progress.item_done(&subject.id, &subject.name);
                            report.processed.push(subject.id);
                        }
                        SubjectState::Failed => {
                            let why = driven.last_error.as_deref().unwrap_or("unknown error");
                            loge!("{}: giving up after {} attempt(s): {why}", subject.id, driven.attempts);
                            progress.item_failed(&subject.id, &subject.name);
                            report.failed.push(subject.id);
                        }
                        _ => report.cancelled += 1,
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    guard.close();
                    report.timed_out = true;
                    let left_over = subjects.len() - reported;
                    report.cancelled += left_over;
                    loge!("Pass timed out after {:?}; {left_over} subject(s) cancelled", self.pass_timeout);
                    progress.log(&format!("Pass timed out; {left_over} subject(s) left for the next run"));
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ProcessError;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    struct Script {
        fail_first: u32,
        calls: AtomicU32,
    }

    impl SubjectProcessor for Script {
        fn process(&self, s: &Subject) -> Result<Outcome, ProcessError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(ProcessError::NoData(s.id.clone()))
            } else {
                Ok(Outcome::Unchanged { title: s.name.clone() })
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Duration>>);

    impl Pacer for Recorder {
        fn pause(&self, d: Duration, cancel: &AtomicBool) -> bool {
            self.0.lock().unwrap().push(d);
            !cancel.load(Ordering::Relaxed)
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            retry_delay: Duration::from_millis(7),
            rate_limit: Duration::from_millis(3),
        }
    }

    #[test]
    fn succeeds_on_third_attempt() {
        let p = Script { fail_first: 2, calls: AtomicU32::new(0) };
        let pacer = Recorder::default();
        let d = drive_subject(&Subject::from_id("a"), &p, &policy(), &pacer, &AtomicBool::new(false));
        assert_eq!(d.state, SubjectState::Processed);
        assert_eq!(d.attempts, 3);
        let pauses = pacer.0.lock().unwrap().clone();
        let ms: Vec<u128> = pauses.iter().map(Duration::as_millis).collect();
        // rate limit after every attempt, retry delay between attempts
        assert_eq!(ms, vec![3, 7, 3, 7, 3]);
    }

    #[test]
    fn gives_up_after_limit() {
        let p = Script { fail_first: u32::MAX, calls: AtomicU32::new(0) };
        let d = drive_subject(&Subject::from_id("a"), &p, &policy(), &Recorder::default(), &AtomicBool::new(false));
        assert_eq!(d.state, SubjectState::Failed);
        assert_eq!(d.attempts, 4);
        assert_eq!(p.calls.load(Ordering::SeqCst), 4);
        assert!(d.last_error.is_some());
    }

    #[test]
    fn cancelled_before_start_never_calls() {
        let p = Script { fail_first: 0, calls: AtomicU32::new(0) };
        let d = drive_subject(&Subject::from_id("a"), &p, &policy(), &Recorder::default(), &AtomicBool::new(true));
        assert_eq!(d.state, SubjectState::Cancelled);
        assert_eq!(p.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn panics_count_as_failed_attempts() {
        struct Boom;
        impl SubjectProcessor for Boom {
            fn process(&self, _: &Subject) -> Result<Outcome, ProcessError> {
                panic!("boom")
            }
        }
        let d = drive_subject(&Subject::from_id("a"), &Boom, &policy(), &Recorder::default(), &AtomicBool::new(false));
        assert_eq!(d.state, SubjectState::Failed);
    }

    #[test]
    fn chunks_are_contiguous_and_bounded() {
        let subs: Vec<Subject> = (0..10).map(|i| Subject::from_id(&i.to_string())).collect();
        let chunks = chunk_subjects(&subs, 4);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(chunks[1][0].id, "3");
        assert_eq!(chunk_subjects(&subs[..2], 8).len(), 2);
        assert!(chunk_subjects(&[], 3).is_empty());
    }

    #[test]
    fn thread_pacer_wakes_on_cancel() {
        let cancel = AtomicBool::new(true);
        let t = Instant::now();
        assert!(!ThreadPacer.pause(Duration::from_secs(30), &cancel));
        assert!(t.elapsed() < Duration::from_secs(1));
    }
}
