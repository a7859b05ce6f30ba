// BCI Admin Desktop - Readiness gate
// Hide a window, issue a load, wait for the content's ready signal or a
// grace timeout, then show. Shared by startup, navigation, reload and
// detached windows.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tauri::async_runtime::{self, JoinHandle};
use tracing::{debug, warn};

/// Grace period for the very first main-window load, which may have to pull
/// content over the network (including an offline start).
pub const FIRST_LOAD_GRACE: Duration = Duration::from_secs(5);

/// Grace period for navigation, reload and detached-window loads.
pub const NAVIGATION_GRACE: Duration = Duration::from_secs(3);

/// Lifecycle of one load cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityState {
    Hidden,
    AwaitingReady,
    Visible,
    Abandoned,
}

/// What resolved a pending load cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateSignal {
    /// Content finished its initial render.
    Ready,
    /// Content reported a failed load; show whatever rendered.
    LoadFailed,
    /// The grace period elapsed without a signal.
    Timeout,
    /// The window was destroyed before the cycle resolved.
    Destroyed,
    /// A newer load cycle took over this window.
    Superseded,
}

/// The window operations a gate needs. Implemented for real webview windows
/// in `window.rs` and for fakes in tests.
pub trait GatedWindow: Send + Sync + 'static {
    fn hide(&self);
    fn show(&self);
    fn is_destroyed(&self) -> bool;
}

/// Runs once the gate's show side effect has happened.
pub type AfterShow = Box<dyn FnOnce() + Send + 'static>;

/// One load cycle for one window.
///
/// The ready signal, the failure signal, the grace timer and window
/// destruction all funnel into [`ReadinessGate::signal`], which transitions
/// the state exactly once. Whatever arrives after resolution is a no-op.
pub struct ReadinessGate<W: GatedWindow> {
    window: W,
    state: Mutex<VisibilityState>,
    timer: Mutex<Option<JoinHandle<()>>>,
    after_show: Mutex<Option<AfterShow>>,
}

impl<W: GatedWindow> ReadinessGate<W> {
    /// Hide the window, issue the load action and start the grace timer.
    ///
    /// A load action that fails synchronously resolves the cycle through the
    /// failure path immediately, so the window is never left hidden.
    pub fn arm<F>(window: W, grace: Duration, after_show: Option<AfterShow>, load: F) -> Arc<Self>
    where
        F: FnOnce(&W) -> anyhow::Result<()>,
    {
        window.hide();
        let gate = Arc::new(Self {
            window,
            state: Mutex::new(VisibilityState::Hidden),
            timer: Mutex::new(None),
            after_show: Mutex::new(after_show),
        });

        let load_result = load(&gate.window);
        *gate.state.lock().unwrap() = VisibilityState::AwaitingReady;

        if let Err(e) = load_result {
            warn!(error = %e, "load action failed, showing window anyway");
            gate.signal(GateSignal::LoadFailed);
            return gate;
        }

        let timer = async_runtime::spawn({
            let gate = Arc::clone(&gate);
            async move {
                tokio::time::sleep(grace).await;
                if gate.signal(GateSignal::Timeout) {
                    debug!("no ready signal within grace period, showing window");
                }
            }
        });
        *gate.timer.lock().unwrap() = Some(timer);
        gate
    }

    /// Resolve the cycle. Returns whether this call performed the transition;
    /// a cycle already resolved ignores every further signal.
    pub fn signal(&self, signal: GateSignal) -> bool {
        let next = {
            let mut state = self.state.lock().unwrap();
            if *state != VisibilityState::AwaitingReady {
                return false;
            }
            *state = match signal {
                GateSignal::Destroyed | GateSignal::Superseded => VisibilityState::Abandoned,
                // The window may have been torn down between the signal being
                // queued and it arriving here; a destroyed handle must not be
                // touched.
                _ if self.window.is_destroyed() => VisibilityState::Abandoned,
                _ => VisibilityState::Visible,
            };
            *state
        };

        if let Some(timer) = self.timer.lock().unwrap().take() {
            timer.abort();
        }

        if next == VisibilityState::Visible {
            self.window.show();
            if let Some(hook) = self.after_show.lock().unwrap().take() {
                hook();
            }
        }
        true
    }

    pub fn state(&self) -> VisibilityState {
        *self.state.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct FakeWindow(Arc<FakeInner>);

    #[derive(Default)]
    struct FakeInner {
        hides: AtomicUsize,
        shows: AtomicUsize,
        destroyed: AtomicBool,
    }

    impl FakeWindow {
        fn shows(&self) -> usize {
            self.0.shows.load(Ordering::SeqCst)
        }

        fn destroy(&self) {
            self.0.destroyed.store(true, Ordering::SeqCst);
        }
    }

    impl GatedWindow for FakeWindow {
        fn hide(&self) {
            self.0.hides.fetch_add(1, Ordering::SeqCst);
        }

        fn show(&self) {
            self.0.shows.fetch_add(1, Ordering::SeqCst);
        }

        fn is_destroyed(&self) -> bool {
            self.0.destroyed.load(Ordering::SeqCst)
        }
    }

    fn wait(ms: u64) {
        async_runtime::block_on(tokio::time::sleep(Duration::from_millis(ms)));
    }

    #[test]
    fn ready_shows_exactly_once() {
        let win = FakeWindow::default();
        let gate = ReadinessGate::arm(win.clone(), Duration::from_millis(50), None, |_| Ok(()));

        assert!(gate.signal(GateSignal::Ready));
        assert_eq!(gate.state(), VisibilityState::Visible);
        assert_eq!(win.shows(), 1);

        // Late timeout and duplicate ready are no-ops.
        assert!(!gate.signal(GateSignal::Timeout));
        assert!(!gate.signal(GateSignal::Ready));
        wait(100);
        assert_eq!(win.shows(), 1);
    }

    #[test]
    fn timeout_shows_after_grace() {
        let win = FakeWindow::default();
        let gate = ReadinessGate::arm(win.clone(), Duration::from_millis(40), None, |_| Ok(()));

        assert_eq!(win.shows(), 0);
        wait(150);

        assert_eq!(gate.state(), VisibilityState::Visible);
        assert_eq!(win.shows(), 1);
        assert!(!gate.signal(GateSignal::Ready), "late ready must be ignored");
        assert_eq!(win.shows(), 1);
    }

    #[test]
    fn load_failure_still_shows() {
        let win = FakeWindow::default();
        let gate = ReadinessGate::arm(win.clone(), Duration::from_millis(40), None, |_| {
            anyhow::bail!("navigation refused")
        });

        assert_eq!(gate.state(), VisibilityState::Visible);
        assert_eq!(win.shows(), 1);
    }

    #[test]
    fn failure_signal_forces_show() {
        let win = FakeWindow::default();
        let gate = ReadinessGate::arm(win.clone(), Duration::from_secs(30), None, |_| Ok(()));

        assert!(gate.signal(GateSignal::LoadFailed));
        assert_eq!(gate.state(), VisibilityState::Visible);
        assert_eq!(win.shows(), 1);
    }

    #[test]
    fn destroyed_window_is_abandoned() {
        let win = FakeWindow::default();
        let gate = ReadinessGate::arm(win.clone(), Duration::from_millis(40), None, |_| Ok(()));

        win.destroy();
        assert!(gate.signal(GateSignal::Ready));

        assert_eq!(gate.state(), VisibilityState::Abandoned);
        assert_eq!(win.shows(), 0, "a destroyed handle must not be shown");
    }

    #[test]
    fn destroy_notification_cancels_cycle() {
        let win = FakeWindow::default();
        let gate = ReadinessGate::arm(win.clone(), Duration::from_millis(40), None, |_| Ok(()));

        assert!(gate.signal(GateSignal::Destroyed));
        wait(120);

        assert_eq!(gate.state(), VisibilityState::Abandoned);
        assert_eq!(win.shows(), 0);
    }

    #[test]
    fn superseded_cycle_never_shows() {
        let win = FakeWindow::default();
        let old = ReadinessGate::arm(win.clone(), Duration::from_millis(30), None, |_| Ok(()));
        old.signal(GateSignal::Superseded);

        let new = ReadinessGate::arm(win.clone(), Duration::from_millis(60), None, |_| Ok(()));
        wait(120);

        // Only the new cycle's timeout shows; the old timer was cancelled.
        assert_eq!(old.state(), VisibilityState::Abandoned);
        assert_eq!(new.state(), VisibilityState::Visible);
        assert_eq!(win.shows(), 1);
    }

    #[test]
    fn after_show_runs_on_show_only() {
        let ran = Arc::new(AtomicUsize::new(0));

        let win = FakeWindow::default();
        let hook: AfterShow = {
            let ran = Arc::clone(&ran);
            Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            })
        };
        let gate = ReadinessGate::arm(win.clone(), Duration::from_millis(40), Some(hook), |_| Ok(()));
        gate.signal(GateSignal::Ready);
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        let abandoned = FakeWindow::default();
        let hook: AfterShow = {
            let ran = Arc::clone(&ran);
            Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            })
        };
        let gate =
            ReadinessGate::arm(abandoned.clone(), Duration::from_millis(40), Some(hook), |_| Ok(()));
        gate.signal(GateSignal::Destroyed);
        assert_eq!(ran.load(Ordering::SeqCst), 1, "abandoned cycle must not run the hook");
    }
}
