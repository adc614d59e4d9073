use std::time::{Duration, Instant};

use avionlink_frame::{Frame, FrameError, FramedLink};
use avionlink_transport::{OpenStatus, SerialLink, TransportError};
use tracing::{debug, info, trace, warn};

use crate::clock::{pace, Clock, SystemClock};
use crate::config::ControllerConfig;
use crate::error::{ControlError, Result};
use crate::register::Registers;
use crate::shutdown::ShutdownSignal;

/// Lifecycle of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Link not opened yet, or closed after a run.
    Stopped,
    /// Link open; cycles may run.
    Running,
}

/// What the inbound half of a cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A frame was decoded and stored in the input register.
    Frame(Frame),
    /// A line arrived but could not be decoded; it was dropped.
    Malformed,
    /// Bytes arrived but no full line before the read timeout.
    Partial,
    /// No bytes arrived within the poll timeout.
    Idle,
    /// Shutdown was requested while waiting.
    Interrupted,
}

/// Summary of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub inbound: Inbound,
    pub sentinel_sent: bool,
    pub started: Instant,
    /// When pacing ended, i.e. the earliest start of the next cycle.
    pub finished: Instant,
}

impl CycleReport {
    pub fn duration(&self) -> Duration {
        self.finished.duration_since(self.started)
    }
}

/// Counters accumulated over the controller's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub cycles: u64,
    pub frames_received: u64,
    pub malformed_frames: u64,
    pub sentinels_sent: u64,
    pub poll_timeouts: u64,
    /// Cycles whose body took longer than the cycle period.
    pub overruns: u64,
}

enum Readiness {
    Ready,
    TimedOut,
    Interrupted,
}

/// Drives the read/rule/pace cycle over one serial link.
pub struct LoopController<L, C = SystemClock> {
    link: FramedLink<L>,
    clock: C,
    config: ControllerConfig,
    registers: Registers,
    state: ControllerState,
    stats: LoopStats,
}

impl<L: SerialLink> LoopController<L, SystemClock> {
    /// Create a stopped controller on the system clock.
    pub fn new(link: L, config: ControllerConfig) -> Self {
        Self::with_clock(link, config, SystemClock)
    }
}

impl<L: SerialLink, C: Clock> LoopController<L, C> {
    /// Create a stopped controller with an explicit clock.
    pub fn with_clock(link: L, config: ControllerConfig, clock: C) -> Self {
        Self {
            link: FramedLink::new(link),
            clock,
            config,
            registers: Registers::default(),
            state: ControllerState::Stopped,
            stats: LoopStats::default(),
        }
    }

    /// Open the link and enter [`ControllerState::Running`].
    ///
    /// Calling it again while open reports [`OpenStatus::AlreadyOpen`] and
    /// leaves the registers untouched.
    pub fn start(&mut self) -> OpenStatus {
        let status = self.link.open();
        match &status {
            OpenStatus::Opened | OpenStatus::AlreadyOpen => {
                if self.state == ControllerState::Stopped {
                    info!(link = self.link.get_ref().name(), %status, "controller running");
                }
                self.state = ControllerState::Running;
            }
            OpenStatus::Failed(reason) => {
                warn!(link = self.link.get_ref().name(), %reason, "controller could not start");
            }
        }
        status
    }

    /// Like [`start`](Self::start), but a failed open is an error.
    pub fn try_start(&mut self) -> Result<OpenStatus> {
        match self.start() {
            OpenStatus::Failed(reason) => Err(ControlError::OpenFailed(reason)),
            status => Ok(status),
        }
    }

    /// Close the link and return to [`ControllerState::Stopped`].
    pub fn stop(&mut self) {
        self.link.close();
        if self.state == ControllerState::Running {
            info!(cycles = self.stats.cycles, "controller stopped");
        }
        self.state = ControllerState::Stopped;
    }

    /// Run cycles until `shutdown` fires or `max_cycles` is reached, then
    /// close the link.
    ///
    /// Malformed frames are dropped and counted; transport failures end the
    /// run with an error (the link is closed either way).
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> Result<LoopStats> {
        if self.state != ControllerState::Running {
            return Err(ControlError::NotRunning);
        }

        info!(
            period_ms = self.config.cycle_period.as_millis() as u64,
            rule = ?self.config.rule,
            "control loop started"
        );

        let result = self.run_until(shutdown);
        if let Err(err) = &result {
            warn!(error = %err, "control loop failed");
        }
        self.stop();
        result.map(|()| self.stats)
    }

    fn run_until(&mut self, shutdown: &ShutdownSignal) -> Result<()> {
        loop {
            if shutdown.is_triggered() {
                debug!("shutdown requested");
                return Ok(());
            }
            if let Some(max) = self.config.max_cycles {
                if self.stats.cycles >= max {
                    return Ok(());
                }
            }
            self.run_cycle(shutdown)?;
        }
    }

    /// Run exactly one cycle: wait for bytes, decode one frame, apply the
    /// rule, then sleep out the rest of the cycle period.
    ///
    /// An interrupted wait returns at once without applying the rule or pacing.
    pub fn run_cycle(&mut self, shutdown: &ShutdownSignal) -> Result<CycleReport> {
        if self.state != ControllerState::Running {
            return Err(ControlError::NotRunning);
        }

        let started = self.clock.now();

        let inbound = match self.wait_readable(started, shutdown)? {
            Readiness::Interrupted => {
                return Ok(CycleReport {
                    inbound: Inbound::Interrupted,
                    sentinel_sent: false,
                    started,
                    finished: self.clock.now(),
                });
            }
            Readiness::TimedOut => {
                self.stats.poll_timeouts += 1;
                Inbound::Idle
            }
            Readiness::Ready => self.receive()?,
        };

        let sentinel_sent = self.apply_rule()?;

        let body = self.clock.now().duration_since(started);
        if body > self.config.cycle_period {
            self.stats.overruns += 1;
            warn!(elapsed_us = body.as_micros() as u64, "cycle overran its period");
        }

        let finished = pace(&self.clock, started, self.config.cycle_period);
        self.stats.cycles += 1;

        Ok(CycleReport {
            inbound,
            sentinel_sent,
            started,
            finished,
        })
    }

    /// Record a command in the output register and send it to the microcontroller.
    pub fn command(&mut self, index: u8, value: i32) -> Result<()> {
        self.link.send(value, index)?;
        self.registers.output.set(index, value)?;
        Ok(())
    }

    fn wait_readable(&mut self, started: Instant, shutdown: &ShutdownSignal) -> Result<Readiness> {
        loop {
            if shutdown.is_triggered() {
                return Ok(Readiness::Interrupted);
            }
            if !self.link.is_open() {
                return Err(TransportError::Closed.into());
            }
            if self.link.bytes_available()? > 0 {
                return Ok(Readiness::Ready);
            }
            if let Some(timeout) = self.config.poll_timeout {
                if self.clock.now().duration_since(started) >= timeout {
                    return Ok(Readiness::TimedOut);
                }
            }
            trace!("waiting for inbound bytes");
            self.clock.sleep(self.config.poll_interval);
        }
    }

    fn receive(&mut self) -> Result<Inbound> {
        match self.link.read_frame() {
            Ok(frame) => {
                self.registers.input.apply(&frame)?;
                self.stats.frames_received += 1;
                Ok(Inbound::Frame(frame))
            }
            Err(err) if err.is_malformed() => {
                warn!(error = %err, "dropping malformed frame");
                self.stats.malformed_frames += 1;
                Ok(Inbound::Malformed)
            }
            Err(FrameError::Transport(TransportError::Timeout(timeout))) => {
                debug!(?timeout, "partial line pending");
                Ok(Inbound::Partial)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn apply_rule(&mut self) -> Result<bool> {
        let Some(rule) = self.config.rule else {
            return Ok(false);
        };
        if !rule.fires(&self.registers.input) {
            return Ok(false);
        }
        self.link.send_sentinel()?;
        self.stats.sentinels_sent += 1;
        Ok(true)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Mutable access for a higher-level controller that owns the output values.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Borrow the underlying link.
    pub fn link(&self) -> &L {
        self.link.get_ref()
    }

    /// Mutably borrow the underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        self.link.get_mut()
    }

    /// Consume the controller and return the link.
    pub fn into_link(self) -> L {
        self.link.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use avionlink_transport::MemoryLink;
    use bytes::Bytes;

    use super::*;
    use crate::clock::ManualClock;
    use crate::rule::CommandRule;

    const PERIOD: Duration = Duration::from_millis(10);

    fn config() -> ControllerConfig {
        ControllerConfig {
            poll_timeout: Some(Duration::from_millis(4)),
            ..ControllerConfig::default()
        }
    }

    fn running(config: ControllerConfig) -> (LoopController<MemoryLink, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut ctl = LoopController::with_clock(MemoryLink::new("mem"), config, clock.clone());
        assert_eq!(ctl.start(), OpenStatus::Opened);
        (ctl, clock)
    }

    /// Link whose reads take simulated time.
    struct SlowLink {
        inner: MemoryLink,
        clock: ManualClock,
        read_cost: Duration,
    }

    impl SerialLink for SlowLink {
        fn open(&mut self) -> OpenStatus {
            self.inner.open()
        }
        fn close(&mut self) {
            self.inner.close()
        }
        fn is_open(&self) -> bool {
            self.inner.is_open()
        }
        fn bytes_available(&self) -> avionlink_transport::Result<usize> {
            self.inner.bytes_available()
        }
        fn write_line(&mut self, line: &[u8]) -> avionlink_transport::Result<()> {
            self.inner.write_line(line)
        }
        fn read_line(&mut self) -> avionlink_transport::Result<Bytes> {
            self.clock.advance(self.read_cost);
            self.inner.read_line()
        }
        fn name(&self) -> &str {
            self.inner.name()
        }
    }

    #[test]
    fn frame_lands_in_input_register() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().inject_rx(b"37\r\n");

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();

        assert_eq!(report.inbound, Inbound::Frame(Frame { value: 2, index: 5 }));
        assert_eq!(ctl.registers().input.get(5).unwrap(), 2);
        assert_eq!(ctl.stats().frames_received, 1);
        assert!(!report.sentinel_sent);
        assert!(ctl.link().tx_buffer().is_empty());
    }

    #[test]
    fn stick_x_forty_sends_sentinel() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().inject_rx(b"640\n");

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();

        assert_eq!(report.inbound, Inbound::Frame(Frame { value: 40, index: 0 }));
        assert!(report.sentinel_sent);
        assert_eq!(ctl.link().tx_buffer(), b"16\n");
    }

    #[test]
    fn other_values_send_nothing() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().inject_rx(b"656\n");

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();

        assert_eq!(report.inbound, Inbound::Frame(Frame { value: 41, index: 0 }));
        assert!(!report.sentinel_sent);
        assert!(ctl.link().tx_buffer().is_empty());
    }

    #[test]
    fn disabled_rule_sends_nothing() {
        let (mut ctl, _clock) = running(ControllerConfig {
            rule: None,
            ..config()
        });
        ctl.link_mut().inject_rx(b"640\n");

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert!(!report.sentinel_sent);
        assert!(ctl.link().tx_buffer().is_empty());
    }

    #[test]
    fn custom_rule_watches_its_channel() {
        let (mut ctl, _clock) = running(ControllerConfig {
            rule: Some(CommandRule {
                channel: 2,
                trigger: 5,
            }),
            ..config()
        });
        ctl.link_mut().inject_rx(b"82\n");

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert!(report.sentinel_sent);
    }

    #[test]
    fn malformed_frame_is_dropped_and_loop_continues() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().inject_rx(b"37\n");
        ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        let before = ctl.registers().input;

        ctl.link_mut().inject_rx(b"not-a-number\n");
        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(report.inbound, Inbound::Malformed);
        assert_eq!(ctl.registers().input, before);

        ctl.link_mut().inject_rx(&[0xFF, 0xFE, b'\n']);
        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(report.inbound, Inbound::Malformed);
        assert_eq!(ctl.registers().input, before);

        ctl.link_mut().inject_rx(b"53\n");
        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(report.inbound, Inbound::Frame(Frame { value: 3, index: 5 }));

        let stats = ctl.stats();
        assert_eq!(stats.malformed_frames, 2);
        assert_eq!(stats.frames_received, 2);
        assert_eq!(stats.cycles, 4);
    }

    #[test]
    fn tail_of_overlong_line_is_not_decoded() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().inject_rx(&[b'9'; 40]);
        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(report.inbound, Inbound::Malformed);

        ctl.link_mut().inject_rx(b"640\n");
        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert!(matches!(report.inbound, Inbound::Partial | Inbound::Idle));
        assert!(!report.sentinel_sent);
        assert_eq!(ctl.registers().input.get(0).unwrap(), 0);
        assert!(ctl.link().tx_buffer().is_empty());

        ctl.link_mut().inject_rx(b"640\n");
        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(report.inbound, Inbound::Frame(Frame { value: 40, index: 0 }));
        assert!(report.sentinel_sent);
    }

    #[test]
    fn partial_line_waits_for_rest() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().inject_rx(b"6");

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(report.inbound, Inbound::Partial);

        ctl.link_mut().inject_rx(b"40\n");
        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(report.inbound, Inbound::Frame(Frame { value: 40, index: 0 }));
    }

    #[test]
    fn short_cycle_is_paced_to_period() {
        let clock = ManualClock::new();
        let link = SlowLink {
            inner: MemoryLink::new("slow"),
            clock: clock.clone(),
            read_cost: Duration::from_millis(2),
        };
        let mut ctl = LoopController::with_clock(link, config(), clock.clone());
        ctl.start();
        ctl.link_mut().inner.inject_rx(b"37\n");

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();

        assert_eq!(report.duration(), PERIOD);
        assert_eq!(clock.elapsed(), PERIOD);
        assert_eq!(ctl.stats().overruns, 0);
    }

    #[test]
    fn slow_cycle_is_not_shortened() {
        let clock = ManualClock::new();
        let link = SlowLink {
            inner: MemoryLink::new("slow"),
            clock: clock.clone(),
            read_cost: Duration::from_millis(13),
        };
        let mut ctl = LoopController::with_clock(link, config(), clock.clone());
        ctl.start();
        ctl.link_mut().inner.inject_rx(b"37\n37\n");

        let first = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(first.duration(), Duration::from_millis(13));
        assert_eq!(ctl.stats().overruns, 1);

        ctl.link_mut().read_cost = Duration::from_millis(1);
        let second = ctl.run_cycle(&ShutdownSignal::new()).unwrap();
        assert_eq!(second.started, first.finished);
        assert_eq!(second.duration(), PERIOD);
    }

    #[test]
    fn idle_cycle_times_out_and_still_applies_rule() {
        let (mut ctl, clock) = running(config());
        ctl.registers_mut().input.set(0, 40).unwrap();

        let report = ctl.run_cycle(&ShutdownSignal::new()).unwrap();

        assert_eq!(report.inbound, Inbound::Idle);
        assert!(report.sentinel_sent);
        assert_eq!(ctl.stats().poll_timeouts, 1);
        assert_eq!(clock.elapsed(), PERIOD);
    }

    #[test]
    fn shutdown_interrupts_wait() {
        let (mut ctl, clock) = running(ControllerConfig {
            poll_timeout: None,
            ..config()
        });
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let report = ctl.run_cycle(&shutdown).unwrap();
        assert_eq!(report.inbound, Inbound::Interrupted);
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(ctl.stats().cycles, 0);
    }

    #[test]
    fn cycle_requires_running_state() {
        let mut ctl = LoopController::with_clock(
            MemoryLink::new("mem"),
            config(),
            ManualClock::new(),
        );
        assert!(matches!(
            ctl.run_cycle(&ShutdownSignal::new()).unwrap_err(),
            ControlError::NotRunning
        ));
        assert!(matches!(
            ctl.run(&ShutdownSignal::new()).unwrap_err(),
            ControlError::NotRunning
        ));
    }

    #[test]
    fn start_is_idempotent_and_keeps_registers() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().inject_rx(b"37\n");
        ctl.run_cycle(&ShutdownSignal::new()).unwrap();

        assert_eq!(ctl.start(), OpenStatus::AlreadyOpen);
        assert_eq!(ctl.state(), ControllerState::Running);
        assert_eq!(ctl.registers().input.get(5).unwrap(), 2);
    }

    #[test]
    fn failed_open_stays_stopped() {
        let mut ctl = LoopController::with_clock(
            MemoryLink::unavailable("mem", "port busy"),
            config(),
            ManualClock::new(),
        );
        assert_eq!(ctl.start(), OpenStatus::Failed("port busy".into()));
        assert_eq!(ctl.state(), ControllerState::Stopped);
        assert!(matches!(
            ctl.try_start().unwrap_err(),
            ControlError::OpenFailed(reason) if reason == "port busy"
        ));
    }

    #[test]
    fn run_stops_after_max_cycles_and_closes_link() {
        let (mut ctl, clock) = running(ControllerConfig {
            max_cycles: Some(3),
            ..config()
        });
        ctl.link_mut().inject_rx(b"640\n");

        let stats = ctl.run(&ShutdownSignal::new()).unwrap();

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.frames_received, 1);
        assert_eq!(stats.poll_timeouts, 2);
        assert_eq!(stats.sentinels_sent, 3);
        assert_eq!(ctl.link().tx_buffer(), b"16\n16\n16\n");
        assert_eq!(clock.elapsed(), PERIOD * 3);
        assert_eq!(ctl.state(), ControllerState::Stopped);
        assert!(!ctl.link().is_open());
    }

    #[test]
    fn run_with_shutdown_already_requested_does_nothing() {
        let (mut ctl, _clock) = running(config());
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let stats = ctl.run(&shutdown).unwrap();
        assert_eq!(stats.cycles, 0);
        assert!(!ctl.link().is_open());
    }

    #[test]
    fn run_stops_on_shutdown_from_another_thread() {
        let mut ctl = LoopController::new(MemoryLink::new("mem"), ControllerConfig::default());
        ctl.start();
        let shutdown = ShutdownSignal::new();

        let trigger = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(30));
                shutdown.trigger();
            })
        };

        let begun = Instant::now();
        let stats = ctl.run(&shutdown).unwrap();
        trigger.join().unwrap();

        assert!(begun.elapsed() < Duration::from_secs(5));
        assert_eq!(stats.frames_received, 0);
        assert_eq!(ctl.state(), ControllerState::Stopped);
    }

    #[test]
    fn closed_link_ends_run_with_error() {
        let (mut ctl, _clock) = running(config());
        ctl.link_mut().close();

        let err = ctl.run(&ShutdownSignal::new()).unwrap_err();
        assert!(matches!(err, ControlError::Transport(TransportError::Closed)));
        assert_eq!(ctl.state(), ControllerState::Stopped);
    }

    #[test]
    fn command_updates_output_and_wire() {
        let (mut ctl, _clock) = running(config());
        ctl.command(avionlink_frame::MAIN_MOTOR, 900).unwrap();

        assert_eq!(ctl.registers().output.get(2).unwrap(), 900);
        assert_eq!(ctl.link().tx_buffer(), b"14402\n");
    }

    #[test]
    fn command_with_wide_index_changes_nothing() {
        let (mut ctl, _clock) = running(config());
        let err = ctl.command(16, 1).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Frame(FrameError::IndexOutOfRange(16))
        ));
        assert_eq!(ctl.registers().output, crate::Register::new());
        assert!(ctl.link().tx_buffer().is_empty());
    }

    #[test]
    fn command_on_closed_link_is_reported() {
        let mut ctl = LoopController::with_clock(
            MemoryLink::new("mem"),
            config(),
            ManualClock::new(),
        );
        let err = ctl.command(0, 5).unwrap_err();
        assert!(matches!(
            err,
            ControlError::Frame(FrameError::Transport(TransportError::Closed))
        ));
    }
}
