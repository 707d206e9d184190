//! The engine loop's frame dispatcher (§4.9): advances the frame-in-flight index and delta time,
//! and broadcasts `pre_tick`/`tick`/`post_tick` to host-registered listeners around the host's
//! own input and render callbacks.
//!
//! This crate only cares about the frame dispatcher insofar as it drives the frame-in-flight index
//! that selects bindless/model-matrix-pool slots (§1); actually creating the RHI device and
//! driving input/rendering are the host's job, supplied here as closures.

use std::time::{Duration, Instant};

use crate::error::RenderError;

/// A subscription handle returned by [`EventBus::bind`], usable with [`EventBus::unbind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindId(u64);

/// A multi-consumer broadcaster with stable subscription handles (Design Note "Event
/// subscription"): a slab of `(id, callback)` pairs with O(1) insert and linear remove, invoked
/// in registration order, each run to completion before the next begins (§5 "Ordering
/// guarantees").
pub struct EventBus<Args> {
    next_id: u64,
    listeners: Vec<(BindId, Box<dyn FnMut(&Args)>)>,
}

impl<Args> EventBus<Args> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// AddBind.
    pub fn bind(&mut self, callback: impl FnMut(&Args) + 'static) -> BindId {
        let id = BindId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(callback)));
        id
    }

    /// RemoveBind. A no-op if `id` was already unbound.
    pub fn unbind(&mut self, id: BindId) {
        self.listeners.retain(|(bound, _)| *bound != id);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Invoke.
    pub fn invoke(&mut self, args: &Args) {
        for (_, callback) in &mut self.listeners {
            callback(args);
        }
    }
}

impl<Args> Default for EventBus<Args> {
    fn default() -> Self {
        Self::new()
    }
}

/// `Uninit -> Running -> Stopped`, per §4.9's state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatcherState {
    Uninit,
    Running,
    Stopped,
}

/// Arguments broadcast to `pre_tick`/`tick`/`post_tick` listeners and passed to the host's input
/// and render callbacks for one loop iteration.
#[derive(Copy, Clone, Debug)]
pub struct TickArgs {
    pub frame_number: u64,
    pub delta: Duration,
}

/// Drives the `pre_tick` / `tick` / `post_tick` broadcast and the frame-in-flight counter.
///
/// `H` is the RHI device handle type; [`FrameDispatcher::init`] broadcasts it to
/// `post_rhi_device_created` listeners, and [`FrameDispatcher::shutdown`] broadcasts it to
/// `pre_rhi_device_destroyed` listeners, matching the four device-lifecycle events in §6 that
/// "each carry the device handle".
pub struct FrameDispatcher<H> {
    state: DispatcherState,
    frame_number: u64,
    last_frame_time: Instant,
    close_requested: bool,
    pub pre_rhi_device_created: EventBus<()>,
    pub post_rhi_device_created: EventBus<H>,
    pub pre_rhi_device_destroyed: EventBus<H>,
    pub post_rhi_device_destroyed: EventBus<()>,
    pub pre_tick: EventBus<TickArgs>,
    pub post_tick: EventBus<TickArgs>,
}

impl<H> FrameDispatcher<H> {
    pub fn new() -> Self {
        Self {
            state: DispatcherState::Uninit,
            frame_number: 0,
            last_frame_time: Instant::now(),
            close_requested: false,
            pre_rhi_device_created: EventBus::new(),
            post_rhi_device_created: EventBus::new(),
            pre_rhi_device_destroyed: EventBus::new(),
            post_rhi_device_destroyed: EventBus::new(),
            pre_tick: EventBus::new(),
            post_tick: EventBus::new(),
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Init: creates the RHI device via `create_device`, broadcasting
    /// `pre_rhi_device_created`/`post_rhi_device_created` around the call, snapshots
    /// `last_frame_time`, zeros the frame counter, and transitions `Uninit -> Running`.
    pub fn init(&mut self, create_device: impl FnOnce() -> H) -> H {
        self.pre_rhi_device_created.invoke(&());
        let device = create_device();
        self.post_rhi_device_created.invoke(&device);

        self.last_frame_time = Instant::now();
        self.frame_number = 0;
        self.state = DispatcherState::Running;
        device
    }

    /// Sets the close-requested flag. Takes effect only at the next loop iteration boundary
    /// (§5 "Cancellation and timeout"), i.e. after the in-progress [`FrameDispatcher::run`]
    /// iteration finishes.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// One loop iteration: advances `frame_number`/delta time, then broadcasts `pre_tick`, runs
    /// `tick` (the host's input callback, then its render callback, in that fixed order), then
    /// broadcasts `post_tick` (§5 "Ordering guarantees").
    ///
    /// A callback returning `Err` aborts the loop: the dispatcher transitions to `Stopped` and
    /// the error propagates to the caller as fatal (§4.9 "callback throwing or returning error
    /// aborts the loop").
    pub fn tick_once(
        &mut self,
        mut input: impl FnMut(&TickArgs) -> Result<(), RenderError>,
        mut render: impl FnMut(&TickArgs) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        if self.state != DispatcherState::Running {
            return Err(RenderError::Fatal(
                "tick invoked on a dispatcher that is not running".into(),
            ));
        }

        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last_frame_time);
        self.last_frame_time = now;
        self.frame_number += 1;

        let args = TickArgs {
            frame_number: self.frame_number,
            delta,
        };

        self.pre_tick.invoke(&args);

        if let Err(err) = input(&args).and_then(|()| render(&args)) {
            self.state = DispatcherState::Stopped;
            return Err(err);
        }

        self.post_tick.invoke(&args);
        Ok(())
    }

    /// Run: loops [`FrameDispatcher::tick_once`] until `request_close` has been called, then
    /// transitions to `Stopped`.
    pub fn run(
        &mut self,
        mut input: impl FnMut(&TickArgs) -> Result<(), RenderError>,
        mut render: impl FnMut(&TickArgs) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        while !self.close_requested {
            self.tick_once(&mut input, &mut render)?;
        }
        self.state = DispatcherState::Stopped;
        Ok(())
    }

    /// UnInit: broadcasts `pre_rhi_device_destroyed`/`post_rhi_device_destroyed` around the
    /// caller's own device teardown and flips the dispatcher out of `Running`.
    pub fn shutdown(&mut self, device: H) {
        self.pre_rhi_device_destroyed.invoke(&device);
        drop(device);
        self.post_rhi_device_destroyed.invoke(&());
        self.state = DispatcherState::Stopped;
    }
}

impl<H> Default for FrameDispatcher<H> {
    fn default() -> Self {
        Self::new()
    }
}
