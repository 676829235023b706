use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, WindowCtx};
use crate::device::{GpuInit, GraphicsContext};
use crate::events::{Event, EventHandler, EventKind};
use crate::input::platform::winit::translate_window_event;
use crate::input::InputState;
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
    /// Redraw every loop iteration instead of only on request.
    pub continuous_redraw: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1024.0, 800.0),
            resizable: true,
            continuous_redraw: true,
        }
    }
}

/// Requests the application makes from inside a frame.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }

    pub fn request_redraw(&mut self) {
        self.commands.push(Command::Redraw);
    }
}

enum Command {
    Redraw,
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, creates the GPU context and runs `app` until it exits
    /// or the window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        Self::run_with_handler(config, gpu_init, EventHandler::new(), app)
    }

    /// Like [`Runtime::run`], but every event goes through `handler` before it
    /// reaches [`App::on_event`]. The app sees the handled flag the callback set.
    pub fn run_with_handler<A>(config: RuntimeConfig, gpu_init: GpuInit, handler: EventHandler, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, handler, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input: InputState,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: GraphicsContext<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    handler: EventHandler,
    app: A,

    window: Option<WindowEntry>,
    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, handler: EventHandler, app: A) -> Self {
        Self {
            config,
            gpu_init,
            handler,
            app,
            window: None,
            exit_requested: false,
            fatal: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            input: InputState::default(),
            clock: FrameClock::default(),
            window,
            gpu_builder: |w| pollster::block_on(GraphicsContext::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        self.window = Some(entry);
        Ok(id)
    }

    /// Feeds one engine event through the input state, the callback table and
    /// the app, in that order. An unhandled `WindowClose` requests exit.
    fn dispatch(&mut self, kind: EventKind) -> Event {
        let mut event = Event::new(kind);
        if let Some(entry) = self.window.as_mut() {
            entry.with_input_mut(|input| input.apply(&event));
        }
        self.handler.dispatch(&mut event);
        if self.app.on_event(&mut event) == AppControl::Exit {
            self.exit_requested = true;
        }
        if matches!(event.kind(), EventKind::WindowClose) && !event.handled() {
            log::info!("window closed");
            self.exit_requested = true;
        }
        event
    }

    fn redraw(&mut self) {
        let (app, window) = (&mut self.app, &mut self.window);
        let Some(entry) = window.as_mut() else {
            return;
        };

        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;

        entry.with_mut(|fields| {
            let time: FrameTime = fields.clock.tick();

            {
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        id: fields.window.id(),
                        window: fields.window,
                    },
                    gpu: fields.gpu,
                    input: fields.input,
                    time,
                    runtime: &mut runtime_ctx,
                };
                control = app.on_frame(&mut ctx);
            }

            fields.input.end_frame();
        });

        if control == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.apply_commands(runtime_ctx);
    }

    fn apply_commands(&mut self, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::Redraw => {
                    if let Some(entry) = &self.window {
                        entry.with_window(|w| w.request_redraw());
                    }
                }
                Command::Exit => self.exit_requested = true,
            }
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create window: {e:#}");
            self.fatal = Some(e);
            event_loop.exit();
            return;
        }

        // let the app size its cameras before the first frame
        if let Some(size) = self.window.as_ref().map(|e| e.borrow_gpu().size()) {
            log::info!("window ready: {}x{}", size.width, size.height);
            self.dispatch(EventKind::WindowResize { width: size.width, height: size.height });
        }

        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);
        if self.config.continuous_redraw {
            if let Some(entry) = &self.window {
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        for kind in translate_window_event(&event) {
            self.dispatch(kind);
        }

        match &event {
            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.window.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::Occluded(false) => {
                if let Some(entry) = self.window.as_mut() {
                    entry.with_clock_mut(|clock| clock.reset());
                }
            }

            WindowEvent::RedrawRequested => self.redraw(),

            _ => {}
        }

        if self.exit_requested {
            self.window = None;
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::events::EventType;

    /// Records `(type, handled)` for every event it sees.
    struct Recorder {
        seen: Rc<RefCell<Vec<(EventType, bool)>>>,
        veto_close: bool,
    }

    impl App for Recorder {
        fn on_event(&mut self, event: &mut Event) -> AppControl {
            self.seen.borrow_mut().push((event.event_type(), event.handled()));
            if self.veto_close && matches!(event.kind(), EventKind::WindowClose) {
                event.handle(true);
            }
            AppControl::Continue
        }

        fn on_frame(&mut self, _ctx: &mut FrameCtx<'_, '_>) -> AppControl {
            AppControl::Continue
        }
    }

    fn state(handler: EventHandler, veto_close: bool) -> (AppState<Recorder>, Rc<RefCell<Vec<(EventType, bool)>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let app = Recorder { seen: seen.clone(), veto_close };
        (AppState::new(RuntimeConfig::default(), GpuInit::default(), handler, app), seen)
    }

    #[test]
    fn callback_table_runs_before_the_app() {
        let mut handler = EventHandler::new();
        handler.set_callback(EventType::WindowResize, |_| true);
        let (mut st, seen) = state(handler, false);

        st.dispatch(EventKind::WindowResize { width: 640, height: 480 });
        st.dispatch(EventKind::WindowFocus);

        assert_eq!(
            *seen.borrow(),
            vec![(EventType::WindowResize, true), (EventType::WindowFocus, false)]
        );
    }

    #[test]
    fn unhandled_close_requests_exit() {
        let (mut st, _) = state(EventHandler::new(), false);
        st.dispatch(EventKind::WindowClose);
        assert!(st.exit_requested);
    }

    #[test]
    fn close_handled_by_callback_or_app_keeps_running() {
        let mut handler = EventHandler::new();
        handler.set_callback(EventType::WindowClose, |_| true);
        let (mut st, _) = state(handler, false);
        st.dispatch(EventKind::WindowClose);
        assert!(!st.exit_requested);

        let (mut st, _) = state(EventHandler::new(), true);
        let event = st.dispatch(EventKind::WindowClose);
        assert!(event.handled());
        assert!(!st.exit_requested);
    }
}
