//! Browser plumbing: frame loop, listeners, observers and run gates.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use anyhow::{Context, Result, anyhow};
use js_sys::Array;
use shoal_core::{Gate, Palette, Shoal, ShoalConfig, ShoalSnapshot, Viewport};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, CustomEvent, Element, Event, EventTarget,
    HtmlCanvasElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    MediaQueryList, MouseEvent, MutationObserver, MutationObserverInit, ResizeObserver, Window,
};

use crate::canvas::CanvasSurface;

const KILL_EVENT: &str = "fish:kill";

const HOVER_QUERY: &str = "(hover: hover) and (pointer: fine)";
const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";
const INTERACTIVE_SELECTOR: &str = "a, button, input, textarea, select, summary, label, [role='button'], [role='link'], [contenteditable]";
const VISIBILITY_THRESHOLD: f64 = 0.01;

/// Owns the gate watchers and, while the gate is open, a running session.
pub(crate) struct Host {
    me: Weak<RefCell<Host>>,
    window: Window,
    canvas: HtmlCanvasElement,
    config: ShoalConfig,
    gate: Gate,
    watchers: Option<GateWatchers>,
    session: Option<Session>,
}

impl Host {
    pub(crate) fn mount(canvas: HtmlCanvasElement, config: ShoalConfig) -> Result<Rc<RefCell<Self>>> {
        let window = web_sys::window().context("no global window")?;
        let host = Rc::new_cyclic(|me| {
            RefCell::new(Self {
                me: me.clone(),
                window,
                canvas,
                config,
                gate: Gate::default(),
                watchers: None,
                session: None,
            })
        });

        {
            let mut inner = host.borrow_mut();
            let watchers = GateWatchers::attach(&inner)?;
            inner.gate = Gate {
                capable: watchers.hover.matches(),
                reduced_motion: watchers.motion.matches(),
                in_view: true,
            };
            inner.watchers = Some(watchers);
            inner.start()?;
        }
        Ok(host)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn snapshot(&self) -> Option<ShoalSnapshot> {
        self.session.as_ref().map(|session| session.shoal.snapshot())
    }

    /// Rebuilds the world with a new seed, restarting the loop if it runs.
    pub(crate) fn reset(&mut self, seed: Option<u64>) -> Result<()> {
        self.config.rng_seed = seed;
        if self.session.take().is_some() {
            self.start()?;
        }
        Ok(())
    }

    /// Detaches everything; the host stays inert afterwards.
    pub(crate) fn shutdown(&mut self) {
        self.session = None;
        self.watchers = None;
        debug!("shoal host stopped");
    }

    fn start(&mut self) -> Result<()> {
        if self.session.is_some() || !self.gate.should_run() {
            return Ok(());
        }
        let Some(ctx) = acquire_context(&self.canvas)? else {
            debug!("canvas has no 2d context; staying idle");
            return Ok(());
        };

        let viewport = measure(&self.canvas);
        size_backing_store(&self.canvas, viewport);
        let mut shoal = Shoal::new(self.config.clone(), viewport).context("failed to build shoal")?;
        shoal.set_palette(read_palette(&self.window));
        shoal.resume(now_ms(&self.window));

        let mut session = Session::attach(self, shoal, CanvasSurface::new(ctx))?;
        session.schedule(&self.window);
        self.session = Some(session);
        debug!(
            width = viewport.bounds.width,
            height = viewport.bounds.height,
            "shoal host started"
        );
        Ok(())
    }

    fn apply_gate(&mut self, gate: Gate) {
        if gate == self.gate {
            return;
        }
        self.gate = gate;
        if !gate.should_run() {
            self.session = None;
            debug!(?gate, "shoal paused by gate");
        } else if let Err(err) = self.start() {
            warn!(error = %err, "failed to start shoal");
        }
    }

    fn refresh_media(&mut self) {
        let Some(watchers) = &self.watchers else {
            return;
        };
        let gate = Gate {
            capable: watchers.hover.matches(),
            reduced_motion: watchers.motion.matches(),
            ..self.gate
        };
        self.apply_gate(gate);
    }

    fn set_in_view(&mut self, in_view: bool) {
        self.apply_gate(Gate { in_view, ..self.gate });
    }

    fn frame(&mut self, now: f64) {
        let Some(session) = &mut self.session else {
            return;
        };
        session.frame = None;
        session.shoal.frame(now, &mut session.surface);
        session.schedule(&self.window);
    }

    fn resize(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        let viewport = measure(&self.canvas);
        size_backing_store(&self.canvas, viewport);
        session.shoal.resize(viewport);
    }

    fn reposition(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        let rect = self.canvas.get_bounding_client_rect();
        session.shoal.reposition(rect.left() as f32, rect.top() as f32);
    }

    fn refresh_palette(&mut self) {
        if let Some(session) = &mut self.session {
            session.shoal.set_palette(read_palette(&self.window));
        }
    }

    fn strike(&mut self, client_x: f32, client_y: f32) -> bool {
        self.reposition();
        let now = now_ms(&self.window);
        self.session
            .as_mut()
            .and_then(|session| session.shoal.strike(client_x, client_y, now))
            .is_some()
    }

    fn with_host(me: &Weak<RefCell<Self>>, f: impl FnOnce(&mut Self)) {
        let Some(host) = me.upgrade() else {
            return;
        };
        // Skips callbacks that arrive while the host is already borrowed.
        if let Ok(mut host) = host.try_borrow_mut() {
            f(&mut host);
        }
    }
}

#[cfg(test)]
impl Host {
    /// Starts a session under `gate` regardless of what the media queries say.
    pub(crate) fn start_with_gate(&mut self, gate: Gate) -> Result<()> {
        self.gate = gate;
        self.start()
    }

    pub(crate) fn shoal(&self) -> Option<&Shoal> {
        self.session.as_ref().map(|session| &session.shoal)
    }

    pub(crate) fn shoal_mut(&mut self) -> Option<&mut Shoal> {
        self.session.as_mut().map(|session| &mut session.shoal)
    }

    pub(crate) fn frame_pending(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.frame.is_some())
    }
}

/// Media-query and visibility watchers that live as long as the host.
struct GateWatchers {
    hover: MediaQueryList,
    motion: MediaQueryList,
    intersection: IntersectionObserver,
    _on_intersect: Closure<dyn FnMut(Array)>,
    _listeners: Vec<Listener>,
}

impl GateWatchers {
    fn attach(host: &Host) -> Result<Self> {
        let hover = media_query(&host.window, HOVER_QUERY)?;
        let motion = media_query(&host.window, REDUCED_MOTION_QUERY)?;

        let mut listeners = Vec::with_capacity(2);
        for query in [&hover, &motion] {
            let me = host.me.clone();
            listeners.push(Listener::attach(
                query,
                "change",
                ListenOptions::default(),
                move |_: Event| Host::with_host(&me, Host::refresh_media),
            )?);
        }

        let me = host.me.clone();
        let on_intersect = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
            let Some(entry) = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .last()
            else {
                return;
            };
            let visible = entry.is_intersecting();
            Host::with_host(&me, |host| host.set_in_view(visible));
        });
        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(VISIBILITY_THRESHOLD));
        let intersection =
            IntersectionObserver::new_with_options(on_intersect.as_ref().unchecked_ref(), &init)
                .map_err(js_failure)
                .context("failed to create intersection observer")?;
        intersection.observe(&host.canvas);

        Ok(Self {
            hover,
            motion,
            intersection,
            _on_intersect: on_intersect,
            _listeners: listeners,
        })
    }
}

impl Drop for GateWatchers {
    fn drop(&mut self) {
        self.intersection.disconnect();
    }
}

/// A running world plus every callback that feeds it.
struct Session {
    window: Window,
    shoal: Shoal,
    surface: CanvasSurface,
    frame: Option<i32>,
    on_frame: Closure<dyn FnMut(f64)>,
    resize_observer: Option<ResizeObserver>,
    _on_resize: Option<Closure<dyn FnMut(Array)>>,
    mutation_observer: MutationObserver,
    _on_mutation: Closure<dyn FnMut(Array)>,
    _listeners: Vec<Listener>,
}

impl Session {
    fn attach(host: &Host, shoal: Shoal, surface: CanvasSurface) -> Result<Self> {
        let window = host.window.clone();
        let document = window.document().context("window has no document")?;
        let root = document
            .document_element()
            .context("document has no root element")?;

        let me = host.me.clone();
        let on_frame = Closure::<dyn FnMut(f64)>::new(move |now: f64| {
            Host::with_host(&me, |host| host.frame(now));
        });

        let mut listeners = Vec::with_capacity(5);
        let passive = ListenOptions {
            passive: true,
            capture: false,
        };

        let me = host.me.clone();
        listeners.push(Listener::attach(&window, "mousemove", passive, move |event: Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let (x, y) = (event.client_x() as f32, event.client_y() as f32);
            Host::with_host(&me, |host| {
                if let Some(session) = &mut host.session {
                    session.shoal.pointer_moved(x, y);
                }
            });
        })?);

        let me = host.me.clone();
        listeners.push(Listener::attach(
            &root,
            "mouseleave",
            ListenOptions::default(),
            move |_: Event| {
                Host::with_host(&me, |host| {
                    if let Some(session) = &mut host.session {
                        session.shoal.pointer_left();
                    }
                });
            },
        )?);

        let me = host.me.clone();
        listeners.push(Listener::attach(&window, "scroll", passive, move |_: Event| {
            Host::with_host(&me, Host::reposition);
        })?);

        let me = host.me.clone();
        let kill_target = window.clone();
        listeners.push(Listener::attach(
            &window,
            "pointerdown",
            ListenOptions {
                passive: true,
                capture: true,
            },
            move |event: Event| {
                let Some(pointer) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                if pointer.button() != 0 || over_interactive(&event) {
                    return;
                }
                let (x, y) = (pointer.client_x() as f32, pointer.client_y() as f32);
                let mut killed = false;
                Host::with_host(&me, |host| killed = host.strike(x, y));
                // Dispatched after the borrow ends; listeners run synchronously.
                if killed {
                    dispatch_kill(&kill_target);
                }
            },
        )?);

        let me = host.me.clone();
        let on_resize = Closure::<dyn FnMut(Array)>::new(move |_: Array| {
            Host::with_host(&me, Host::resize);
        });
        let observer = ResizeObserver::new(on_resize.as_ref().unchecked_ref());
        let (resize_observer, on_resize) = match observer {
            Ok(observer) => {
                observer.observe(&host.canvas);
                (Some(observer), Some(on_resize))
            }
            Err(_) => {
                debug!("ResizeObserver unavailable; falling back to window resize");
                let me = host.me.clone();
                listeners.push(Listener::attach(&window, "resize", passive, move |_: Event| {
                    Host::with_host(&me, Host::resize);
                })?);
                (None, None)
            }
        };

        let me = host.me.clone();
        let on_mutation = Closure::<dyn FnMut(Array)>::new(move |_: Array| {
            Host::with_host(&me, Host::refresh_palette);
        });
        let mutation_observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())
            .map_err(js_failure)
            .context("failed to create mutation observer")?;
        let init = MutationObserverInit::new();
        init.set_attributes(true);
        init.set_attribute_filter(&Array::of1(&JsValue::from_str("class")));
        mutation_observer
            .observe_with_options(&root, &init)
            .map_err(js_failure)
            .context("failed to observe theme changes")?;

        Ok(Self {
            window,
            shoal,
            surface,
            frame: None,
            on_frame,
            resize_observer,
            _on_resize: on_resize,
            mutation_observer,
            _on_mutation: on_mutation,
            _listeners: listeners,
        })
    }

    fn schedule(&mut self, window: &Window) {
        match window.request_animation_frame(self.on_frame.as_ref().unchecked_ref()) {
            Ok(id) => self.frame = Some(id),
            Err(err) => warn!(?err, "requestAnimationFrame failed"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(id) = self.frame.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        if let Some(observer) = &self.resize_observer {
            observer.disconnect();
        }
        self.mutation_observer.disconnect();
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ListenOptions {
    passive: bool,
    capture: bool,
}

/// An attached event listener, removed again on drop.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    capture: bool,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        options: ListenOptions,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        let opts = AddEventListenerOptions::new();
        opts.set_passive(options.passive);
        opts.set_capture(options.capture);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                callback.as_ref().unchecked_ref(),
                &opts,
            )
            .map_err(js_failure)
            .with_context(|| format!("failed to listen for {kind}"))?;
        Ok(Self {
            target: target.clone(),
            kind,
            capture: options.capture,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.kind,
            self.callback.as_ref().unchecked_ref(),
            self.capture,
        );
    }
}

fn acquire_context(canvas: &HtmlCanvasElement) -> Result<Option<CanvasRenderingContext2d>> {
    let Some(ctx) = canvas
        .get_context("2d")
        .map_err(js_failure)
        .context("getContext(\"2d\") threw")?
    else {
        return Ok(None);
    };
    Ok(ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

fn measure(canvas: &HtmlCanvasElement) -> Viewport {
    let rect = canvas.get_bounding_client_rect();
    Viewport::new(
        rect.left() as f32,
        rect.top() as f32,
        canvas.client_width() as f32,
        canvas.client_height() as f32,
    )
}

fn size_backing_store(canvas: &HtmlCanvasElement, viewport: Viewport) {
    canvas.set_width(viewport.bounds.width as u32);
    canvas.set_height(viewport.bounds.height as u32);
}

fn read_palette(window: &Window) -> Palette {
    let style = window
        .document()
        .and_then(|document| document.document_element())
        .and_then(|root| window.get_computed_style(&root).ok().flatten());
    let Some(style) = style else {
        return Palette::default();
    };
    let read = |name: &str| style.get_property_value(name).unwrap_or_default();
    Palette::from_css_values(
        &read("--color-primary"),
        &read("--color-primary-2"),
        &read("--color-text-muted"),
    )
}

fn media_query(window: &Window, query: &str) -> Result<MediaQueryList> {
    window
        .match_media(query)
        .map_err(js_failure)?
        .with_context(|| format!("matchMedia unsupported for {query}"))
}

fn over_interactive(event: &Event) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|element| element.closest(INTERACTIVE_SELECTOR).ok().flatten())
        .is_some()
}

fn dispatch_kill(window: &Window) {
    match CustomEvent::new(KILL_EVENT) {
        Ok(event) => {
            if let Err(err) = window.dispatch_event(&event) {
                warn!(?err, "failed to dispatch {KILL_EVENT}");
            }
        }
        Err(err) => warn!(?err, "failed to create {KILL_EVENT}"),
    }
}

fn now_ms(window: &Window) -> f64 {
    window
        .performance()
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

fn js_failure(value: JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}
