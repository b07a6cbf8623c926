#![cfg(target_arch = "wasm32")]

mod canvas;
mod host;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use shoal_core::ShoalConfig;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::host::Host;

/// Handle to a mounted background. Dropping it (or calling `stop`) detaches
/// every listener and cancels the pending frame.
#[wasm_bindgen]
pub struct ShoalHandle {
    inner: Rc<RefCell<Host>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct MountOptions {
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<ShoalConfig>,
}

impl MountOptions {
    fn from_js(value: JsValue) -> Result<Self, JsValue> {
        if value.is_null() || value.is_undefined() {
            Ok(Self::default())
        } else {
            from_value::<Self>(value).map_err(js_error)
        }
    }

    fn into_config(self) -> Result<ShoalConfig> {
        let mut config = self.config.unwrap_or_default();
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        config.validate().context("invalid shoal configuration")?;
        Ok(config)
    }
}

#[wasm_bindgen]
impl ShoalHandle {
    /// Whether the frame loop is currently scheduled.
    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.inner.borrow().is_running()
    }

    /// Serialized world summary, or `null` while idle.
    #[wasm_bindgen(js_name = snapshot)]
    pub fn snapshot_js(&self) -> Result<JsValue, JsValue> {
        match self.inner.borrow().snapshot() {
            Some(snapshot) => to_value(&snapshot).map_err(js_error),
            None => Ok(JsValue::NULL),
        }
    }

    /// Reseeds the world; `undefined` draws a fresh seed from entropy.
    #[wasm_bindgen(js_name = reset)]
    pub fn reset_js(&self, seed: Option<f64>) -> Result<(), JsValue> {
        let seed = normalize_seed(seed).map_err(js_error)?;
        self.inner.borrow_mut().reset(seed).map_err(js_error)
    }

    pub fn stop(&self) {
        self.inner.borrow_mut().shutdown();
    }
}

/// Attaches the simulation to `canvas`.
///
/// When the pointer is coarse, reduced motion is requested or the canvas has
/// no 2D context, the handle stays idle instead of failing.
#[wasm_bindgen]
pub fn mount(canvas: HtmlCanvasElement, options: JsValue) -> Result<ShoalHandle, JsValue> {
    let config = MountOptions::from_js(options)?
        .into_config()
        .map_err(js_error)?;
    let inner = Host::mount(canvas, config).map_err(js_error)?;
    Ok(ShoalHandle { inner })
}

fn normalize_seed(seed: Option<f64>) -> Result<Option<u64>> {
    let Some(value) = seed else {
        return Ok(None);
    };
    ensure!(value.is_finite(), "seed must be a finite number");
    ensure!(value >= 0.0, "seed must be non-negative");
    let truncated = value.floor();
    ensure!(
        truncated <= u64::MAX as f64,
        "seed must be representable as u64"
    );
    Ok(Some(truncated as u64))
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsError::new(&err.to_string()).into()
}

#[wasm_bindgen]
pub fn version() -> String {
    format!("shoal-web {}", env!("CARGO_PKG_VERSION"))
}

#[wasm_bindgen]
pub fn default_config() -> Result<JsValue, JsValue> {
    to_value(&ShoalConfig::default()).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::Gate;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn canvas() -> HtmlCanvasElement {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .expect("document");
        let canvas = document
            .create_element("canvas")
            .expect("canvas")
            .dyn_into::<HtmlCanvasElement>()
            .expect("canvas element");
        canvas.set_width(640);
        canvas.set_height(480);
        document
            .body()
            .expect("body")
            .append_child(&canvas)
            .expect("attach");
        canvas
    }

    #[wasm_bindgen_test]
    fn mount_options_accept_partial_config() {
        let raw = js_sys::JSON::parse(r#"{"seed": 7, "config": {"seek_radius": 180}}"#)
            .expect("json");
        let config = MountOptions::from_js(raw)
            .expect("options")
            .into_config()
            .expect("config");
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.seek_radius, 180.0);
        assert_eq!(config.keep_radius, ShoalConfig::default().keep_radius);
    }

    #[wasm_bindgen_test]
    fn invalid_config_is_rejected_at_mount() {
        let raw = js_sys::JSON::parse(r#"{"config": {"eat_radius": -1}}"#).expect("json");
        assert!(mount(canvas(), raw).is_err());
    }

    #[wasm_bindgen_test]
    fn seeds_are_normalized() {
        assert_eq!(normalize_seed(None).expect("none"), None);
        assert_eq!(normalize_seed(Some(41.9)).expect("floor"), Some(41));
        assert!(normalize_seed(Some(-1.0)).is_err());
        assert!(normalize_seed(Some(f64::NAN)).is_err());
    }

    #[wasm_bindgen_test]
    fn stop_leaves_handle_idle() {
        let handle = mount(canvas(), JsValue::UNDEFINED).expect("mount");
        handle
            .inner
            .borrow_mut()
            .start_with_gate(Gate {
                capable: true,
                reduced_motion: false,
                in_view: true,
            })
            .expect("start");
        assert!(handle.running());
        assert!(!handle.snapshot_js().expect("snapshot").is_null());

        handle.stop();
        assert!(!handle.running());
        assert!(handle.snapshot_js().expect("snapshot").is_null());
        // Stopping twice is harmless.
        handle.stop();
    }

    #[wasm_bindgen_test]
    fn version_names_the_crate() {
        assert!(version().starts_with("shoal-web "));
        assert!(default_config().expect("config").is_object());
    }
}
