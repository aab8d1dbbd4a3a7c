//! WASM bindings for delivery-notice scanning.
//!
//! Lets a browser or WebView capture front end run the same resolver,
//! address extractor and accumulation session as native builds. Structured
//! values cross the boundary as plain JS objects.

use wasm_bindgen::prelude::*;

use avp_core::{
    AddressExtractor, AvpConfig, BarcodeDetection, Frame, FrameInterpreter, MemoryStore,
    RecognizedText, ScanConfig, ScannedObservation, SessionCore, TrackingResolver,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(js_error)
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// ISO 7064 MOD 37-36 check character of a 14-character payload.
#[wasm_bindgen]
pub fn iso_key(payload: &str) -> Result<String, JsValue> {
    avp_core::iso_key(payload).map(String::from).map_err(js_error)
}

/// La Poste mod-10 check character of a 14-digit payload.
#[wasm_bindgen]
pub fn la_poste_key(payload: &str) -> Result<String, JsValue> {
    avp_core::la_poste_key(payload).map(String::from).map_err(js_error)
}

/// Resolve a tracking number from barcode content and OCR text.
///
/// Returns `null` when nothing could be resolved.
#[wasm_bindgen]
pub fn resolve_tracking(raw: &str, is_data_matrix: bool, ocr_text: &str) -> Result<JsValue, JsValue> {
    let resolution = TrackingResolver::new()
        .resolve(raw, is_data_matrix, ocr_text)
        .map_err(js_error)?;

    match resolution {
        Some(resolution) => to_js(&resolution),
        None => Ok(JsValue::NULL),
    }
}

/// Extract the recipient address.
///
/// `text` is either a string or a recognized-text object (`{text, blocks}`).
#[wasm_bindgen]
pub fn extract_address(text: JsValue) -> Result<JsValue, JsValue> {
    let recognized = match text.as_string() {
        Some(flat) => RecognizedText::flat(flat),
        None => from_js(text)?,
    };

    let extraction = AddressExtractor::new().extract(&recognized, None);
    to_js(&extraction)
}

/// Build a frame observation from recognizer output.
///
/// `detections` is an array of `{format, raw_value, bounds?}` and `text` a
/// recognized-text object. Frame size enables the exclusion-zone filter.
#[wasm_bindgen]
pub fn analyze_frame(
    detections: JsValue,
    text: JsValue,
    width: u32,
    height: u32,
) -> Result<JsValue, JsValue> {
    let detections: Vec<BarcodeDetection> = from_js(detections)?;
    let text: RecognizedText = from_js(text)?;

    let analysis = FrameInterpreter::new()
        .interpret(&Frame::new(width, height), &detections, &text)
        .map_err(js_error)?;
    to_js(&analysis)
}

/// Scan session for browser use.
///
/// Finalizes as soon as the merged capture is complete; the caller owns any
/// quiet-period timing.
#[wasm_bindgen]
pub struct ScanSessionJs {
    core: SessionCore<MemoryStore>,
}

#[wasm_bindgen]
impl ScanSessionJs {
    /// Create a session. `config` is an optional scan config object
    /// (`{mode, stability_delay_ms, continuous}`).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ScanSessionJs, JsValue> {
        let config: ScanConfig = if config.is_undefined() || config.is_null() {
            ScanConfig::default()
        } else {
            from_js(config)?
        };

        Ok(Self {
            core: SessionCore::new(config, MemoryStore::new()),
        })
    }

    /// Create a session from a full JSON configuration document.
    #[wasm_bindgen]
    pub fn from_config_json(json: &str) -> Result<ScanSessionJs, JsValue> {
        let config: AvpConfig = serde_json::from_str(json).map_err(js_error)?;
        Ok(Self {
            core: SessionCore::new(config.scan, MemoryStore::new()),
        })
    }

    /// Feed one frame observation. Returns the session events it produced.
    #[wasm_bindgen]
    pub fn ingest(&mut self, observation: JsValue, manual: bool) -> Result<JsValue, JsValue> {
        let observation: ScannedObservation = from_js(observation)?;
        let events = self.core.ingest(observation, manual).map_err(js_error)?;
        to_js(&events)
    }

    /// Finalize whatever has been gathered.
    #[wasm_bindgen]
    pub fn trigger_manual(&mut self) -> Result<JsValue, JsValue> {
        let events = self.core.trigger_manual(None).map_err(js_error)?;
        to_js(&events)
    }

    /// End the session.
    #[wasm_bindgen]
    pub fn close(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.core.close())
    }

    /// Records saved so far.
    #[wasm_bindgen]
    pub fn records(&self) -> Result<JsValue, JsValue> {
        to_js(&self.core.store().records())
    }

    /// Current merged capture, or `null`.
    #[wasm_bindgen]
    pub fn pending(&self) -> Result<JsValue, JsValue> {
        match self.core.pending() {
            Some(pending) => to_js(pending),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn finished(&self) -> bool {
        self.core.is_finished()
    }

    #[wasm_bindgen(getter)]
    pub fn saved_count(&self) -> usize {
        self.core.saved_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_keys() {
        assert_eq!(iso_key("86912345678901").unwrap(), "U");
        assert_eq!(la_poste_key("86512345678901").unwrap(), "1");
        assert!(la_poste_key("8651234567890A").is_err());
    }

    #[wasm_bindgen_test]
    fn test_resolve_nothing_is_null() {
        assert!(resolve_tracking("", false, "").unwrap().is_null());
    }

    #[wasm_bindgen_test]
    fn test_session_saves_complete_capture() {
        let mut session = ScanSessionJs::new(JsValue::UNDEFINED).unwrap();
        let observation = ScannedObservation {
            tracking_number: Some("RR123456789FR".to_string()),
            raw_address_text: Some("M. MARTIN\n69002 LYON".to_string()),
            ..Default::default()
        };
        session
            .ingest(serde_wasm_bindgen::to_value(&observation).unwrap(), false)
            .unwrap();
        assert_eq!(session.saved_count(), 1);
        assert!(!session.finished());
    }
}
