//! Async recognizer seam and the per-frame join.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::analysis::{FrameAnalysis, FrameInterpreter};
use super::{BarcodeDetection, Frame, RecognizedText};
use crate::error::{RecognitionError, Result};
use crate::models::config::AvpConfig;

/// External barcode engine.
pub trait BarcodeReader {
    /// Read every barcode visible in the frame.
    fn scan(
        &self,
        frame: &Frame,
    ) -> impl Future<Output = std::result::Result<Vec<BarcodeDetection>, RecognitionError>> + Send;
}

/// External text engine.
pub trait TextReader {
    /// Recognize the text of the frame, with block geometry when available.
    fn recognize(
        &self,
        frame: &Frame,
    ) -> impl Future<Output = std::result::Result<RecognizedText, RecognitionError>> + Send;
}

impl<R: BarcodeReader + Send + Sync> BarcodeReader for Arc<R> {
    fn scan(
        &self,
        frame: &Frame,
    ) -> impl Future<Output = std::result::Result<Vec<BarcodeDetection>, RecognitionError>> + Send {
        (**self).scan(frame)
    }
}

impl<R: TextReader + Send + Sync> TextReader for Arc<R> {
    fn recognize(
        &self,
        frame: &Frame,
    ) -> impl Future<Output = std::result::Result<RecognizedText, RecognitionError>> + Send {
        (**self).recognize(frame)
    }
}

/// Create a linked cancel handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Cancels every token created from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken { rx: self.tx.subscribe() }
    }
}

/// Observes cancellation of an analysis.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Never resolves if the handle is dropped first.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Runs both recognizers on a frame and interprets the results.
pub struct FrameAnalyzer<B, T> {
    barcode: B,
    text: T,
    interpreter: FrameInterpreter,
}

impl<B: BarcodeReader, T: TextReader> FrameAnalyzer<B, T> {
    pub fn new(barcode: B, text: T) -> Self {
        Self {
            barcode,
            text,
            interpreter: FrameInterpreter::new(),
        }
    }

    pub fn with_config(mut self, config: &AvpConfig) -> Self {
        self.interpreter = FrameInterpreter::from_config(config);
        self
    }

    /// Analyze one frame.
    ///
    /// Both engines run concurrently and are awaited together. A failing
    /// engine counts as having found nothing. Returns `Ok(None)` when the
    /// token is cancelled; both in-flight recognitions are dropped.
    pub async fn analyze(&self, frame: &Frame, cancel: &CancelToken) -> Result<Option<FrameAnalysis>> {
        let recognition = async {
            tokio::join!(self.barcode.scan(frame), self.text.recognize(frame))
        };

        let (barcodes, text) = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Frame analysis cancelled");
                return Ok(None);
            }
            results = recognition => results,
        };

        let barcodes = barcodes.unwrap_or_else(|e| {
            warn!("{}; no barcode this frame", e);
            Vec::new()
        });
        let text = text.unwrap_or_else(|e| {
            warn!("{}; no text this frame", e);
            RecognizedText::default()
        });

        self.interpreter.interpret(frame, &barcodes, &text).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scan::{TrackingType, ValidationStatus};
    use crate::ocr::BarcodeFormat;
    use std::time::Duration;

    struct FixedBarcodes {
        detections: Vec<BarcodeDetection>,
        delay: Duration,
    }

    impl BarcodeReader for FixedBarcodes {
        async fn scan(&self, _frame: &Frame) -> std::result::Result<Vec<BarcodeDetection>, RecognitionError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.detections.clone())
        }
    }

    struct FailingBarcodes;

    impl BarcodeReader for FailingBarcodes {
        async fn scan(&self, _frame: &Frame) -> std::result::Result<Vec<BarcodeDetection>, RecognitionError> {
            Err(RecognitionError::Barcode("engine not ready".to_string()))
        }
    }

    struct FixedText(String);

    impl TextReader for FixedText {
        async fn recognize(&self, _frame: &Frame) -> std::result::Result<RecognizedText, RecognitionError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(RecognizedText::flat(self.0.clone()))
        }
    }

    struct FailingText;

    impl TextReader for FailingText {
        async fn recognize(&self, _frame: &Frame) -> std::result::Result<RecognizedText, RecognitionError> {
            Err(RecognitionError::Text("timeout".to_string()))
        }
    }

    fn datamatrix() -> FixedBarcodes {
        FixedBarcodes {
            detections: vec![BarcodeDetection::new(
                BarcodeFormat::DataMatrix,
                "%123456786912345678901",
            )],
            delay: Duration::from_millis(30),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_joins_both_engines() {
        let analyzer = FrameAnalyzer::new(
            datamatrix(),
            FixedText("MME DUPONT\n75001 PARIS\n86912345678901 U".to_string()),
        );
        let (_handle, token) = cancel_pair();

        let analysis = analyzer.analyze(&Frame::default(), &token).await.unwrap().unwrap();
        let obs = analysis.observation;
        assert_eq!(obs.tracking_number.as_deref(), Some("86912345678901U"));
        assert_eq!(obs.confidence_status, ValidationStatus::Verified);
        assert_eq!(obs.raw_address_text.as_deref(), Some("MME DUPONT\n75001 PARIS"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_engine_degrades_to_absent() {
        let analyzer = FrameAnalyzer::new(
            FailingBarcodes,
            FixedText("SD : 86912345678901 U\nMME DUPONT\n75001 PARIS".to_string()),
        );
        let (_handle, token) = cancel_pair();

        let obs = analyzer
            .analyze(&Frame::default(), &token)
            .await
            .unwrap()
            .unwrap()
            .observation;
        assert_eq!(obs.tracking_number.as_deref(), Some("86912345678901U"));
        assert_eq!(obs.tracking_type, Some(TrackingType::SmartdataDatamatrix));

        let analyzer = FrameAnalyzer::new(datamatrix(), FailingText);
        let obs = analyzer
            .analyze(&Frame::default(), &token)
            .await
            .unwrap()
            .unwrap()
            .observation;
        assert_eq!(obs.tracking_number.as_deref(), Some("86912345678901U"));
        assert_eq!(obs.confidence_status, ValidationStatus::Calculated);
        assert_eq!(obs.raw_address_text, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_in_flight_recognition() {
        let analyzer = FrameAnalyzer::new(
            FixedBarcodes {
                detections: Vec::new(),
                delay: Duration::from_secs(10),
            },
            FixedText(String::new()),
        );
        let (handle, token) = cancel_pair();
        let frame = Frame::default();

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.cancel();
        };
        let (result, ()) = tokio::join!(analyzer.analyze(&frame, &token), cancel);

        assert!(result.unwrap().is_none());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_handle_never_cancels() {
        let (handle, token) = cancel_pair();
        drop(handle);
        let analyzer = FrameAnalyzer::new(datamatrix(), FixedText(String::new()));
        assert!(analyzer.analyze(&Frame::default(), &token).await.unwrap().is_some());
    }
}
