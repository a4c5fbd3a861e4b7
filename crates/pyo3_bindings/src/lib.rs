//! PyO3 bindings for the opal auction bid engine.
//!
//! Exposes the Rust pipeline to the Python-side monitor:
//! - Bid scanning over page text or HTML
//! - Per-auction seen-set bookkeeping
//! - Visible-text extraction and name cleaning helpers

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use opal_core::{
    seen_key, AuctionFloor, BidUpdate as RustBidUpdate, EngineOptions, Error as RustError,
    MemorySeenSet, OptionOverrides, ScanResult as RustScanResult, SeenSet, SourceHints,
};
use opal_detection::BidEngine as RustBidEngine;

fn to_py_err(err: RustError) -> PyErr {
    match err {
        RustError::MalformedOptions(_) | RustError::InputTooLarge { .. } => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// A new bid found by a scan.
#[pyclass]
#[derive(Clone)]
pub struct BidUpdate {
    #[pyo3(get)]
    pub amount: f64,
    #[pyo3(get)]
    pub bidder_name: String,
    #[pyo3(get)]
    pub confidence: f64,
    #[pyo3(get)]
    pub pattern_kind: String,
    #[pyo3(get)]
    pub raw_match: String,
    #[pyo3(get)]
    pub position: usize,
}

#[pymethods]
impl BidUpdate {
    fn __repr__(&self) -> String {
        format!(
            "BidUpdate(amount={}, bidder_name={:?}, confidence={:.2}, pattern_kind={:?})",
            self.amount, self.bidder_name, self.confidence, self.pattern_kind
        )
    }
}

impl From<RustBidUpdate> for BidUpdate {
    fn from(u: RustBidUpdate) -> Self {
        BidUpdate {
            amount: u.amount,
            bidder_name: u.bidder_name,
            confidence: u.confidence,
            pattern_kind: u.pattern_kind.as_str().to_string(),
            raw_match: u.raw_match,
            position: u.position,
        }
    }
}

/// Outcome of one scan.
#[pyclass]
#[derive(Clone)]
pub struct ScanOutcome {
    #[pyo3(get)]
    pub found: bool,
    #[pyo3(get)]
    pub update: Option<BidUpdate>,
    json: String,
}

#[pymethods]
impl ScanOutcome {
    #[getter]
    fn amount(&self) -> Option<f64> {
        self.update.as_ref().map(|u| u.amount)
    }

    #[getter]
    fn bidder_name(&self) -> Option<String> {
        self.update.as_ref().map(|u| u.bidder_name.clone())
    }

    /// Wire form: `{"found": false}` or `{"found": true, "amount": ..}`.
    fn to_json(&self) -> String {
        self.json.clone()
    }

    fn __bool__(&self) -> bool {
        self.found
    }

    fn __repr__(&self) -> String {
        match &self.update {
            Some(u) => format!("ScanOutcome(found=True, {})", u.__repr__()),
            None => "ScanOutcome(found=False)".to_string(),
        }
    }
}

impl From<RustScanResult> for ScanOutcome {
    fn from(r: RustScanResult) -> Self {
        let json = serde_json::to_string(&r).unwrap_or_else(|_| "{\"found\":false}".to_string());
        ScanOutcome {
            found: r.is_found(),
            update: r.into_update().map(BidUpdate::from),
            json,
        }
    }
}

// ============================================================================
// Python-exposed Engine Classes
// ============================================================================

/// Bid engine with an in-process seen-set.
#[pyclass(name = "BidEngine")]
pub struct PyBidEngine {
    inner: RustBidEngine,
    seen: MemorySeenSet,
}

#[pymethods]
impl PyBidEngine {
    #[new]
    #[pyo3(signature = (
        min_amount=None,
        max_amount=None,
        max_jump=None,
        reject_amounts=None,
        require_facebook_markers=None,
        profile=None,
        no_max_jump=false,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        min_amount: Option<f64>,
        max_amount: Option<f64>,
        max_jump: Option<f64>,
        reject_amounts: Option<Vec<f64>>,
        require_facebook_markers: Option<bool>,
        profile: Option<&str>,
        no_max_jump: bool,
    ) -> PyResult<Self> {
        if no_max_jump && max_jump.is_some() {
            return Err(PyValueError::new_err(
                "max_jump and no_max_jump are mutually exclusive",
            ));
        }
        let base = EngineOptions::profile(profile.unwrap_or("default")).map_err(to_py_err)?;
        let overrides = OptionOverrides {
            min_amount,
            max_amount,
            max_jump: if no_max_jump { Some(None) } else { max_jump.map(Some) },
            reject_amounts,
            require_facebook_markers,
        };
        let options = overrides.apply(base).map_err(to_py_err)?;

        Ok(PyBidEngine {
            inner: RustBidEngine::new(options).map_err(to_py_err)?,
            seen: MemorySeenSet::new(),
        })
    }

    /// Create from a JSON options document.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let options = EngineOptions::from_json(json).map_err(to_py_err)?;
        Ok(PyBidEngine {
            inner: RustBidEngine::new(options).map_err(to_py_err)?,
            seen: MemorySeenSet::new(),
        })
    }

    /// Scan page text for a new bid.
    #[pyo3(signature = (auction_id, text, current_bid=0.0, starting_bid=0.0, facebook=None))]
    fn scan(
        &mut self,
        auction_id: &str,
        text: &str,
        current_bid: f64,
        starting_bid: f64,
        facebook: Option<bool>,
    ) -> PyResult<ScanOutcome> {
        let floor = AuctionFloor::new(current_bid, starting_bid);
        let hints = SourceHints {
            has_facebook_chrome: facebook,
        };
        self.inner
            .scan_with_hints(auction_id, text, &floor, &mut self.seen, hints)
            .map(ScanOutcome::from)
            .map_err(to_py_err)
    }

    /// Scan raw page HTML for a new bid.
    #[pyo3(signature = (auction_id, html, current_bid=0.0, starting_bid=0.0))]
    fn scan_html(
        &mut self,
        auction_id: &str,
        html: &str,
        current_bid: f64,
        starting_bid: f64,
    ) -> PyResult<ScanOutcome> {
        let floor = AuctionFloor::new(current_bid, starting_bid);
        self.inner
            .scan_html(auction_id, html, &floor, &mut self.seen)
            .map(ScanOutcome::from)
            .map_err(to_py_err)
    }

    /// Every valid bid in the text, ranked. Does not mark anything reported.
    #[pyo3(signature = (text, current_bid=0.0, starting_bid=0.0))]
    fn evaluate(&self, text: &str, current_bid: f64, starting_bid: f64) -> PyResult<Vec<BidUpdate>> {
        let floor = AuctionFloor::new(current_bid, starting_bid);
        let bids = self
            .inner
            .evaluate(text, &floor, SourceHints::default())
            .map_err(to_py_err)?;
        Ok(bids
            .into_iter()
            .map(|b| BidUpdate::from(b.into_update()))
            .collect())
    }

    /// Has this bid already been reported for the auction?
    fn was_already_reported(&self, auction_id: &str, amount: f64, bidder_name: &str) -> bool {
        self.seen.has(&seen_key(auction_id, amount, bidder_name))
    }

    /// Record a bid as reported.
    fn mark_reported(&mut self, auction_id: &str, amount: f64, bidder_name: &str) {
        self.seen.add(&seen_key(auction_id, amount, bidder_name));
    }

    /// Forget every reported bid of one auction.
    fn forget_auction(&mut self, auction_id: &str) {
        self.seen.forget_auction(auction_id);
    }

    /// Number of reported bids across all auctions.
    fn reported_count(&self) -> usize {
        self.seen.len()
    }
}

// ============================================================================
// Module Functions
// ============================================================================

/// Newline-structured visible text of an HTML document.
#[pyfunction]
fn visible_text(html: &str) -> String {
    opal_ingestion::visible_text(html)
}

/// Clean a raw bidder name; `None` when nothing name-like survives.
#[pyfunction]
fn clean_name(raw: &str) -> Option<String> {
    opal_detection::clean_name(raw)
}

// ============================================================================
// Module Definition
// ============================================================================

/// Opal Bid Engine - bid extraction for Facebook opal auctions.
#[pymodule]
fn opal_bid_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<BidUpdate>()?;
    m.add_class::<ScanOutcome>()?;

    // Engine classes
    m.add_class::<PyBidEngine>()?;

    // Functions
    m.add_function(wrap_pyfunction!(visible_text, m)?)?;
    m.add_function(wrap_pyfunction!(clean_name, m)?)?;

    Ok(())
}

