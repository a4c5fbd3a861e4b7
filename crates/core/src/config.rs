//! Configuration structures for the opal bid engine.
//!
//! Every threshold here is a tunable, not an invariant. The defaults were
//! carried over from observed Facebook scrapes and are expected to be
//! adjusted per deployment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Engine options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Smallest plausible bid.
    pub min_amount: f64,
    /// Largest plausible bid.
    pub max_amount: f64,
    /// Largest accepted raise over the floor once an auction has a current
    /// bid. `None` disables the check.
    pub max_jump: Option<f64>,
    /// Amounts that are never bids (shipping prices, recurring scrape noise).
    pub reject_amounts: Vec<f64>,
    /// Require Facebook comment markers for every pattern kind, not only the
    /// low-trust ones.
    pub require_facebook_markers: bool,
    /// Candidate scanner configuration.
    pub scanner: ScannerConfig,
    /// Context rejection configuration.
    pub context: ContextConfig,
    /// Confidence scoring configuration.
    pub scoring: ScoringConfig,
    /// Input size configuration.
    pub input: InputConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            min_amount: 1.0,
            max_amount: 10_000.0,
            max_jump: Some(100.0),
            reject_amounts: vec![12.0, 12.5, 20.0, 28.0, 2833.0],
            require_facebook_markers: false,
            scanner: ScannerConfig::default(),
            context: ContextConfig::default(),
            scoring: ScoringConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl EngineOptions {
    /// Tighter range for scraping arbitrary auction sites.
    pub fn generic_site() -> Self {
        Self {
            min_amount: 5.0,
            max_amount: 2_000.0,
            ..Self::default()
        }
    }

    /// Range used inside a Facebook page, where comment markers are always
    /// present around real bids.
    pub fn facebook_extension() -> Self {
        Self {
            min_amount: 10.0,
            max_amount: 10_000.0,
            require_facebook_markers: true,
            ..Self::default()
        }
    }

    /// Built-in profile by name: `default`, `generic_site` or `facebook`.
    pub fn profile(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Self::default()),
            "generic_site" => Ok(Self::generic_site()),
            "facebook" => Ok(Self::facebook_extension()),
            other => Err(Error::malformed_options(format!("unknown profile: {}", other))),
        }
    }

    /// Parse options from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options for programmer errors.
    pub fn validate(&self) -> Result<()> {
        if !self.min_amount.is_finite() || self.min_amount <= 0.0 {
            return Err(Error::malformed_options(format!(
                "min_amount must be a positive number, got {}",
                self.min_amount
            )));
        }
        if !self.max_amount.is_finite() {
            return Err(Error::malformed_options(format!(
                "max_amount must be finite, got {}",
                self.max_amount
            )));
        }
        if self.min_amount > self.max_amount {
            return Err(Error::malformed_options(format!(
                "min_amount ({}) exceeds max_amount ({})",
                self.min_amount, self.max_amount
            )));
        }
        if let Some(jump) = self.max_jump {
            if !jump.is_finite() || jump <= 0.0 {
                return Err(Error::malformed_options(format!(
                    "max_jump must be a positive number, got {}",
                    jump
                )));
            }
        }
        if let Some(bad) = self.reject_amounts.iter().find(|a| !a.is_finite()) {
            return Err(Error::malformed_options(format!(
                "reject_amounts contains a non-finite value: {}",
                bad
            )));
        }
        self.scanner.validate()?;
        self.context.validate()?;
        self.scoring.validate()?;
        self.input.validate()?;
        Ok(())
    }
}

/// Field overrides applied on top of a profile.
///
/// `max_jump` is doubly optional: `None` keeps the profile's value,
/// `Some(None)` turns the jump check off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionOverrides {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub max_jump: Option<Option<f64>>,
    pub reject_amounts: Option<Vec<f64>>,
    pub require_facebook_markers: Option<bool>,
}

impl OptionOverrides {
    /// Apply the overrides and validate the result.
    pub fn apply(self, mut options: EngineOptions) -> Result<EngineOptions> {
        if let Some(v) = self.min_amount {
            options.min_amount = v;
        }
        if let Some(v) = self.max_amount {
            options.max_amount = v;
        }
        if let Some(v) = self.max_jump {
            options.max_jump = v;
        }
        if let Some(v) = self.reject_amounts {
            options.reject_amounts = v;
        }
        if let Some(v) = self.require_facebook_markers {
            options.require_facebook_markers = v;
        }
        options.validate()?;
        Ok(options)
    }
}

/// Candidate scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Bytes of context captured on each side of a match.
    pub context_radius: usize,
    /// Lines shorter than this admit bare numbers without corroboration.
    pub short_text_len: usize,
    /// Distinct small integers in a window before the sequence guard looks
    /// for runs.
    pub sequence_min_distinct: usize,
    /// Consecutive-value run length that marks a window as a table or list.
    pub sequence_min_run: usize,
    /// Preceding lines searched by the name extractor's proximity step.
    pub proximity_levels: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            context_radius: 200,
            short_text_len: 50,
            sequence_min_distinct: 10,
            sequence_min_run: 5,
            proximity_levels: 5,
        }
    }
}

impl ScannerConfig {
    fn validate(&self) -> Result<()> {
        if self.context_radius == 0 {
            return Err(Error::malformed_options("scanner.context_radius must be > 0"));
        }
        if self.short_text_len == 0 {
            return Err(Error::malformed_options("scanner.short_text_len must be > 0"));
        }
        if self.sequence_min_run == 0 {
            return Err(Error::malformed_options("scanner.sequence_min_run must be > 0"));
        }
        Ok(())
    }
}

/// Context rejection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Regex patterns marking a context window as page chrome. Compiled
    /// when the engine is built.
    pub denylist: Vec<String>,
    /// Bytes before a match searched for an adjacent name.
    pub adjacent_name_span: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            adjacent_name_span: 80,
        }
    }
}

impl ContextConfig {
    fn validate(&self) -> Result<()> {
        if self.adjacent_name_span == 0 {
            return Err(Error::malformed_options("context.adjacent_name_span must be > 0"));
        }
        if let Some(empty) = self.denylist.iter().position(|p| p.trim().is_empty()) {
            return Err(Error::malformed_options(format!(
                "context.denylist[{}] is empty",
                empty
            )));
        }
        Ok(())
    }
}

/// Default technical-token denylist.
pub fn default_denylist() -> Vec<String> {
    [
        // CSS declarations
        r"(?i)\b(?:width|height|margin|padding|border(?:-radius)?|font-size|line-height|opacity|z-index|display|position)\s*:",
        r"(?i)\b(?:rgba?|hsla?)\s*\(",
        r"(?i)\b\d+(?:\.\d+)?(?:px|rem|em|pt|vh|vw)\b",
        // Media manifests
        r"(?i)\b(?:bandwidth|resolution|mimetype|framerate|codecs?|encoding|dash_vp9|representation|baseurl|fbplaybackresolution|fbquality|preview_(?:width|height))\b",
        // URLs
        r"(?i)https?://|www\.|\.(?:com|net|org)\b|fbcdn",
        // Markup attributes
        r#"(?i)\b(?:id|class|style|src|href|data-[a-z-]+)\s*=\s*["']"#,
        // Script
        r"(?i)javascript:|\bfunction\s*\(|=>",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

/// Confidence scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Starting score.
    pub base: f64,
    /// Bonus for explicit bid statements.
    pub explicit_weight: f64,
    /// Bonus for Facebook structural layouts.
    pub structural_weight: f64,
    /// Bonus for dollar-prefixed amounts.
    pub dollar_weight: f64,
    /// Bonus for currency phrases.
    pub currency_weight: f64,
    /// Bonus for bare numbers.
    pub standalone_weight: f64,
    /// Lower bound of the typical bid range.
    pub typical_min: f64,
    /// Upper bound of the typical bid range.
    pub typical_max: f64,
    /// Bonus inside the typical range.
    pub typical_bonus: f64,
    /// Penalty at the edges of the plausible range.
    pub edge_penalty: f64,
    /// Amounts below `min_amount * low_edge_factor` are at the low edge.
    pub low_edge_factor: f64,
    /// Amounts above `max_amount * high_edge_factor` are at the high edge.
    pub high_edge_factor: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 0.5,
            explicit_weight: 0.3,
            structural_weight: 0.3,
            dollar_weight: 0.2,
            currency_weight: 0.15,
            standalone_weight: 0.0,
            typical_min: 20.0,
            typical_max: 500.0,
            typical_bonus: 0.1,
            edge_penalty: 0.2,
            low_edge_factor: 2.0,
            high_edge_factor: 0.5,
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<()> {
        let weights = [
            self.base,
            self.explicit_weight,
            self.structural_weight,
            self.dollar_weight,
            self.currency_weight,
            self.standalone_weight,
            self.typical_bonus,
            self.edge_penalty,
            self.low_edge_factor,
            self.high_edge_factor,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::malformed_options("scoring weights must be finite"));
        }
        if self.typical_min > self.typical_max {
            return Err(Error::malformed_options(format!(
                "scoring.typical_min ({}) exceeds scoring.typical_max ({})",
                self.typical_min, self.typical_max
            )));
        }
        Ok(())
    }
}

/// What to do with a document larger than `max_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Scan only the trailing `max_bytes`, where the newest comments are.
    KeepTail,
    /// Fail with `Error::InputTooLarge`.
    Reject,
}

/// Input size configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Maximum document size in bytes.
    pub max_bytes: usize,
    /// Oversize handling.
    pub oversize: OversizePolicy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            oversize: OversizePolicy::KeepTail,
        }
    }
}

impl InputConfig {
    fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(Error::malformed_options("input.max_bytes must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.min_amount, 1.0);
        assert_eq!(options.max_amount, 10_000.0);
        assert_eq!(options.max_jump, Some(100.0));
        assert_eq!(options.scanner.context_radius, 200);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_profiles() {
        let generic = EngineOptions::generic_site();
        assert_eq!((generic.min_amount, generic.max_amount), (5.0, 2_000.0));
        assert!(!generic.require_facebook_markers);

        let facebook = EngineOptions::facebook_extension();
        assert_eq!((facebook.min_amount, facebook.max_amount), (10.0, 10_000.0));
        assert!(facebook.require_facebook_markers);
        assert!(facebook.validate().is_ok());
    }

    #[test]
    fn test_profile_by_name() {
        assert_eq!(
            EngineOptions::profile("facebook").unwrap(),
            EngineOptions::facebook_extension()
        );
        assert!(matches!(
            EngineOptions::profile("ebay"),
            Err(Error::MalformedOptions(_))
        ));
    }

    #[test]
    fn test_overrides_keep_or_disable_jump() {
        let kept = OptionOverrides::default()
            .apply(EngineOptions::default())
            .unwrap();
        assert_eq!(kept.max_jump, Some(100.0));

        let disabled = OptionOverrides {
            max_jump: Some(None),
            ..OptionOverrides::default()
        }
        .apply(EngineOptions::facebook_extension())
        .unwrap();
        assert_eq!(disabled.max_jump, None);
        assert_eq!(disabled.min_amount, 10.0);

        let raised = OptionOverrides {
            min_amount: Some(5.0),
            max_jump: Some(Some(250.0)),
            ..OptionOverrides::default()
        }
        .apply(EngineOptions::default())
        .unwrap();
        assert_eq!((raised.min_amount, raised.max_jump), (5.0, Some(250.0)));

        let inverted = OptionOverrides {
            min_amount: Some(50.0),
            max_amount: Some(20.0),
            ..OptionOverrides::default()
        };
        assert!(inverted.apply(EngineOptions::default()).is_err());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let options = EngineOptions {
            min_amount: 500.0,
            max_amount: 100.0,
            ..EngineOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert!(matches!(err, Error::MalformedOptions(_)));
        assert!(err.to_string().contains("min_amount (500) exceeds max_amount (100)"));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let zero_min = EngineOptions {
            min_amount: 0.0,
            ..EngineOptions::default()
        };
        assert!(zero_min.validate().is_err());

        let negative_jump = EngineOptions {
            max_jump: Some(-5.0),
            ..EngineOptions::default()
        };
        assert!(negative_jump.validate().is_err());

        let nan_reject = EngineOptions {
            reject_amounts: vec![f64::NAN],
            ..EngineOptions::default()
        };
        assert!(nan_reject.validate().is_err());

        let mut zero_input = EngineOptions::default();
        zero_input.input.max_bytes = 0;
        assert!(zero_input.validate().is_err());

        let mut inverted_typical = EngineOptions::default();
        inverted_typical.scoring.typical_min = 600.0;
        assert!(inverted_typical.validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let options = EngineOptions::from_json(
            r#"{ "min_amount": 10, "max_amount": 500, "reject_amounts": [25] }"#,
        )
        .unwrap();
        assert_eq!(options.min_amount, 10.0);
        assert_eq!(options.reject_amounts, vec![25.0]);
        assert_eq!(options.max_jump, Some(100.0));
        assert_eq!(options.scanner, ScannerConfig::default());
    }

    #[test]
    fn test_from_json_validates() {
        let err = EngineOptions::from_json(r#"{ "min_amount": 50, "max_amount": 10 }"#).unwrap_err();
        assert!(matches!(err, Error::MalformedOptions(_)));

        let err = EngineOptions::from_json("{").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_jump_can_be_disabled() {
        let options = EngineOptions::from_json(r#"{ "max_jump": null }"#).unwrap();
        assert_eq!(options.max_jump, None);
    }
}
