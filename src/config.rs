//! Configuration types for building a gift book.
//!
//! All ingestion behaviour is controlled through [`GiftBookConfig`], built via
//! its [`GiftBookConfigBuilder`]. Setters clamp out-of-range values; `build()`
//! rejects combinations that still make no sense.

use crate::error::GiftBookError;
use crate::messages::Locale;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default oversampling factor: 2.5 pixels per PDF point keeps text crisp
/// when the reader zooms to 140 %.
pub const DEFAULT_SCALE: f32 = 2.5;

/// Storage key under which bookmarks are persisted.
pub const DEFAULT_BOOKMARK_KEY: &str = "current_book";

/// Configuration for turning PDF sources into a book.
///
/// # Example
/// ```rust
/// use giftbook::{GiftBookConfig, PageNumbering};
///
/// let config = GiftBookConfig::builder()
///     .scale(2.0)
///     .numbering(PageNumbering::Continuous)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale, 2.0);
/// ```
#[derive(Clone)]
pub struct GiftBookConfig {
    /// Pixels per PDF point when rasterising. Range: 0.25–8.0. Default: 2.5.
    pub scale: f32,

    /// How the page-number stamp is drawn.
    pub stamp: StampStyle,

    /// Whether numbering restarts per source or runs across the book.
    pub numbering: PageNumbering,

    /// User password for encrypted PDFs.
    pub password: Option<String>,

    /// Language for progress lines and reader-facing errors.
    pub locale: Locale,

    /// Key under which the bookmark list is persisted.
    pub bookmark_key: String,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GiftBookConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            stamp: StampStyle::default(),
            numbering: PageNumbering::default(),
            password: None,
            locale: Locale::default(),
            bookmark_key: DEFAULT_BOOKMARK_KEY.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GiftBookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiftBookConfig")
            .field("scale", &self.scale)
            .field("stamp", &self.stamp)
            .field("numbering", &self.numbering)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("locale", &self.locale)
            .field("bookmark_key", &self.bookmark_key)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn IngestProgressCallback>"),
            )
            .finish()
    }
}

impl GiftBookConfig {
    /// Create a new builder for `GiftBookConfig`.
    pub fn builder() -> GiftBookConfigBuilder {
        GiftBookConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GiftBookConfig`].
#[derive(Debug)]
pub struct GiftBookConfigBuilder {
    config: GiftBookConfig,
}

impl GiftBookConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = if scale.is_finite() {
            scale.clamp(0.25, 8.0)
        } else {
            scale
        };
        self
    }

    pub fn stamp(mut self, stamp: StampStyle) -> Self {
        self.config.stamp = stamp;
        self
    }

    /// Turn the page-number stamp on or off, keeping the rest of the style.
    pub fn stamp_page_numbers(mut self, enabled: bool) -> Self {
        self.config.stamp.enabled = enabled;
        self
    }

    pub fn numbering(mut self, numbering: PageNumbering) -> Self {
        self.config.numbering = numbering;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.config.locale = locale;
        self
    }

    pub fn bookmark_key(mut self, key: impl Into<String>) -> Self {
        self.config.bookmark_key = key.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GiftBookConfig, GiftBookError> {
        let c = &self.config;
        if !c.scale.is_finite() || !(0.25..=8.0).contains(&c.scale) {
            return Err(GiftBookError::InvalidConfig(format!(
                "scale must be 0.25–8.0, got {}",
                c.scale
            )));
        }
        if !(c.stamp.font_ratio > 0.0 && c.stamp.font_ratio < 0.5) {
            return Err(GiftBookError::InvalidConfig(format!(
                "stamp font ratio must be in (0, 0.5), got {}",
                c.stamp.font_ratio
            )));
        }
        if !(c.stamp.padding_ratio >= 0.0 && c.stamp.padding_ratio < 0.5) {
            return Err(GiftBookError::InvalidConfig(format!(
                "stamp padding ratio must be in [0, 0.5), got {}",
                c.stamp.padding_ratio
            )));
        }
        if c.bookmark_key.trim().is_empty() {
            return Err(GiftBookError::InvalidConfig(
                "bookmark key must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Stamp style ──────────────────────────────────────────────────────────

/// Appearance of the page number baked into each rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampStyle {
    /// Draw the number at all. Default: true.
    pub enabled: bool,
    /// Font size as a fraction of the rendered page height. Default: 0.018.
    pub font_ratio: f32,
    /// Gap between the text bottom and the page bottom, as a fraction of the
    /// page height. Default: 0.015.
    pub padding_ratio: f32,
    /// RGBA fill colour. Default: `#333333`, opaque.
    pub color: [u8; 4],
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            font_ratio: 0.018,
            padding_ratio: 0.015,
            color: [0x33, 0x33, 0x33, 0xff],
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How stamped page numbers relate to the sources of a multi-file book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageNumbering {
    /// Every source starts again at 1 (default).
    #[default]
    PerSource,
    /// Numbers run 1..=N across the whole book.
    Continuous,
}

impl PageNumbering {
    /// The numeral to stamp on a page.
    ///
    /// `page_in_source` is 1-based, `pages_before` counts pages of earlier
    /// sources.
    pub fn number_for(&self, page_in_source: usize, pages_before: usize) -> usize {
        match self {
            PageNumbering::PerSource => page_in_source,
            PageNumbering::Continuous => pages_before + page_in_source,
        }
    }
}

impl std::str::FromStr for PageNumbering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-source" | "restart" => Ok(PageNumbering::PerSource),
            "continuous" | "book" => Ok(PageNumbering::Continuous),
            other => Err(format!(
                "unknown numbering '{other}' (expected per-source or continuous)"
            )),
        }
    }
}
