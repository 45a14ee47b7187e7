//! Display configuration
//!
//! A [`Configuration`] is an immutable snapshot of everything the host
//! passes at creation time. Updates construct a new snapshot and hand it to
//! the [`ConfigurationStore`], which reports what changed.

use crate::error::ConfigError;
use crate::fit::FitPolicy;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the document bytes come from
#[derive(Clone, PartialEq)]
pub enum DocumentSource {
    File(PathBuf),
    Bytes(Arc<[u8]>),
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

/// Document password, kept out of logs
#[derive(Clone, Default, PartialEq, Eq)]
struct Password(String);

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("\"\"")
        } else {
            f.write_str("\"***\"")
        }
    }
}

/// Opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::from_argb(0xFFFF_FFFF);

    /// Decodes `0xAARRGGBB`; the alpha byte is ignored
    pub const fn from_argb(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }
}

/// Device orientation as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "Orientation.portrait" | "portrait" => Some(Self::Portrait),
            "Orientation.landscape" | "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }
}

/// Visual settings pushed to the surface as one unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub background_color: Rgb,
    pub spacing: f64,
    pub auto_spacing: bool,
    pub night_mode: bool,
    pub swipe_horizontal: bool,
    pub page_fling: bool,
    pub page_snap: bool,
    pub fit_each_page: bool,
    pub enable_double_tap: bool,
}

/// Recognized configuration fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Source,
    Password,
    FitPolicy,
    FitEachPage,
    SwipeHorizontal,
    PageFling,
    PageSnap,
    EnableSwipe,
    EnableDoubleTap,
    DefaultPage,
    DefaultZoomFactor,
    MinZoom,
    MaxZoom,
    BackgroundColor,
    Spacing,
    AutoSpacing,
    NightMode,
    ShowScrollbar,
    HasOnLinkHandle,
}

impl ConfigField {
    fn is_visual(self) -> bool {
        matches!(
            self,
            Self::BackgroundColor
                | Self::Spacing
                | Self::AutoSpacing
                | Self::NightMode
                | Self::SwipeHorizontal
                | Self::PageFling
                | Self::PageSnap
                | Self::FitEachPage
                | Self::EnableDoubleTap
        )
    }
}

/// Fields that differ between two configurations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiff {
    changed: Vec<ConfigField>,
}

impl ConfigDiff {
    pub fn contains(&self, field: ConfigField) -> bool {
        self.changed.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn fields(&self) -> &[ConfigField] {
        &self.changed
    }

    /// The unit scale depends on the fit policy only
    pub fn needs_rescale(&self) -> bool {
        self.contains(ConfigField::FitPolicy)
    }

    pub fn needs_zoom_bounds(&self) -> bool {
        self.contains(ConfigField::MinZoom) || self.contains(ConfigField::MaxZoom)
    }

    pub fn needs_appearance(&self) -> bool {
        self.changed.iter().any(|field| field.is_visual())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfiguration {
    #[serde(default)]
    file_path: Option<PathBuf>,
    #[serde(default)]
    bytes: Option<Vec<u8>>,
    fit_policy: FitPolicy,
    swipe_horizontal: bool,
    page_fling: bool,
    page_snap: bool,
    enable_swipe: bool,
    enable_double_tap: bool,
    default_page: usize,
    default_zoom_factor: f64,
    min_zoom: f64,
    max_zoom: f64,
    password: String,
    background_color: i64,
    spacing: f64,
    night_mode: bool,
    #[serde(alias = "enableDefaultScrollHandle")]
    show_scrollbar: bool,
    #[serde(default)]
    auto_spacing: bool,
    #[serde(default)]
    fit_each_page: bool,
    #[serde(default)]
    has_on_link_handle: bool,
}

/// Immutable snapshot of the display options
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    source: DocumentSource,
    password: Password,
    fit_policy: FitPolicy,
    fit_each_page: bool,
    swipe_horizontal: bool,
    page_fling: bool,
    page_snap: bool,
    enable_swipe: bool,
    enable_double_tap: bool,
    default_page: usize,
    default_zoom_factor: f64,
    min_zoom: f64,
    max_zoom: f64,
    background_color: Rgb,
    spacing: f64,
    auto_spacing: bool,
    night_mode: bool,
    show_scrollbar: bool,
    has_on_link_handle: bool,
}

impl TryFrom<RawConfiguration> for Configuration {
    type Error = ConfigError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        let source = match (raw.file_path, raw.bytes) {
            (Some(path), None) => DocumentSource::File(path),
            (None, Some(bytes)) => DocumentSource::Bytes(bytes.into()),
            _ => return Err(ConfigError::AmbiguousSource),
        };

        Ok(Self {
            source,
            password: Password(raw.password),
            fit_policy: raw.fit_policy,
            fit_each_page: raw.fit_each_page,
            swipe_horizontal: raw.swipe_horizontal,
            page_fling: raw.page_fling,
            page_snap: raw.page_snap,
            enable_swipe: raw.enable_swipe,
            enable_double_tap: raw.enable_double_tap,
            default_page: raw.default_page,
            default_zoom_factor: raw.default_zoom_factor,
            min_zoom: raw.min_zoom,
            max_zoom: raw.max_zoom,
            // Android hands over signed ints, Dart over unsigned ones
            background_color: Rgb::from_argb(raw.background_color as u32),
            spacing: raw.spacing.max(0.0),
            auto_spacing: raw.auto_spacing,
            night_mode: raw.night_mode,
            show_scrollbar: raw.show_scrollbar,
            has_on_link_handle: raw.has_on_link_handle,
        })
    }
}

impl Configuration {
    /// Configuration with the plugin defaults for the given source
    pub fn new(source: DocumentSource) -> Self {
        Self {
            source,
            password: Password::default(),
            fit_policy: FitPolicy::Both,
            fit_each_page: false,
            swipe_horizontal: false,
            page_fling: true,
            page_snap: true,
            enable_swipe: true,
            enable_double_tap: true,
            default_page: 0,
            default_zoom_factor: 1.0,
            min_zoom: 0.5,
            max_zoom: 4.0,
            background_color: Rgb::WHITE,
            spacing: 0.0,
            auto_spacing: false,
            night_mode: false,
            show_scrollbar: true,
            has_on_link_handle: false,
        }
    }

    /// Decodes a channel payload. Unknown keys are ignored.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let raw = RawConfiguration::deserialize(value)?;
        raw.try_into()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfiguration = serde_json::from_str(json)?;
        raw.try_into()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Copy of this configuration that opens at `page`
    pub fn with_default_page(&self, page: usize) -> Self {
        Self {
            default_page: page,
            ..self.clone()
        }
    }

    pub fn with_source(self, source: DocumentSource) -> Self {
        Self { source, ..self }
    }

    pub fn with_fit_policy(self, fit_policy: FitPolicy) -> Self {
        Self { fit_policy, ..self }
    }

    pub fn with_zoom(self, default_zoom_factor: f64, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            default_zoom_factor,
            min_zoom,
            max_zoom,
            ..self
        }
    }

    pub fn with_swipe(self, enable_swipe: bool, swipe_horizontal: bool) -> Self {
        Self {
            enable_swipe,
            swipe_horizontal,
            ..self
        }
    }

    pub fn with_scrollbar(self, show_scrollbar: bool) -> Self {
        Self {
            show_scrollbar,
            ..self
        }
    }

    pub fn with_night_mode(self, night_mode: bool) -> Self {
        Self { night_mode, ..self }
    }

    pub fn with_background_color(self, background_color: Rgb) -> Self {
        Self {
            background_color,
            ..self
        }
    }

    pub fn with_link_handle(self, has_on_link_handle: bool) -> Self {
        Self {
            has_on_link_handle,
            ..self
        }
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    pub fn password(&self) -> &str {
        &self.password.0
    }

    pub fn fit_policy(&self) -> FitPolicy {
        self.fit_policy
    }

    pub fn swipe_horizontal(&self) -> bool {
        self.swipe_horizontal
    }

    pub fn enable_swipe(&self) -> bool {
        self.enable_swipe
    }

    pub fn default_page(&self) -> usize {
        self.default_page
    }

    pub fn default_zoom_factor(&self) -> f64 {
        self.default_zoom_factor
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn show_scrollbar(&self) -> bool {
        self.show_scrollbar
    }

    pub fn has_on_link_handle(&self) -> bool {
        self.has_on_link_handle
    }

    pub fn appearance(&self) -> Appearance {
        Appearance {
            background_color: self.background_color,
            spacing: self.spacing,
            auto_spacing: self.auto_spacing,
            night_mode: self.night_mode,
            swipe_horizontal: self.swipe_horizontal,
            page_fling: self.page_fling,
            page_snap: self.page_snap,
            fit_each_page: self.fit_each_page,
            enable_double_tap: self.enable_double_tap,
        }
    }

    /// Fields whose value differs in `other`
    pub fn diff(&self, other: &Self) -> ConfigDiff {
        let checks = [
            (ConfigField::Source, self.source != other.source),
            (ConfigField::Password, self.password != other.password),
            (ConfigField::FitPolicy, self.fit_policy != other.fit_policy),
            (ConfigField::FitEachPage, self.fit_each_page != other.fit_each_page),
            (ConfigField::SwipeHorizontal, self.swipe_horizontal != other.swipe_horizontal),
            (ConfigField::PageFling, self.page_fling != other.page_fling),
            (ConfigField::PageSnap, self.page_snap != other.page_snap),
            (ConfigField::EnableSwipe, self.enable_swipe != other.enable_swipe),
            (ConfigField::EnableDoubleTap, self.enable_double_tap != other.enable_double_tap),
            (ConfigField::DefaultPage, self.default_page != other.default_page),
            (ConfigField::DefaultZoomFactor, self.default_zoom_factor != other.default_zoom_factor),
            (ConfigField::MinZoom, self.min_zoom != other.min_zoom),
            (ConfigField::MaxZoom, self.max_zoom != other.max_zoom),
            (ConfigField::BackgroundColor, self.background_color != other.background_color),
            (ConfigField::Spacing, self.spacing != other.spacing),
            (ConfigField::AutoSpacing, self.auto_spacing != other.auto_spacing),
            (ConfigField::NightMode, self.night_mode != other.night_mode),
            (ConfigField::ShowScrollbar, self.show_scrollbar != other.show_scrollbar),
            (ConfigField::HasOnLinkHandle, self.has_on_link_handle != other.has_on_link_handle),
        ];

        ConfigDiff {
            changed: checks
                .into_iter()
                .filter_map(|(field, changed)| changed.then_some(field))
                .collect(),
        }
    }
}

/// Holds the active configuration and swaps it wholesale
#[derive(Debug, Clone)]
pub struct ConfigurationStore {
    current: Configuration,
}

impl ConfigurationStore {
    pub fn new(configuration: Configuration) -> Self {
        Self {
            current: configuration,
        }
    }

    pub fn current(&self) -> &Configuration {
        &self.current
    }

    /// Replaces the snapshot and returns the fields that changed
    pub fn apply(&mut self, next: Configuration) -> ConfigDiff {
        let diff = self.current.diff(&next);
        self.current = next;
        diff
    }
}
