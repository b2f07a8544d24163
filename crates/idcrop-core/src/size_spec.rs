//! Physical photo sizes: the preset catalog and the user's custom size.
//!
//! Every size is expressed in millimetres. Pixel dimensions are derived later
//! by [`crate::resolution`] from a print density, never stored here.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by photo size handling.
#[derive(Debug, Error, PartialEq)]
pub enum SizeSpecError {
    /// A dimension is zero, negative, or not a number.
    #[error("{field} must be a positive number of millimetres, got {value}")]
    InvalidDimension { field: SizeField, value: f64 },

    /// A preset key string is not in the catalog.
    #[error("unknown preset key: {0}")]
    UnknownPresetKey(String),

    /// A custom size field name is neither `width` nor `height`.
    #[error("unknown size field: {0}")]
    UnknownField(String),
}

/// A physical photo size with its usage guidelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeSpec {
    /// Display name, e.g. `여권용 (Passport)`.
    pub name: String,
    /// Width in millimetres.
    pub width_mm: f64,
    /// Height in millimetres.
    pub height_mm: f64,
    /// One-line description of the standard.
    pub description: String,
    /// Ordered guidelines shown alongside the editor.
    pub guidelines: Vec<String>,
}

impl SizeSpec {
    fn new(name: &str, width_mm: f64, height_mm: f64, description: &str, guidelines: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            width_mm,
            height_mm,
            description: description.to_string(),
            guidelines: guidelines.iter().map(|g| g.to_string()).collect(),
        }
    }

    /// The custom size a fresh editor starts with (35x45mm).
    pub fn default_custom() -> Self {
        Self::new(
            "커스텀",
            35.0,
            45.0,
            "사용자 지정 사이즈",
            &["직접 입력한 사이즈에 맞춰 이미지를 자릅니다."],
        )
    }

    /// Width over height, or `None` if either dimension is unusable.
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.validate().ok()?;
        Some(self.width_mm / self.height_mm)
    }

    /// Check both dimensions are finite and strictly positive.
    pub fn validate(&self) -> Result<(), SizeSpecError> {
        for (field, value) in [(SizeField::Width, self.width_mm), (SizeField::Height, self.height_mm)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SizeSpecError::InvalidDimension { field, value });
            }
        }
        Ok(())
    }

    /// First word of the display name; used to build export filenames.
    pub fn name_token(&self) -> &str {
        self.name.split(' ').next().unwrap_or_default()
    }
}

impl Default for SizeSpec {
    fn default() -> Self {
        Self::default_custom()
    }
}

/// Keys of the built-in catalog, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKey {
    Passport,
    IdCard,
    DriverLicense,
    VisaUs,
}

impl PresetKey {
    /// All keys in catalog order.
    pub const ALL: [PresetKey; 4] = [
        PresetKey::Passport,
        PresetKey::IdCard,
        PresetKey::DriverLicense,
        PresetKey::VisaUs,
    ];

    /// Stable string key.
    pub fn as_str(self) -> &'static str {
        match self {
            PresetKey::Passport => "passport",
            PresetKey::IdCard => "id_card",
            PresetKey::DriverLicense => "driver_license",
            PresetKey::VisaUs => "visa_us",
        }
    }

    /// The catalog entry for this key.
    pub fn spec(self) -> &'static SizeSpec {
        let index = PresetKey::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or_default();
        &catalog()[index].1
    }
}

impl fmt::Display for PresetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetKey {
    type Err = SizeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SizeSpecError::UnknownPresetKey(s.to_string()))
    }
}

/// Which size the user is working with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeSelection {
    Preset(PresetKey),
    Custom,
}

impl Default for SizeSelection {
    fn default() -> Self {
        SizeSelection::Preset(PresetKey::Passport)
    }
}

impl FromStr for SizeSelection {
    type Err = SizeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "custom" {
            return Ok(SizeSelection::Custom);
        }
        s.parse().map(SizeSelection::Preset)
    }
}

/// Editable dimension of the custom size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeField {
    Width,
    Height,
}

impl fmt::Display for SizeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeField::Width => f.write_str("width"),
            SizeField::Height => f.write_str("height"),
        }
    }
}

impl FromStr for SizeField {
    type Err = SizeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "width" => Ok(SizeField::Width),
            "height" => Ok(SizeField::Height),
            other => Err(SizeSpecError::UnknownField(other.to_string())),
        }
    }
}

fn catalog() -> &'static [(PresetKey, SizeSpec); 4] {
    static CATALOG: OnceLock<[(PresetKey, SizeSpec); 4]> = OnceLock::new();
    CATALOG.get_or_init(|| {
        [
            (
                PresetKey::Passport,
                SizeSpec::new(
                    "여권용 (Passport)",
                    35.0,
                    45.0,
                    "3.5cm x 4.5cm / 외교부 규격",
                    &[
                        "배경은 균일한 흰색이어야 하며 테두리가 없어야 합니다.",
                        "정면을 응시하고 입은 다물어야 합니다 (치아 미노출).",
                        "눈썹 전체와 얼굴 윤곽이 명확히 보여야 합니다.",
                        "모자, 머리띠, 색안경 등은 착용이 불가합니다.",
                        "어깨선이 정면을 향해야 합니다.",
                    ],
                ),
            ),
            (
                PresetKey::IdCard,
                SizeSpec::new(
                    "주민등록증용 (ID Card)",
                    35.0,
                    45.0,
                    "3.5cm x 4.5cm / 주민등록법 규격",
                    &[
                        "6개월 이내에 촬영한 사진이어야 합니다.",
                        "모자를 쓰지 않은 정면 상반신 사진이어야 합니다.",
                        "배경은 단색(가급적 밝은 색)을 권장합니다.",
                        "얼굴 크기가 너무 작지 않게 조절해 주세요.",
                    ],
                ),
            ),
            (
                PresetKey::DriverLicense,
                SizeSpec::new(
                    "운전면허증용 (Driver License)",
                    35.0,
                    45.0,
                    "3.5cm x 4.5cm / 경찰청 규격",
                    &[
                        "여권 사진 규격과 동일하게 촬영하는 것을 원칙으로 합니다.",
                        "배경색은 무배색(흰색 권장)이어야 합니다.",
                        "정면을 응시하고 탈모 상태여야 합니다.",
                        "사진 인화 시 해상도가 떨어지지 않도록 주의하세요.",
                    ],
                ),
            ),
            (
                PresetKey::VisaUs,
                SizeSpec::new(
                    "미국 비자용 (US Visa)",
                    51.0,
                    51.0,
                    "5.1cm x 5.1cm (2\"x2\") / 국무부 규격",
                    &[
                        "안경 착용이 절대 금지됩니다 (시력 교정용 포함).",
                        "배경은 반드시 흰색 또는 오프화이트여야 합니다.",
                        "정수리부터 턱까지의 길이가 전체 높이의 50~69%여야 합니다.",
                        "최근 6개월 이내에 촬영된 사진이어야 합니다.",
                    ],
                ),
            ),
        ]
    })
}

/// The preset catalog in display order.
pub fn list_presets() -> impl Iterator<Item = (PresetKey, &'static SizeSpec)> {
    catalog().iter().map(|(key, spec)| (*key, spec))
}

/// The size in effect for `selection`.
pub fn resolve_active<'a>(selection: SizeSelection, custom: &'a SizeSpec) -> &'a SizeSpec {
    match selection {
        SizeSelection::Preset(key) => key.spec(),
        SizeSelection::Custom => custom,
    }
}

/// Replace one dimension of the custom size.
///
/// No validation happens here; the exporter rejects unusable sizes when they
/// are actually used.
pub fn update_custom(custom: &SizeSpec, field: SizeField, value: f64) -> SizeSpec {
    let mut updated = custom.clone();
    match field {
        SizeField::Width => updated.width_mm = value,
        SizeField::Height => updated.height_mm = value,
    }
    updated
}
