//! Pass-level default blend modes.

use crate::error::{MaterialError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    NoneMode,
    Replace,
    AlphaBlend,
    ColorBlendAlphaAdd,
    PreMultiplied,
    InvertColor,
    Additive,
    AdditiveAlpha,
    Multiply,
    MultiplyBoth,
    InverseSrcAlpha,
    SrcAlpha,
}

impl BlendMode {
    pub const ALL: [BlendMode; 12] = [
        BlendMode::NoneMode,
        BlendMode::Replace,
        BlendMode::AlphaBlend,
        BlendMode::ColorBlendAlphaAdd,
        BlendMode::PreMultiplied,
        BlendMode::InvertColor,
        BlendMode::Additive,
        BlendMode::AdditiveAlpha,
        BlendMode::Multiply,
        BlendMode::MultiplyBoth,
        BlendMode::InverseSrcAlpha,
        BlendMode::SrcAlpha,
    ];

    pub fn value(self) -> u16 {
        self as u16
    }

    pub fn from_value(value: u16) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MaterialError::UnknownEnum {
                kind: "blend mode",
                value: value as u32,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            BlendMode::NoneMode => "NoneMode",
            BlendMode::Replace => "Replace",
            BlendMode::AlphaBlend => "AlphaBlend",
            BlendMode::ColorBlendAlphaAdd => "ColorBlendAlphaAdd",
            BlendMode::PreMultiplied => "PreMultiplied",
            BlendMode::InvertColor => "InvertColor",
            BlendMode::Additive => "Additive",
            BlendMode::AdditiveAlpha => "AdditiveAlpha",
            BlendMode::Multiply => "Multiply",
            BlendMode::MultiplyBoth => "MultiplyBoth",
            BlendMode::InverseSrcAlpha => "InverseSrcAlpha",
            BlendMode::SrcAlpha => "SrcAlpha",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "blend mode",
                name: name.to_string(),
            })
    }
}
