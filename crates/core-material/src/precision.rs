//! GLSL precision qualifiers shared by buffers and shader inputs.

use crate::error::{MaterialError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Lowp,
    Mediump,
    Highp,
}

impl Precision {
    pub const ALL: [Precision; 3] = [Precision::Lowp, Precision::Mediump, Precision::Highp];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MaterialError::UnknownEnum {
                kind: "precision",
                value: value as u32,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Precision::Lowp => "lowp",
            Precision::Mediump => "mediump",
            Precision::Highp => "highp",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "precision",
                name: name.to_string(),
            })
    }
}
