//! Vertex/fragment shader input records and their semantics.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{MaterialError, Result};
use crate::io;
use crate::precision::Precision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    UVec2,
    UVec3,
    UVec4,
    Mat4,
}

impl InputType {
    pub const ALL: [InputType; 13] = [
        InputType::Float,
        InputType::Vec2,
        InputType::Vec3,
        InputType::Vec4,
        InputType::Int,
        InputType::IVec2,
        InputType::IVec3,
        InputType::IVec4,
        InputType::UInt,
        InputType::UVec2,
        InputType::UVec3,
        InputType::UVec4,
        InputType::Mat4,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MaterialError::UnknownEnum {
                kind: "input type",
                value: value as u32,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            InputType::Float => "float",
            InputType::Vec2 => "vec2",
            InputType::Vec3 => "vec3",
            InputType::Vec4 => "vec4",
            InputType::Int => "int",
            InputType::IVec2 => "ivec2",
            InputType::IVec3 => "ivec3",
            InputType::IVec4 => "ivec4",
            InputType::UInt => "uint",
            InputType::UVec2 => "uvec2",
            InputType::UVec3 => "uvec3",
            InputType::UVec4 => "uvec4",
            InputType::Mat4 => "mat4",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "input type",
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Flat,
    Smooth,
    NoPerspective,
    Centroid,
}

impl Interpolation {
    pub const ALL: [Interpolation; 4] = [
        Interpolation::Flat,
        Interpolation::Smooth,
        Interpolation::NoPerspective,
        Interpolation::Centroid,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MaterialError::UnknownEnum {
                kind: "interpolation",
                value: value as u32,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Interpolation::Flat => "flat",
            Interpolation::Smooth => "smooth",
            Interpolation::NoPerspective => "noperspective",
            Interpolation::Centroid => "centroid",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "interpolation",
                name: name.to_string(),
            })
    }
}

/// `(semantic, attribute variable, ranged)`; ranged semantics carry a
/// sub-index suffix (`TEXCOORD0` .. `TEXCOORD8`, `COLOR0` .. `COLOR3`).
const SEMANTICS: &[(&str, &str, bool)] = &[
    ("POSITION", "position", false),
    ("NORMAL", "normal", false),
    ("TANGENT", "tangent", false),
    ("BITANGENT", "bitangent", false),
    ("COLOR", "color", true),
    ("BLENDINDICES", "indices", false),
    ("BLENDWEIGHT", "weight", false),
    ("TEXCOORD", "texcoord", true),
    ("UNKNOWN", "unknown", true),
    ("FRONTFACING", "frontFacing", false),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSemantic {
    pub index: u8,
    pub sub_index: u8,
}

impl InputSemantic {
    pub fn name(&self) -> String {
        let (name, _, ranged) = SEMANTICS[self.index as usize];
        if ranged {
            format!("{name}{}", self.sub_index)
        } else {
            name.to_string()
        }
    }

    pub fn variable_name(&self) -> String {
        let (_, variable, ranged) = SEMANTICS[self.index as usize];
        if ranged {
            format!("{variable}{}", self.sub_index)
        } else {
            variable.to_string()
        }
    }

    pub fn from_name(name: &str) -> Self {
        for (index, (semantic, _, _)) in SEMANTICS.iter().enumerate() {
            if let Some(rest) = name.strip_prefix(semantic) {
                let sub_index = rest.parse().unwrap_or(0);
                return InputSemantic {
                    index: index as u8,
                    sub_index,
                };
            }
        }
        InputSemantic::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInput {
    pub name: String,
    pub input_type: InputType,
    pub semantic: InputSemantic,
    pub per_instance: bool,
    pub precision: Option<Precision>,
    pub interpolation: Option<Interpolation>,
}

impl Default for ShaderInput {
    fn default() -> Self {
        Self {
            name: String::new(),
            input_type: InputType::Float,
            semantic: InputSemantic::default(),
            per_instance: false,
            precision: None,
            interpolation: None,
        }
    }
}

impl ShaderInput {
    pub(crate) fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let name = io::read_string(reader)?;
        let input_type = InputType::from_value(io::read_u8(reader)?)?;
        let semantic = InputSemantic {
            index: io::read_u8(reader)?,
            sub_index: io::read_u8(reader)?,
        };
        let per_instance = io::read_bool(reader)?;
        let precision = if io::read_bool(reader)? {
            Some(Precision::from_value(io::read_u8(reader)?)?)
        } else {
            None
        };
        let interpolation = if io::read_bool(reader)? {
            Some(Interpolation::from_value(io::read_u8(reader)?)?)
        } else {
            None
        };
        Ok(Self {
            name,
            input_type,
            semantic,
            per_instance,
            precision,
            interpolation,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_string(writer, &self.name)?;
        io::write_u8(writer, self.input_type.value())?;
        io::write_u8(writer, self.semantic.index)?;
        io::write_u8(writer, self.semantic.sub_index)?;
        io::write_bool(writer, self.per_instance)?;
        io::write_bool(writer, self.precision.is_some())?;
        if let Some(precision) = self.precision {
            io::write_u8(writer, precision.value())?;
        }
        io::write_bool(writer, self.interpolation.is_some())?;
        if let Some(interpolation) = self.interpolation {
            io::write_u8(writer, interpolation.value())?;
        }
        Ok(())
    }

    pub(crate) fn properties(&self) -> ShaderInputProperties {
        ShaderInputProperties {
            name: self.name.clone(),
            input_type: self.input_type.name().to_string(),
            semantic: self.semantic.name(),
            per_instance: self.per_instance,
            precision: self.precision.map(|p| p.name()).unwrap_or("").to_string(),
            interpolation: self
                .interpolation
                .map(|i| i.name())
                .unwrap_or("")
                .to_string(),
        }
    }

    pub(crate) fn from_properties(properties: &ShaderInputProperties) -> Result<Self> {
        Ok(Self {
            name: properties.name.clone(),
            input_type: InputType::from_name(&properties.input_type)?,
            semantic: InputSemantic::from_name(&properties.semantic),
            per_instance: properties.per_instance,
            precision: if properties.precision.is_empty() {
                None
            } else {
                Some(Precision::from_name(&properties.precision)?)
            },
            interpolation: if properties.interpolation.is_empty() {
                None
            } else {
                Some(Interpolation::from_name(&properties.interpolation)?)
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShaderInputProperties {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub semantic: String,
    pub per_instance: bool,
    #[serde(default)]
    pub precision: String,
    #[serde(default)]
    pub interpolation: String,
}
