//! Material-level uniform records.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{MaterialError, Result};
use crate::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformType {
    Vec4,
    Mat3,
    Mat4,
    External,
}

impl UniformType {
    pub fn value(self) -> u16 {
        match self {
            UniformType::Vec4 => 2,
            UniformType::Mat3 => 3,
            UniformType::Mat4 => 4,
            UniformType::External => 5,
        }
    }

    pub fn from_value(value: u16) -> Result<Self> {
        match value {
            2 => Ok(UniformType::Vec4),
            3 => Ok(UniformType::Mat3),
            4 => Ok(UniformType::Mat4),
            5 => Ok(UniformType::External),
            other => Err(MaterialError::UnknownEnum {
                kind: "uniform type",
                value: other as u32,
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UniformType::Vec4 => "vec4",
            UniformType::Mat3 => "mat3",
            UniformType::Mat4 => "mat4",
            UniformType::External => "external",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "vec4" => Ok(UniformType::Vec4),
            "mat3" => Ok(UniformType::Mat3),
            "mat4" => Ok(UniformType::Mat4),
            "external" => Ok(UniformType::External),
            other => Err(MaterialError::UnknownName {
                kind: "uniform type",
                name: other.to_string(),
            }),
        }
    }

    fn element_count(self) -> usize {
        match self {
            UniformType::Vec4 => 4,
            UniformType::Mat3 => 9,
            UniformType::Mat4 => 16,
            UniformType::External => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub name: String,
    pub uniform_type: UniformType,
    pub count: u32,
    pub default: Vec<f32>,
}

impl Default for Uniform {
    fn default() -> Self {
        Self {
            name: String::new(),
            uniform_type: UniformType::Vec4,
            count: 0,
            default: Vec::new(),
        }
    }
}

impl Uniform {
    pub(crate) fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let name = io::read_string(reader)?;
        let uniform_type = UniformType::from_value(io::read_u16(reader)?)?;

        let mut count = 0;
        let mut default = Vec::new();
        if uniform_type != UniformType::External {
            count = io::read_u32(reader)?;
            if io::read_bool(reader)? {
                default = (0..uniform_type.element_count())
                    .map(|_| io::read_f32(reader))
                    .collect::<Result<_>>()?;
            }
        }

        Ok(Self {
            name,
            uniform_type,
            count,
            default,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_string(writer, &self.name)?;
        io::write_u16(writer, self.uniform_type.value())?;
        if self.uniform_type != UniformType::External {
            io::write_u32(writer, self.count)?;
            io::write_bool(writer, !self.default.is_empty())?;
            for value in &self.default {
                io::write_f32(writer, *value)?;
            }
        }
        Ok(())
    }

    pub(crate) fn properties(&self) -> UniformProperties {
        UniformProperties {
            name: self.name.clone(),
            uniform_type: self.uniform_type.name().to_string(),
            count: self.count,
            default: self.default.clone(),
        }
    }

    pub(crate) fn from_properties(properties: &UniformProperties) -> Result<Self> {
        Ok(Self {
            name: properties.name.clone(),
            uniform_type: UniformType::from_name(&properties.uniform_type)?,
            count: properties.count,
            default: properties.default.clone(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UniformProperties {
    pub name: String,
    #[serde(rename = "type")]
    pub uniform_type: String,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub default: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn vec4_with_default_round_trips() {
        let uniform = Uniform {
            name: "FogColor".to_string(),
            uniform_type: UniformType::Vec4,
            count: 1,
            default: vec![1.0, 0.5, 0.25, 1.0],
        };
        let mut buffer = Vec::new();
        uniform.write(&mut buffer).unwrap();
        let decoded = Uniform::read(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(decoded, uniform);
    }

    #[test]
    fn external_uniform_has_no_payload() {
        let uniform = Uniform {
            name: "WorldViewProj".to_string(),
            uniform_type: UniformType::External,
            ..Uniform::default()
        };
        let mut buffer = Vec::new();
        uniform.write(&mut buffer).unwrap();
        // name (4 + 13) + type tag only.
        assert_eq!(buffer.len(), 4 + 13 + 2);
        let decoded = Uniform::read(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(decoded, uniform);
    }
}
