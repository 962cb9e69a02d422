//! Sampler and storage buffer records.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{MaterialError, Result};
use crate::io;
use crate::precision::Precision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Point,
    Bilinear,
}

impl TextureFilter {
    pub fn name(self) -> &'static str {
        match self {
            TextureFilter::Point => "Point",
            TextureFilter::Bilinear => "Bilinear",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "Point" => Ok(TextureFilter::Point),
            "Bilinear" => Ok(TextureFilter::Bilinear),
            other => Err(MaterialError::UnknownName {
                kind: "texture filter",
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    Clamp,
    Repeat,
}

impl TextureWrap {
    pub fn name(self) -> &'static str {
        match self {
            TextureWrap::Clamp => "Clamp",
            TextureWrap::Repeat => "Repeat",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "Clamp" => Ok(TextureWrap::Clamp),
            "Repeat" => Ok(TextureWrap::Repeat),
            other => Err(MaterialError::UnknownName {
                kind: "texture wrap",
                name: other.to_string(),
            }),
        }
    }
}

/// Two-bit sampler state: bit 0 filter, bit 1 wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerState {
    pub filter: TextureFilter,
    pub wrapping: TextureWrap,
}

impl SamplerState {
    pub fn from_value(value: u8) -> Result<Self> {
        if value > 3 {
            return Err(MaterialError::BadSamplerState(value));
        }
        Ok(Self {
            filter: if value & 1 == 0 {
                TextureFilter::Point
            } else {
                TextureFilter::Bilinear
            },
            wrapping: if (value >> 1) & 1 == 0 {
                TextureWrap::Clamp
            } else {
                TextureWrap::Repeat
            },
        })
    }

    pub fn value(self) -> u8 {
        (self.filter as u8) | ((self.wrapping as u8) << 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferAccess {
    Undefined,
    #[default]
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl BufferAccess {
    pub const ALL: [BufferAccess; 4] = [
        BufferAccess::Undefined,
        BufferAccess::ReadOnly,
        BufferAccess::WriteOnly,
        BufferAccess::ReadWrite,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MaterialError::UnknownEnum {
                kind: "buffer access",
                value: value as u32,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            BufferAccess::Undefined => "undefined",
            BufferAccess::ReadOnly => "readonly",
            BufferAccess::WriteOnly => "writeonly",
            BufferAccess::ReadWrite => "readwrite",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "buffer access",
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferType {
    #[default]
    Texture2D,
    Texture2DArray,
    External2D,
    Texture3D,
    TextureCube,
    TextureCubeArray,
    StructBuffer,
    RawBuffer,
    AccelerationStructure,
    Shadow2D,
    Shadow2DArray,
}

impl BufferType {
    pub const ALL: [BufferType; 11] = [
        BufferType::Texture2D,
        BufferType::Texture2DArray,
        BufferType::External2D,
        BufferType::Texture3D,
        BufferType::TextureCube,
        BufferType::TextureCubeArray,
        BufferType::StructBuffer,
        BufferType::RawBuffer,
        BufferType::AccelerationStructure,
        BufferType::Shadow2D,
        BufferType::Shadow2DArray,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MaterialError::UnknownEnum {
                kind: "buffer type",
                value: value as u32,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            BufferType::Texture2D => "texture2D",
            BufferType::Texture2DArray => "texture2DArray",
            BufferType::External2D => "external2D",
            BufferType::Texture3D => "texture3D",
            BufferType::TextureCube => "textureCube",
            BufferType::TextureCubeArray => "textureCubeArray",
            BufferType::StructBuffer => "structBuffer",
            BufferType::RawBuffer => "rawBuffer",
            BufferType::AccelerationStructure => "accelerationStructure",
            BufferType::Shadow2D => "shadow2D",
            BufferType::Shadow2DArray => "shadow2DArray",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "buffer type",
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomTypeInfo {
    pub struct_name: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub name: String,
    pub reg1: u16,
    pub access: BufferAccess,
    pub precision: Precision,
    pub unordered_access: bool,
    pub buffer_type: BufferType,
    pub texture_format: String,
    pub always_one: u32,
    pub reg2: u8,
    pub sampler_state: Option<SamplerState>,
    pub default_texture: String,
    pub unknown_string: String,
    pub custom_type_info: Option<CustomTypeInfo>,
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            name: String::new(),
            reg1: 0,
            access: BufferAccess::ReadOnly,
            precision: Precision::Lowp,
            unordered_access: false,
            buffer_type: BufferType::Texture2D,
            texture_format: String::new(),
            always_one: 1,
            reg2: 0,
            sampler_state: None,
            default_texture: String::new(),
            unknown_string: String::new(),
            custom_type_info: None,
        }
    }
}

impl Buffer {
    pub(crate) fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let name = io::read_string(reader)?;
        let reg1 = io::read_u16(reader)?;
        let access = BufferAccess::from_value(io::read_u8(reader)?)?;
        let precision = Precision::from_value(io::read_u8(reader)?)?;
        let unordered_access = io::read_bool(reader)?;
        let buffer_type = BufferType::from_value(io::read_u8(reader)?)?;
        let texture_format = io::read_string(reader)?;
        let always_one = io::read_u32(reader)?;
        let reg2 = io::read_u8(reader)?;

        let sampler_state = if io::read_bool(reader)? {
            Some(SamplerState::from_value(io::read_u8(reader)?)?)
        } else {
            None
        };
        let default_texture = if io::read_bool(reader)? {
            io::read_string(reader)?
        } else {
            String::new()
        };
        let unknown_string = if io::read_bool(reader)? {
            io::read_string(reader)?
        } else {
            String::new()
        };
        let custom_type_info = if io::read_bool(reader)? {
            Some(CustomTypeInfo {
                struct_name: io::read_string(reader)?,
                size: io::read_u32(reader)?,
            })
        } else {
            None
        };

        Ok(Self {
            name,
            reg1,
            access,
            precision,
            unordered_access,
            buffer_type,
            texture_format,
            always_one,
            reg2,
            sampler_state,
            default_texture,
            unknown_string,
            custom_type_info,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_string(writer, &self.name)?;
        io::write_u16(writer, self.reg1)?;
        io::write_u8(writer, self.access.value())?;
        io::write_u8(writer, self.precision.value())?;
        io::write_bool(writer, self.unordered_access)?;
        io::write_u8(writer, self.buffer_type.value())?;
        io::write_string(writer, &self.texture_format)?;
        io::write_u32(writer, self.always_one)?;
        io::write_u8(writer, self.reg2)?;

        io::write_bool(writer, self.sampler_state.is_some())?;
        if let Some(state) = self.sampler_state {
            io::write_u8(writer, state.value())?;
        }
        io::write_bool(writer, !self.default_texture.is_empty())?;
        if !self.default_texture.is_empty() {
            io::write_string(writer, &self.default_texture)?;
        }
        io::write_bool(writer, !self.unknown_string.is_empty())?;
        if !self.unknown_string.is_empty() {
            io::write_string(writer, &self.unknown_string)?;
        }
        io::write_bool(writer, self.custom_type_info.is_some())?;
        if let Some(info) = &self.custom_type_info {
            io::write_string(writer, &info.struct_name)?;
            io::write_u32(writer, info.size)?;
        }
        Ok(())
    }

    pub(crate) fn properties(&self) -> BufferProperties {
        BufferProperties {
            name: self.name.clone(),
            reg1: self.reg1,
            reg2: self.reg2,
            buffer_type: self.buffer_type.name().to_string(),
            precision: self.precision.name().to_string(),
            access: self.access.name().to_string(),
            texture_format: self.texture_format.clone(),
            default_texture: self.default_texture.clone(),
            unordered_access: self.unordered_access,
            always_one: self.always_one,
            unknown_string: self.unknown_string.clone(),
            sampler_state: self.sampler_state.map(|state| SamplerStateProperties {
                filter: state.filter.name().to_string(),
                wrapping: state.wrapping.name().to_string(),
            }),
            custom_type_info: self.custom_type_info.as_ref().map(|info| {
                CustomTypeInfoProperties {
                    struct_name: info.struct_name.clone(),
                    size: info.size,
                }
            }),
        }
    }

    pub(crate) fn from_properties(properties: &BufferProperties) -> Result<Self> {
        Ok(Self {
            name: properties.name.clone(),
            reg1: properties.reg1,
            reg2: properties.reg2,
            buffer_type: BufferType::from_name(&properties.buffer_type)?,
            precision: Precision::from_name(&properties.precision)?,
            access: BufferAccess::from_name(&properties.access)?,
            texture_format: properties.texture_format.clone(),
            default_texture: properties.default_texture.clone(),
            unordered_access: properties.unordered_access,
            always_one: properties.always_one,
            unknown_string: properties.unknown_string.clone(),
            sampler_state: properties
                .sampler_state
                .as_ref()
                .map(|state| {
                    Ok::<_, MaterialError>(SamplerState {
                        filter: TextureFilter::from_name(&state.filter)?,
                        wrapping: TextureWrap::from_name(&state.wrapping)?,
                    })
                })
                .transpose()?,
            custom_type_info: properties.custom_type_info.as_ref().map(|info| {
                CustomTypeInfo {
                    struct_name: info.struct_name.clone(),
                    size: info.size,
                }
            }),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SamplerStateProperties {
    pub filter: String,
    pub wrapping: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomTypeInfoProperties {
    #[serde(rename = "struct")]
    pub struct_name: String,
    pub size: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BufferProperties {
    pub name: String,
    pub reg1: u16,
    pub reg2: u8,
    #[serde(rename = "type")]
    pub buffer_type: String,
    pub precision: String,
    pub access: String,
    #[serde(default)]
    pub texture_format: String,
    #[serde(default)]
    pub default_texture: String,
    #[serde(default)]
    pub unordered_access: bool,
    #[serde(default = "default_always_one")]
    pub always_one: u32,
    #[serde(default)]
    pub unknown_string: String,
    #[serde(default)]
    pub sampler_state: Option<SamplerStateProperties>,
    #[serde(default)]
    pub custom_type_info: Option<CustomTypeInfoProperties>,
}

fn default_always_one() -> u32 {
    1
}
