//! Per-variant shader records and the embedded bgfx payload container.

use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};

use crate::error::{MaterialError, Result};
use crate::input::{ShaderInput, ShaderInputProperties};
use crate::io;
use crate::platform::{ShaderPlatform, ShaderStage};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BgfxUniform {
    pub name: String,
    pub type_bits: u8,
    pub count: u8,
    pub reg_index: u16,
    pub reg_count: u16,
}

impl BgfxUniform {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let name_len = io::read_u8(reader)? as usize;
        let mut raw = vec![0u8; name_len];
        reader.read_exact(&mut raw)?;
        Ok(Self {
            name: String::from_utf8(raw)?,
            type_bits: io::read_u8(reader)?,
            count: io::read_u8(reader)?,
            reg_index: io::read_u16(reader)?,
            reg_count: io::read_u16(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_u8(writer, self.name.len() as u8)?;
        writer.write_all(self.name.as_bytes())?;
        io::write_u8(writer, self.type_bits)?;
        io::write_u8(writer, self.count)?;
        io::write_u16(writer, self.reg_index)?;
        io::write_u16(writer, self.reg_count)?;
        Ok(())
    }
}

/// The bgfx shader binary embedded in each shader definition: `VSH`/`FSH`/
/// `CSH` header, version 5 (3 for compute), uniform table, optional Metal
/// compute group size, the payload bytes, and an optional attribute trailer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BgfxShader {
    pub hash: u32,
    pub uniforms: Vec<BgfxUniform>,
    pub group_size: Vec<u16>,
    pub shader_bytes: Vec<u8>,
    pub attributes: Vec<u16>,
    pub size: i32,
}

impl BgfxShader {
    pub(crate) fn read(
        data: &[u8],
        platform: ShaderPlatform,
        stage: ShaderStage,
    ) -> Result<Self> {
        let mut reader = Cursor::new(data);
        let mut header = [0u8; 3];
        reader.read_exact(&mut header)?;
        let header = String::from_utf8_lossy(&header).into_owned();
        if !matches!(header.as_str(), "VSH" | "FSH" | "CSH") {
            return Err(MaterialError::BadShaderHeader(header));
        }
        let version = io::read_u8(&mut reader)?;
        if !(version == 5 || (version == 3 && header == "CSH")) {
            return Err(MaterialError::BadShaderVersion(version));
        }

        let hash = io::read_u32(&mut reader)?;
        let uniform_count = io::read_u16(&mut reader)?;
        let uniforms = (0..uniform_count)
            .map(|_| BgfxUniform::read(&mut reader))
            .collect::<Result<_>>()?;

        let group_size = if platform == ShaderPlatform::Metal && stage == ShaderStage::Compute {
            vec![
                io::read_u16(&mut reader)?,
                io::read_u16(&mut reader)?,
                io::read_u16(&mut reader)?,
            ]
        } else {
            Vec::new()
        };

        let payload_len = io::read_u32(&mut reader)? as usize;
        let mut shader_bytes = vec![0u8; payload_len];
        reader.read_exact(&mut shader_bytes)?;
        io::read_u8(&mut reader)?; // padding, always zero

        // The attribute trailer is absent in some payloads; end-of-data here
        // is not an error.
        let mut attribute_count = [0u8; 1];
        let (attributes, size) = if reader.read(&mut attribute_count)? == 1 {
            let attributes = (0..attribute_count[0])
                .map(|_| io::read_u16(&mut reader))
                .collect::<Result<_>>()?;
            (attributes, io::read_u16(&mut reader)? as i32)
        } else {
            (Vec::new(), -1)
        };

        Ok(Self {
            hash,
            uniforms,
            group_size,
            shader_bytes,
            attributes,
            size,
        })
    }

    pub(crate) fn write<W: Write>(
        &self,
        writer: &mut W,
        platform: ShaderPlatform,
        stage: ShaderStage,
    ) -> Result<()> {
        let mut body = Vec::new();
        let (header, version) = match stage {
            ShaderStage::Vertex => ("VSH", 5u8),
            ShaderStage::Compute => ("CSH", 3u8),
            _ => ("FSH", 5u8),
        };
        body.write_all(header.as_bytes())?;
        io::write_u8(&mut body, version)?;
        io::write_u32(&mut body, self.hash)?;
        io::write_u16(&mut body, self.uniforms.len() as u16)?;
        for uniform in &self.uniforms {
            uniform.write(&mut body)?;
        }
        if platform == ShaderPlatform::Metal && stage == ShaderStage::Compute {
            for index in 0..3 {
                io::write_u16(&mut body, self.group_size.get(index).copied().unwrap_or(1))?;
            }
        }
        io::write_u32(&mut body, self.shader_bytes.len() as u32)?;
        body.write_all(&self.shader_bytes)?;
        io::write_u8(&mut body, 0)?;
        if self.size != -1 {
            io::write_u8(&mut body, self.attributes.len() as u8)?;
            for attribute in &self.attributes {
                io::write_u16(&mut body, *attribute)?;
            }
            io::write_u16(&mut body, self.size as u16)?;
        }

        io::write_bytes(writer, &body)
    }
}

/// One compiled shader of a pass variant: stage, platform, declared inputs
/// and the embedded bgfx payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDefinition {
    pub stage: ShaderStage,
    pub platform: ShaderPlatform,
    pub inputs: Vec<ShaderInput>,
    pub hash: u64,
    pub bgfx_shader: BgfxShader,
}

impl Default for ShaderDefinition {
    fn default() -> Self {
        Self {
            stage: ShaderStage::Unknown,
            platform: ShaderPlatform::Unknown,
            inputs: Vec::new(),
            hash: 0,
            bgfx_shader: BgfxShader::default(),
        }
    }
}

impl ShaderDefinition {
    pub(crate) fn read<R: Read>(reader: &mut R, version: u64) -> Result<Self> {
        let stage_name = io::read_string(reader)?;
        let platform_name = io::read_string(reader)?;
        let stage = ShaderStage::from_name(&stage_name)?;
        let platform = ShaderPlatform::from_name(&platform_name)?;

        let stage_index = io::read_u8(reader)?;
        if stage.index() != stage_index {
            return Err(MaterialError::IndexMismatch {
                kind: "stage",
                name: stage_name,
                expected: stage.index(),
                found: stage_index,
            });
        }
        let platform_index = io::read_u8(reader)?;
        if platform.index(version) != platform_index {
            return Err(MaterialError::IndexMismatch {
                kind: "platform",
                name: platform_name,
                expected: platform.index(version),
                found: platform_index,
            });
        }

        let input_count = io::read_u16(reader)?;
        let inputs = (0..input_count)
            .map(|_| ShaderInput::read(reader))
            .collect::<Result<_>>()?;
        let hash = io::read_u64(reader)?;
        let payload = io::read_bytes(reader)?;
        let bgfx_shader = BgfxShader::read(&payload, platform, stage)?;

        Ok(Self {
            stage,
            platform,
            inputs,
            hash,
            bgfx_shader,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W, version: u64) -> Result<()> {
        io::write_string(writer, self.stage.name())?;
        io::write_string(writer, self.platform.name())?;
        io::write_u8(writer, self.stage.index())?;
        io::write_u8(writer, self.platform.index(version))?;
        io::write_u16(writer, self.inputs.len() as u16)?;
        for input in &self.inputs {
            input.write(writer)?;
        }
        io::write_u64(writer, self.hash)?;
        self.bgfx_shader.write(writer, self.platform, self.stage)
    }

    /// Payload file name inside an unpacked pass folder.
    pub fn file_name(&self, variant_index: usize) -> String {
        format!(
            "{variant_index}.{}.{}.{}",
            self.platform.name(),
            self.stage.name(),
            self.platform.file_extension()
        )
    }

    pub(crate) fn properties(&self, variant_index: usize) -> ShaderDefinitionProperties {
        ShaderDefinitionProperties {
            file_name: self.file_name(variant_index),
            stage: self.stage.name().to_string(),
            platform: self.platform.name().to_string(),
            inputs: self.inputs.iter().map(ShaderInput::properties).collect(),
            hash: self.hash,
            bgfx_shader: BgfxShaderProperties {
                hash: self.bgfx_shader.hash,
                uniforms: self
                    .bgfx_shader
                    .uniforms
                    .iter()
                    .map(|u| BgfxUniformProperties {
                        name: u.name.clone(),
                        type_bits: u.type_bits,
                        count: u.count,
                        reg_index: u.reg_index,
                        reg_count: u.reg_count,
                    })
                    .collect(),
                group_size: self.bgfx_shader.group_size.clone(),
                attributes: self.bgfx_shader.attributes.clone(),
                size: self.bgfx_shader.size,
            },
        }
    }

    pub(crate) fn from_properties(
        properties: &ShaderDefinitionProperties,
        shader_bytes: Vec<u8>,
    ) -> Result<Self> {
        Ok(Self {
            stage: ShaderStage::from_name(&properties.stage)?,
            platform: ShaderPlatform::from_name(&properties.platform)?,
            inputs: properties
                .inputs
                .iter()
                .map(ShaderInput::from_properties)
                .collect::<Result<_>>()?,
            hash: properties.hash,
            bgfx_shader: BgfxShader {
                hash: properties.bgfx_shader.hash,
                uniforms: properties
                    .bgfx_shader
                    .uniforms
                    .iter()
                    .map(|u| BgfxUniform {
                        name: u.name.clone(),
                        type_bits: u.type_bits,
                        count: u.count,
                        reg_index: u.reg_index,
                        reg_count: u.reg_count,
                    })
                    .collect(),
                group_size: properties.bgfx_shader.group_size.clone(),
                attributes: properties.bgfx_shader.attributes.clone(),
                size: properties.bgfx_shader.size,
                shader_bytes,
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BgfxUniformProperties {
    pub name: String,
    pub type_bits: u8,
    pub count: u8,
    pub reg_index: u16,
    pub reg_count: u16,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BgfxShaderProperties {
    pub hash: u32,
    #[serde(default)]
    pub uniforms: Vec<BgfxUniformProperties>,
    #[serde(default)]
    pub group_size: Vec<u16>,
    #[serde(default)]
    pub attributes: Vec<u16>,
    #[serde(default = "default_size")]
    pub size: i32,
}

fn default_size() -> i32 {
    -1
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShaderDefinitionProperties {
    pub file_name: String,
    pub stage: String,
    pub platform: String,
    #[serde(default)]
    pub inputs: Vec<ShaderInputProperties>,
    pub hash: u64,
    pub bgfx_shader: BgfxShaderProperties,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_shader() -> ShaderDefinition {
        ShaderDefinition {
            stage: ShaderStage::Fragment,
            platform: ShaderPlatform::Essl310,
            inputs: Vec::new(),
            hash: 0xDEADBEEF,
            bgfx_shader: BgfxShader {
                hash: 7,
                uniforms: vec![BgfxUniform {
                    name: "u_fog".to_string(),
                    type_bits: 2,
                    count: 1,
                    reg_index: 0,
                    reg_count: 1,
                }],
                group_size: Vec::new(),
                shader_bytes: b"void main() {}\n".to_vec(),
                attributes: vec![1, 2],
                size: 16,
            },
        }
    }

    #[test]
    fn shader_definition_round_trips() {
        let shader = sample_shader();
        let mut buffer = Vec::new();
        shader.write(&mut buffer, 22).unwrap();
        let decoded = ShaderDefinition::read(&mut Cursor::new(buffer), 22).unwrap();
        assert_eq!(decoded, shader);
    }

    #[test]
    fn attribute_trailer_is_optional() {
        let mut shader = sample_shader();
        shader.bgfx_shader.attributes.clear();
        shader.bgfx_shader.size = -1;
        let mut buffer = Vec::new();
        shader.write(&mut buffer, 22).unwrap();
        let decoded = ShaderDefinition::read(&mut Cursor::new(buffer), 22).unwrap();
        assert_eq!(decoded.bgfx_shader.size, -1);
        assert!(decoded.bgfx_shader.attributes.is_empty());
    }

    #[test]
    fn mismatched_platform_index_is_rejected() {
        let shader = sample_shader();
        let mut buffer = Vec::new();
        shader.write(&mut buffer, 22).unwrap();
        // Platform index byte sits right after the stage index; ESSL_310 is 9
        // in version 22. Corrupt it.
        let needle = buffer
            .windows(2)
            .position(|w| w == [shader.stage.index(), 9])
            .unwrap();
        buffer[needle + 1] = 3;
        assert!(matches!(
            ShaderDefinition::read(&mut Cursor::new(buffer), 22),
            Err(MaterialError::IndexMismatch { kind: "platform", .. })
        ));
    }

    #[test]
    fn payload_header_is_validated() {
        assert!(matches!(
            BgfxShader::read(b"XSH\x05", ShaderPlatform::Essl310, ShaderStage::Fragment),
            Err(MaterialError::BadShaderHeader(_))
        ));
    }

    #[test]
    fn file_name_includes_platform_stage_and_extension() {
        let shader = sample_shader();
        assert_eq!(shader.file_name(2), "2.ESSL_310.Fragment.glsl");
    }
}
