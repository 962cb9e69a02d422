//! Render passes and their flag variants.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{Read, Write};
use tracing::warn;

use crate::blend::BlendMode;
use crate::error::{MaterialError, Result};
use crate::io;
use crate::platform::{ShaderPlatform, ShaderStage};
use crate::shader::{ShaderDefinition, ShaderDefinitionProperties};

/// Per-platform support bits, stored in the container as a `0`/`1` string in
/// [`ShaderPlatform::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedPlatforms {
    enabled: Vec<bool>,
}

impl Default for SupportedPlatforms {
    fn default() -> Self {
        Self {
            enabled: vec![true; ShaderPlatform::ALL.len()],
        }
    }
}

impl SupportedPlatforms {
    pub fn from_bit_string(bits: &str) -> Self {
        if bits.chars().any(|c| c != '0' && c != '1') {
            warn!(bits, "invalid supported platforms bit field");
            return Self::default();
        }
        let width = ShaderPlatform::ALL.len();
        let mut normalized: Vec<char> = bits.chars().take(width).collect();
        while normalized.len() < width {
            normalized.insert(0, '0');
        }
        Self {
            enabled: normalized.into_iter().map(|c| c == '1').collect(),
        }
    }

    pub fn bit_string(&self) -> String {
        self.enabled
            .iter()
            .map(|&on| if on { '1' } else { '0' })
            .collect()
    }

    pub fn supports(&self, platform: ShaderPlatform) -> bool {
        let index = ShaderPlatform::ALL
            .into_iter()
            .position(|p| p == platform)
            .unwrap();
        self.enabled[index]
    }

    pub fn set(&mut self, platform: ShaderPlatform, supported: bool) {
        let index = ShaderPlatform::ALL
            .into_iter()
            .position(|p| p == platform)
            .unwrap();
        self.enabled[index] = supported;
    }

    fn properties(&self) -> Map<String, Value> {
        ShaderPlatform::ALL
            .into_iter()
            .zip(&self.enabled)
            .map(|(platform, &on)| (platform.name().to_string(), Value::Bool(on)))
            .collect()
    }

    fn apply_properties(&mut self, properties: &Map<String, Value>) -> Result<()> {
        for (name, value) in properties {
            let platform = ShaderPlatform::from_name(name)?;
            let on = value
                .as_bool()
                .ok_or_else(|| MaterialError::MalformedUnpacked(format!(
                    "supported_platforms entry {name} is not a boolean"
                )))?;
            self.set(platform, on);
        }
        Ok(())
    }
}

/// One flag combination of a pass and its per-platform shaders.
#[derive(Debug, Clone, Default)]
pub struct PassVariant {
    pub is_supported: bool,
    pub flags: Vec<(String, String)>,
    pub shaders: Vec<ShaderDefinition>,
}

impl PassVariant {
    fn read<R: Read>(reader: &mut R, version: u64) -> Result<Self> {
        let is_supported = io::read_bool(reader)?;
        let flag_count = io::read_u16(reader)?;
        let shader_count = io::read_u16(reader)?;
        let flags = (0..flag_count)
            .map(|_| Ok((io::read_string(reader)?, io::read_string(reader)?)))
            .collect::<Result<_>>()?;
        let shaders = (0..shader_count)
            .map(|_| ShaderDefinition::read(reader, version))
            .collect::<Result<_>>()?;
        Ok(Self {
            is_supported,
            flags,
            shaders,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u64) -> Result<()> {
        io::write_bool(writer, self.is_supported)?;
        io::write_u16(writer, self.flags.len() as u16)?;
        io::write_u16(writer, self.shaders.len() as u16)?;
        for (name, value) in &self.flags {
            io::write_string(writer, name)?;
            io::write_string(writer, value)?;
        }
        for shader in &self.shaders {
            shader.write(writer, version)?;
        }
        Ok(())
    }

    pub fn platforms(&self) -> Vec<ShaderPlatform> {
        let mut platforms: Vec<ShaderPlatform> =
            self.shaders.iter().map(|s| s.platform).collect();
        platforms.sort_unstable();
        platforms.dedup();
        platforms
    }

    pub fn stages(&self) -> Vec<ShaderStage> {
        let mut stages: Vec<ShaderStage> = self.shaders.iter().map(|s| s.stage).collect();
        stages.sort_unstable();
        stages.dedup();
        stages
    }

    pub fn sort_flags(&mut self) {
        self.flags.sort();
    }

    fn properties(&self, variant_index: usize) -> PassVariantProperties {
        PassVariantProperties {
            is_supported: self.is_supported,
            flags: self
                .flags
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect(),
            shaders: self
                .shaders
                .iter()
                .map(|s| s.properties(variant_index))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PassVariantProperties {
    pub is_supported: bool,
    #[serde(default)]
    pub flags: Map<String, Value>,
    #[serde(default)]
    pub shaders: Vec<ShaderDefinitionProperties>,
}

#[derive(Debug, Clone, Default)]
pub struct Pass {
    pub name: String,
    pub supported_platforms: SupportedPlatforms,
    pub fallback_pass: String,
    pub default_blend_mode: Option<BlendMode>,
    pub default_variant: Vec<(String, String)>,
    pub variants: Vec<PassVariant>,
}

impl Pass {
    pub(crate) fn read<R: Read>(reader: &mut R, version: u64) -> Result<Self> {
        let name = io::read_string(reader)?;
        let supported_platforms = SupportedPlatforms::from_bit_string(&io::read_string(reader)?);
        let fallback_pass = io::read_string(reader)?;

        let default_blend_mode = if io::read_bool(reader)? {
            Some(BlendMode::from_value(io::read_u16(reader)?)?)
        } else {
            None
        };

        let default_flag_count = io::read_u16(reader)?;
        let default_variant = (0..default_flag_count)
            .map(|_| Ok((io::read_string(reader)?, io::read_string(reader)?)))
            .collect::<Result<_>>()?;

        io::read_u32(reader)?; // reserved, always zero

        let variant_count = io::read_u16(reader)?;
        let variants = (0..variant_count)
            .map(|_| PassVariant::read(reader, version))
            .collect::<Result<_>>()?;

        Ok(Self {
            name,
            supported_platforms,
            fallback_pass,
            default_blend_mode,
            default_variant,
            variants,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W, version: u64) -> Result<()> {
        io::write_string(writer, &self.name)?;
        io::write_string(writer, &self.supported_platforms.bit_string())?;
        io::write_string(writer, &self.fallback_pass)?;

        io::write_bool(writer, self.default_blend_mode.is_some())?;
        if let Some(mode) = self.default_blend_mode {
            io::write_u16(writer, mode.value())?;
        }

        io::write_u16(writer, self.default_variant.len() as u16)?;
        for (name, value) in &self.default_variant {
            io::write_string(writer, name)?;
            io::write_string(writer, value)?;
        }

        io::write_u32(writer, 0)?;

        io::write_u16(writer, self.variants.len() as u16)?;
        for variant in &self.variants {
            variant.write(writer, version)?;
        }
        Ok(())
    }

    /// Sort flag assignments by name and variants by their flag list, which
    /// keeps unpacked output diff-friendly.
    pub fn sort_variants(&mut self) {
        self.default_variant.sort();
        for variant in &mut self.variants {
            variant.sort_flags();
        }
        self.variants.sort_by(|a, b| a.flags.cmp(&b.flags));
    }

    pub fn platforms(&self) -> Vec<ShaderPlatform> {
        let mut platforms: Vec<ShaderPlatform> = self
            .variants
            .iter()
            .flat_map(PassVariant::platforms)
            .collect();
        platforms.sort_unstable();
        platforms.dedup();
        platforms
    }

    pub fn stages(&self) -> Vec<ShaderStage> {
        let mut stages: Vec<ShaderStage> =
            self.variants.iter().flat_map(PassVariant::stages).collect();
        stages.sort_unstable();
        stages.dedup();
        stages
    }

    /// Every flag name with the set of values it takes in this pass,
    /// defaults included.
    pub fn flag_definitions(&self) -> Vec<(String, Vec<String>)> {
        let mut definitions: Vec<(String, Vec<String>)> = Vec::new();
        let add = |name: &str, value: &str, definitions: &mut Vec<(String, Vec<String>)>| {
            match definitions.iter().position(|(n, _)| n == name) {
                Some(index) => {
                    let values = &mut definitions[index].1;
                    if !values.iter().any(|v| v == value) {
                        values.push(value.to_string());
                    }
                }
                None => definitions.push((name.to_string(), vec![value.to_string()])),
            }
        };
        for (name, value) in &self.default_variant {
            add(name, value, &mut definitions);
        }
        for variant in &self.variants {
            for (name, value) in &variant.flags {
                add(name, value, &mut definitions);
            }
        }
        definitions
    }

    pub(crate) fn properties(&self) -> PassProperties {
        PassProperties {
            name: self.name.clone(),
            supported_platforms: self.supported_platforms.properties(),
            fallback_pass: self.fallback_pass.clone(),
            default_blend_mode: self
                .default_blend_mode
                .map(|m| m.name())
                .unwrap_or("")
                .to_string(),
            default_variant: self
                .default_variant
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect(),
            variants: self
                .variants
                .iter()
                .enumerate()
                .map(|(index, variant)| variant.properties(index))
                .collect(),
        }
    }

    pub(crate) fn from_properties(
        properties: &PassProperties,
        mut load_payload: impl FnMut(&str) -> Result<Vec<u8>>,
    ) -> Result<Self> {
        let mut supported_platforms = SupportedPlatforms::default();
        supported_platforms.apply_properties(&properties.supported_platforms)?;

        let default_blend_mode = if properties.default_blend_mode.is_empty() {
            None
        } else {
            Some(BlendMode::from_name(&properties.default_blend_mode)?)
        };

        let mut variants = Vec::with_capacity(properties.variants.len());
        for variant in &properties.variants {
            let mut shaders = Vec::with_capacity(variant.shaders.len());
            for shader in &variant.shaders {
                let payload = load_payload(&shader.file_name)?;
                shaders.push(ShaderDefinition::from_properties(shader, payload)?);
            }
            variants.push(PassVariant {
                is_supported: variant.is_supported,
                flags: map_to_pairs(&variant.flags)?,
                shaders,
            });
        }

        Ok(Self {
            name: properties.name.clone(),
            supported_platforms,
            fallback_pass: properties.fallback_pass.clone(),
            default_blend_mode,
            default_variant: map_to_pairs(&properties.default_variant)?,
            variants,
        })
    }
}

fn map_to_pairs(map: &Map<String, Value>) -> Result<Vec<(String, String)>> {
    map.iter()
        .map(|(name, value)| {
            value
                .as_str()
                .map(|v| (name.clone(), v.to_string()))
                .ok_or_else(|| {
                    MaterialError::MalformedUnpacked(format!("flag {name} is not a string"))
                })
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PassProperties {
    pub name: String,
    #[serde(default)]
    pub supported_platforms: Map<String, Value>,
    #[serde(default)]
    pub fallback_pass: String,
    #[serde(default)]
    pub default_blend_mode: String,
    #[serde(default)]
    pub default_variant: Map<String, Value>,
    #[serde(default)]
    pub variants: Vec<PassVariantProperties>,
}
