//! Codec for `RenderDragon.CompiledMaterialDefinition` containers
//! (`.material.bin`).
//!
//! A material packs buffers, uniforms and render passes; each pass carries
//! flag variants, and each variant one compiled shader per platform × stage.
//! The codec reads and writes the binary layout, and mirrors it onto an
//! unpacked on-disk layout of JSON property files plus raw shader payloads.
//!
//! Encrypted containers are recognised but never decrypted; the reader
//! reports the scheme and callers degrade (skip payload export).

use regex::Regex;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

mod blend;
mod buffer;
mod encryption;
mod error;
mod input;
mod io;
mod pass;
mod platform;
mod precision;
mod shader;
mod uniform;

pub use blend::BlendMode;
pub use buffer::{
    Buffer, BufferAccess, BufferType, CustomTypeInfo, SamplerState, TextureFilter, TextureWrap,
};
pub use encryption::EncryptionType;
pub use error::{MaterialError, Result};
pub use input::{InputSemantic, InputType, Interpolation, ShaderInput};
pub use pass::{Pass, PassVariant, SupportedPlatforms};
pub use platform::{ShaderPlatform, ShaderStage};
pub use precision::Precision;
pub use shader::{BgfxShader, BgfxUniform, ShaderDefinition};
pub use uniform::{Uniform, UniformType};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default)]
pub struct Material {
    pub version: u64,
    pub name: String,
    pub parent: String,
    pub encryption: EncryptionType,
    pub buffers: Vec<Buffer>,
    pub uniforms: Vec<Uniform>,
    pub passes: Vec<Pass>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MaterialProperties {
    version: u64,
    name: String,
    #[serde(default)]
    parent: String,
    #[serde(default)]
    buffers: Vec<String>,
    #[serde(default)]
    uniforms: Vec<String>,
    #[serde(default)]
    passes: Vec<String>,
}

impl Material {
    pub const MAGIC: u64 = 168942106;
    pub const EXTENSION: &'static str = ".material.bin";
    pub const DEFINITION: &'static str = "RenderDragon.CompiledMaterialDefinition";
    pub const VERSION: u64 = 22;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Self::default()
        }
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        if io::read_u64(reader)? != Self::MAGIC {
            return Err(MaterialError::BadMagic);
        }
        if io::read_string(reader)? != Self::DEFINITION {
            return Err(MaterialError::NotAMaterial);
        }
        let version = io::read_u64(reader)?;
        if version != Self::VERSION {
            return Err(MaterialError::UnsupportedVersion(version));
        }

        let encryption = EncryptionType::read(reader)?;
        if encryption != EncryptionType::None {
            return Err(MaterialError::Encrypted {
                scheme: encryption.name().to_string(),
            });
        }

        let name = io::read_string(reader)?;
        let parent = if io::read_bool(reader)? {
            io::read_string(reader)?
        } else {
            String::new()
        };

        let buffer_count = io::read_u8(reader)?;
        let buffers = (0..buffer_count)
            .map(|_| Buffer::read(reader))
            .collect::<Result<_>>()?;
        let uniform_count = io::read_u16(reader)?;
        let uniforms = (0..uniform_count)
            .map(|_| Uniform::read(reader))
            .collect::<Result<_>>()?;
        let pass_count = io::read_u16(reader)?;
        let passes = (0..pass_count)
            .map(|_| Pass::read(reader, version))
            .collect::<Result<_>>()?;

        if io::read_u64(reader)? != Self::MAGIC {
            return Err(MaterialError::BadMagic);
        }

        Ok(Self {
            version,
            name,
            parent,
            encryption,
            buffers,
            uniforms,
            passes,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        io::write_u64(writer, Self::MAGIC)?;
        io::write_string(writer, Self::DEFINITION)?;
        io::write_u64(writer, self.version)?;
        EncryptionType::None.write(writer)?;

        io::write_string(writer, &self.name)?;
        io::write_bool(writer, !self.parent.is_empty())?;
        if !self.parent.is_empty() {
            io::write_string(writer, &self.parent)?;
        }

        io::write_u8(writer, self.buffers.len() as u8)?;
        for buffer in &self.buffers {
            buffer.write(writer)?;
        }
        io::write_u16(writer, self.uniforms.len() as u16)?;
        for uniform in &self.uniforms {
            uniform.write(writer)?;
        }
        io::write_u16(writer, self.passes.len() as u16)?;
        for pass in &self.passes {
            pass.write(writer, self.version)?;
        }

        io::write_u64(writer, Self::MAGIC)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::read(&mut BufReader::new(file))
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the unpacked on-disk layout: `material.json`, one JSON property
    /// file per buffer/uniform/pass, and the raw shader payloads per pass.
    pub fn store(&self, directory: &Path, skip_shaders: bool) -> Result<()> {
        fs::create_dir_all(directory)?;
        let properties = MaterialProperties {
            version: self.version,
            name: self.name.clone(),
            parent: self.parent.clone(),
            buffers: self.buffers.iter().map(|b| b.name.clone()).collect(),
            uniforms: self.uniforms.iter().map(|u| u.name.clone()).collect(),
            passes: self.passes.iter().map(|p| p.name.clone()).collect(),
        };
        write_json(&directory.join("material.json"), &properties)?;

        if !self.buffers.is_empty() {
            let buffer_dir = directory.join("buffers");
            fs::create_dir_all(&buffer_dir)?;
            for buffer in &self.buffers {
                write_json(
                    &buffer_dir.join(format!("{}.json", buffer.name)),
                    &buffer.properties(),
                )?;
            }
        }
        if !self.uniforms.is_empty() {
            let uniform_dir = directory.join("uniforms");
            fs::create_dir_all(&uniform_dir)?;
            for uniform in &self.uniforms {
                write_json(
                    &uniform_dir.join(format!("{}.json", uniform.name)),
                    &uniform.properties(),
                )?;
            }
        }
        if !self.passes.is_empty() {
            let pass_dir = directory.join("passes");
            fs::create_dir_all(&pass_dir)?;
            for pass in &self.passes {
                write_json(
                    &pass_dir.join(format!("{}.json", pass.name)),
                    &pass.properties(),
                )?;
                if skip_shaders {
                    continue;
                }
                let payload_dir = pass_dir.join(&pass.name);
                fs::create_dir_all(&payload_dir)?;
                for (index, variant) in pass.variants.iter().enumerate() {
                    for shader in &variant.shaders {
                        fs::write(
                            payload_dir.join(shader.file_name(index)),
                            &shader.bgfx_shader.shader_bytes,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Read the unpacked layout back into a material.
    pub fn load_unpacked(directory: &Path) -> Result<Self> {
        let properties: MaterialProperties =
            read_json(&directory.join("material.json"))?;
        if properties.version != Self::VERSION {
            return Err(MaterialError::UnsupportedVersion(properties.version));
        }

        let mut material = Material {
            version: properties.version,
            name: properties.name.clone(),
            parent: properties.parent.clone(),
            ..Material::new()
        };

        for name in &properties.buffers {
            let buffer_properties =
                read_json(&directory.join("buffers").join(format!("{name}.json")))?;
            material
                .buffers
                .push(Buffer::from_properties(&buffer_properties)?);
        }
        for name in &properties.uniforms {
            let uniform_properties =
                read_json(&directory.join("uniforms").join(format!("{name}.json")))?;
            material
                .uniforms
                .push(Uniform::from_properties(&uniform_properties)?);
        }
        for name in &properties.passes {
            let pass_properties =
                read_json(&directory.join("passes").join(format!("{name}.json")))?;
            let payload_dir = directory.join("passes").join(name);
            let pass = Pass::from_properties(&pass_properties, |file_name| {
                Ok(fs::read(payload_dir.join(file_name))?)
            })?;
            material.passes.push(pass);
        }
        Ok(material)
    }

    /// Sort passes' variants and flags, which keeps unpacked and restored
    /// output diff-friendly.
    pub fn sort_variants(&mut self) {
        for pass in &mut self.passes {
            pass.sort_variants();
        }
    }

    pub fn platforms(&self) -> Vec<ShaderPlatform> {
        let mut platforms: Vec<ShaderPlatform> =
            self.passes.iter().flat_map(Pass::platforms).collect();
        platforms.sort_unstable();
        platforms.dedup();
        platforms
    }

    pub fn stages(&self) -> Vec<ShaderStage> {
        let mut stages: Vec<ShaderStage> = self.passes.iter().flat_map(Pass::stages).collect();
        stages.sort_unstable();
        stages.dedup();
        stages
    }

    /// Every flag name with every value it takes across all passes.
    pub fn flag_definitions(&self) -> Vec<(String, Vec<String>)> {
        let mut definitions: Vec<(String, Vec<String>)> = Vec::new();
        for pass in &self.passes {
            for (name, values) in pass.flag_definitions() {
                match definitions.iter().position(|(n, _)| *n == name) {
                    Some(index) => {
                        let existing = &mut definitions[index].1;
                        for value in values {
                            if !existing.contains(&value) {
                                existing.push(value);
                            }
                        }
                    }
                    None => definitions.push((name, values)),
                }
            }
        }
        definitions
    }

    /// Insert shader-information comments into every text-platform payload.
    pub fn label(&mut self) {
        let material_name = self.name.clone();
        for pass in &mut self.passes {
            let pass_name = pass.name.clone();
            for (variant_index, variant) in pass.variants.iter_mut().enumerate() {
                let is_supported = variant.is_supported;
                let flags = variant.flags.clone();
                for shader in &mut variant.shaders {
                    if !shader.platform.is_text() {
                        continue;
                    }
                    let mut comment = format!(
                        "// Shader Information:\n\
                         // - Name: {material_name}\n\
                         // - Pass: {pass_name}\n\
                         // - Platform: {}\n\
                         // - Stage: {}\n\
                         // - Variant: {variant_index}\n\
                         // - Variant Supported: {is_supported}\n",
                        shader.platform.name(),
                        shader.stage.name(),
                    );
                    if !flags.is_empty() {
                        comment.push_str("// - Variant Flags: \n");
                        comment.push_str(
                            &flags
                                .iter()
                                .map(|(name, value)| format!("//    - {name}: {value}"))
                                .collect::<Vec<_>>()
                                .join("\n"),
                        );
                    }
                    let code =
                        String::from_utf8_lossy(&shader.bgfx_shader.shader_bytes).into_owned();
                    shader.bgfx_shader.shader_bytes =
                        insert_header_comment(&code, &comment).into_bytes();
                }
            }
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// List every `.material.bin` under `path` (or `path` itself if it is one).
pub fn list_packed_materials(path: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if path.is_file() {
        found.push(path.to_path_buf());
    } else {
        for entry in fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file()
                && entry_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(Material::EXTENSION))
            {
                found.push(entry_path);
            }
        }
        found.sort();
    }
    Ok(found)
}

static VERSION_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*#\s*version\s+").unwrap());

/// Place a comment block at the top of a shader, after any `#version` line.
pub fn insert_header_comment(code: &str, comment: &str) -> String {
    if code.starts_with("#version") {
        code.replacen('\n', &format!("\n\n{comment}\n\n"), 1)
    } else {
        format!("{comment}\n\n{code}")
    }
}

/// Prepend the platform's `#version` directive when the source lacks one.
pub fn insert_version_directive(code: &str, platform: ShaderPlatform) -> String {
    if VERSION_DIRECTIVE.is_match(code) {
        return code.to_string();
    }
    let name = platform.name();
    let mut version = name[name.len().saturating_sub(3)..].to_string();
    if platform == ShaderPlatform::Essl300 || platform == ShaderPlatform::Essl310 {
        version.push_str(" es");
    }
    format!("#version {version}\n{code}")
}
