//! Target platforms and pipeline stages.
//!
//! Platform indices are version-dependent: format 25 dropped `ESSL_300`,
//! shifting everything after it down by one. Names are stable across
//! versions, so the binary stores both and the reader cross-checks them.
//! This codec pins version 22 but keeps both tables so the pinning lives in
//! one place.

use crate::error::{MaterialError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderPlatform {
    Direct3DSm40,
    Direct3DSm50,
    Direct3DSm60,
    Direct3DSm65,
    Direct3DXb1,
    Direct3DXbx,
    Glsl120,
    Glsl430,
    Essl300,
    Essl310,
    Metal,
    Vulkan,
    Nvn,
    Pssl,
    Unknown,
}

impl ShaderPlatform {
    pub const ALL: [ShaderPlatform; 15] = [
        ShaderPlatform::Direct3DSm40,
        ShaderPlatform::Direct3DSm50,
        ShaderPlatform::Direct3DSm60,
        ShaderPlatform::Direct3DSm65,
        ShaderPlatform::Direct3DXb1,
        ShaderPlatform::Direct3DXbx,
        ShaderPlatform::Glsl120,
        ShaderPlatform::Glsl430,
        ShaderPlatform::Essl300,
        ShaderPlatform::Essl310,
        ShaderPlatform::Metal,
        ShaderPlatform::Vulkan,
        ShaderPlatform::Nvn,
        ShaderPlatform::Pssl,
        ShaderPlatform::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShaderPlatform::Direct3DSm40 => "Direct3D_SM40",
            ShaderPlatform::Direct3DSm50 => "Direct3D_SM50",
            ShaderPlatform::Direct3DSm60 => "Direct3D_SM60",
            ShaderPlatform::Direct3DSm65 => "Direct3D_SM65",
            ShaderPlatform::Direct3DXb1 => "Direct3D_XB1",
            ShaderPlatform::Direct3DXbx => "Direct3D_XBX",
            ShaderPlatform::Glsl120 => "GLSL_120",
            ShaderPlatform::Glsl430 => "GLSL_430",
            ShaderPlatform::Essl300 => "ESSL_300",
            ShaderPlatform::Essl310 => "ESSL_310",
            ShaderPlatform::Metal => "Metal",
            ShaderPlatform::Vulkan => "Vulkan",
            ShaderPlatform::Nvn => "Nvn",
            ShaderPlatform::Pssl => "PSSL",
            ShaderPlatform::Unknown => "Unknown",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "platform",
                name: name.to_string(),
            })
    }

    /// The platform's index in the given format version. `ESSL_300` converts
    /// to `ESSL_310` from version 25 on.
    pub fn index(self, version: u64) -> u8 {
        if version >= 25 {
            let platform = if self == ShaderPlatform::Essl300 {
                ShaderPlatform::Essl310
            } else {
                self
            };
            let position = Self::ALL
                .into_iter()
                .filter(|p| *p != ShaderPlatform::Essl300)
                .position(|p| p == platform)
                .unwrap();
            position as u8
        } else {
            Self::ALL.into_iter().position(|p| p == self).unwrap() as u8
        }
    }

    pub fn file_extension(self) -> &'static str {
        let name = self.name();
        if name.starts_with("Direct3D") {
            "dxbc"
        } else if name.starts_with("GLSL") || name.starts_with("ESSL") {
            "glsl"
        } else if self == ShaderPlatform::Metal {
            "metal"
        } else if self == ShaderPlatform::Vulkan {
            "spirv"
        } else {
            "bin"
        }
    }

    /// Text shader platforms carry source payloads the decompiler can read.
    pub fn is_text(self) -> bool {
        let name = self.name();
        name.starts_with("ESSL") || name.starts_with("GLSL") || self == ShaderPlatform::Metal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
    Unknown,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 4] = [
        ShaderStage::Vertex,
        ShaderStage::Fragment,
        ShaderStage::Compute,
        ShaderStage::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::Fragment => "Fragment",
            ShaderStage::Compute => "Compute",
            ShaderStage::Unknown => "Unknown",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| MaterialError::UnknownName {
                kind: "stage",
                name: name.to_string(),
            })
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_22_indices_are_dense() {
        assert_eq!(ShaderPlatform::Direct3DSm40.index(22), 0);
        assert_eq!(ShaderPlatform::Essl300.index(22), 8);
        assert_eq!(ShaderPlatform::Essl310.index(22), 9);
        assert_eq!(ShaderPlatform::Unknown.index(22), 14);
    }

    #[test]
    fn version_25_drops_essl_300() {
        assert_eq!(ShaderPlatform::Essl310.index(25), 8);
        assert_eq!(ShaderPlatform::Essl300.index(25), 8);
        assert_eq!(ShaderPlatform::Metal.index(25), 9);
        assert_eq!(ShaderPlatform::Unknown.index(25), 13);
    }

    #[test]
    fn names_round_trip() {
        for platform in ShaderPlatform::ALL {
            assert_eq!(
                ShaderPlatform::from_name(platform.name()).unwrap(),
                platform
            );
        }
        assert!(ShaderPlatform::from_name("Direct3D_SM70").is_err());
    }

    #[test]
    fn extensions_follow_payload_kind() {
        assert_eq!(ShaderPlatform::Direct3DSm65.file_extension(), "dxbc");
        assert_eq!(ShaderPlatform::Essl310.file_extension(), "glsl");
        assert_eq!(ShaderPlatform::Vulkan.file_extension(), "spirv");
        assert_eq!(ShaderPlatform::Nvn.file_extension(), "bin");
    }
}
