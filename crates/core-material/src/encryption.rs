//! Encryption tag of the container payload.
//!
//! Stored as a reversed FourCC. Payload decryption is out of scope; the
//! reader only identifies the scheme so callers can degrade gracefully.

use std::io::{Read, Write};

use crate::error::{MaterialError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionType {
    #[default]
    None,
    SimplePassphrase,
    KeyPair,
}

impl EncryptionType {
    fn tag(self) -> &'static str {
        match self {
            EncryptionType::None => "NONE",
            EncryptionType::SimplePassphrase => "SMPL",
            EncryptionType::KeyPair => "KYPR",
        }
    }

    pub fn name(self) -> &'static str {
        self.tag()
    }

    pub(crate) fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; 4];
        reader.read_exact(&mut raw)?;
        raw.reverse();
        let tag = String::from_utf8_lossy(&raw).into_owned();
        [
            EncryptionType::None,
            EncryptionType::SimplePassphrase,
            EncryptionType::KeyPair,
        ]
        .into_iter()
        .find(|e| e.tag() == tag)
        .ok_or(MaterialError::UnknownEncryption(tag))
    }

    pub(crate) fn write<W: Write>(self, writer: &mut W) -> Result<()> {
        let mut raw: [u8; 4] = self.tag().as_bytes().try_into().unwrap();
        raw.reverse();
        writer.write_all(&raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tag_is_stored_reversed() {
        let mut buffer = Vec::new();
        EncryptionType::None.write(&mut buffer).unwrap();
        assert_eq!(&buffer, b"ENON");
        let mut cursor = Cursor::new(buffer);
        assert_eq!(
            EncryptionType::read(&mut cursor).unwrap(),
            EncryptionType::None
        );
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let mut cursor = Cursor::new(b"XXXX".to_vec());
        assert!(matches!(
            EncryptionType::read(&mut cursor),
            Err(MaterialError::UnknownEncryption(_))
        ));
    }
}
