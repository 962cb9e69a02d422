//! Little-endian primitives of the container format: fixed-width integers
//! plus length-prefixed byte arrays and strings (u32 length).

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::Result;

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    Ok(reader.read_u64::<LittleEndian>()?)
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    Ok(reader.read_u32::<LittleEndian>()?)
}

pub(crate) fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    Ok(reader.read_u16::<LittleEndian>()?)
}

pub(crate) fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    Ok(reader.read_u8()?)
}

pub(crate) fn read_bool<R: Read>(reader: &mut R) -> Result<bool> {
    Ok(reader.read_u8()? != 0)
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> Result<f32> {
    Ok(reader.read_f32::<LittleEndian>()?)
}

pub(crate) fn read_bytes<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

pub(crate) fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    Ok(String::from_utf8(read_bytes(reader)?)?)
}

pub(crate) fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    Ok(writer.write_u64::<LittleEndian>(value)?)
}

pub(crate) fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    Ok(writer.write_u32::<LittleEndian>(value)?)
}

pub(crate) fn write_u16<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    Ok(writer.write_u16::<LittleEndian>(value)?)
}

pub(crate) fn write_u8<W: Write>(writer: &mut W, value: u8) -> Result<()> {
    Ok(writer.write_u8(value)?)
}

pub(crate) fn write_bool<W: Write>(writer: &mut W, value: bool) -> Result<()> {
    Ok(writer.write_u8(value as u8)?)
}

pub(crate) fn write_f32<W: Write>(writer: &mut W, value: f32) -> Result<()> {
    Ok(writer.write_f32::<LittleEndian>(value)?)
}

pub(crate) fn write_bytes<W: Write>(writer: &mut W, value: &[u8]) -> Result<()> {
    write_u32(writer, value.len() as u32)?;
    writer.write_all(value)?;
    Ok(())
}

pub(crate) fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    write_bytes(writer, value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strings_are_u32_length_prefixed() {
        let mut buffer = Vec::new();
        write_string(&mut buffer, "pass").unwrap();
        assert_eq!(buffer, [4, 0, 0, 0, b'p', b'a', b's', b's']);
        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_string(&mut cursor).unwrap(), "pass");
    }

    #[test]
    fn primitives_round_trip() {
        let mut buffer = Vec::new();
        write_u64(&mut buffer, 168942106).unwrap();
        write_u16(&mut buffer, 22).unwrap();
        write_bool(&mut buffer, true).unwrap();
        write_f32(&mut buffer, 0.5).unwrap();
        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_u64(&mut cursor).unwrap(), 168942106);
        assert_eq!(read_u16(&mut cursor).unwrap(), 22);
        assert!(read_bool(&mut cursor).unwrap());
        assert_eq!(read_f32(&mut cursor).unwrap(), 0.5);
    }
}
