//! Little-endian payload builder, the mirror of [`super::reader`].

use crate::error::{LoadError, LoadResult};

#[derive(Default)]
pub(crate) struct ByteWriter
{
    buf: Vec<u8>,
}

impl ByteWriter
{
    pub(crate) fn into_inner(self) -> Vec<u8>
    {
        self.buf
    }

    pub(crate) fn write_u8(&mut self, value: u8)
    {
        self.buf.push(value);
    }

    pub(crate) fn write_u32(&mut self, value: u32)
    {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_i32(&mut self, value: i32)
    {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, value: u64)
    {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_i64(&mut self, value: i64)
    {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn write_count(&mut self, count: usize)
    {
        self.write_u64(count as u64);
    }

    pub(crate) fn write_string(&mut self, value: &str) -> LoadResult<()>
    {
        let len = u16::try_from(value.len()).map_err(|_| LoadError::StringTooLong { len: value.len() })?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }
}
