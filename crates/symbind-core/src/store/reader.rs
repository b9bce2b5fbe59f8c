//! Little-endian cursor over a decompressed payload.

use crate::error::{LoadError, LoadResult};

pub(crate) struct ByteReader<'a>
{
    data: &'a [u8],
    pos: usize,
    table: &'static str,
}

impl<'a> ByteReader<'a>
{
    pub(crate) const fn new(data: &'a [u8]) -> Self
    {
        Self {
            data,
            pos: 0,
            table: "header",
        }
    }

    /// Name the table being read, for error reports
    pub(crate) fn enter(&mut self, table: &'static str)
    {
        self.table = table;
    }

    pub(crate) const fn position(&self) -> usize
    {
        self.pos
    }

    pub(crate) const fn remaining(&self) -> usize
    {
        self.data.len() - self.pos
    }

    fn take(&mut self, needed: usize) -> LoadResult<&'a [u8]>
    {
        if self.remaining() < needed {
            return Err(LoadError::Truncated {
                table: self.table,
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> LoadResult<[u8; N]>
    {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> LoadResult<u8>
    {
        Ok(self.take_array::<1>()?[0])
    }

    pub(crate) fn read_u16(&mut self) -> LoadResult<u16>
    {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> LoadResult<u32>
    {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_i32(&mut self) -> LoadResult<i32>
    {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_u64(&mut self) -> LoadResult<u64>
    {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_i64(&mut self) -> LoadResult<i64>
    {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    /// A u16 byte length followed by UTF-8
    pub(crate) fn read_string(&mut self) -> LoadResult<String>
    {
        let len = usize::from(self.read_u16()?);
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| LoadError::InvalidUtf8 {
            table: self.table,
            offset,
        })
    }

    /// A u64 element count, checked against what the payload can still hold
    pub(crate) fn read_count(&mut self, min_record_size: usize) -> LoadResult<usize>
    {
        let count = self.read_u64()?;
        let fits = usize::try_from(count)
            .ok()
            .filter(|n| n.checked_mul(min_record_size).is_some_and(|bytes| bytes <= self.remaining()));
        fits.ok_or(LoadError::CountOverflow {
            table: self.table,
            count,
        })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_reads_little_endian()
    {
        let data = [0x01, 0x02, 0xff, 0xff, 0xff, 0xff];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u16().unwrap(), 0x0201);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_value_reports_offset()
    {
        let data = [0x01, 0x02, 0x03];
        let mut reader = ByteReader::new(&data);
        reader.enter("tokens");
        let err = reader.read_u32().unwrap_err();
        let message = format!("{}", err);
        assert!(message.contains("tokens"));
        assert!(message.contains("offset 0"));
    }

    #[test]
    fn test_count_larger_than_payload_is_rejected()
    {
        let data = u64::MAX.to_le_bytes();
        let mut reader = ByteReader::new(&data);
        assert!(matches!(reader.read_count(1), Err(LoadError::CountOverflow { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_rejected()
    {
        let data = [0x02, 0x00, 0xc3, 0x28];
        let mut reader = ByteReader::new(&data);
        assert!(matches!(reader.read_string(), Err(LoadError::InvalidUtf8 { offset: 2, .. })));
    }
}
