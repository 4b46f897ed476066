use tracing::error;

use crate::{
    adapters::ObjectReader,
    error::{BindingError, Result, StorageError},
};

/// Largest range requested from the backend in one read.
pub const READ_BUFFER_MAX: usize = 0x40000;

/// Reads `size` bytes of an object into a single buffer.
pub fn read_all(reader: &dyn ObjectReader, size: u64) -> Result<Vec<u8>> {
    read_all_chunked(reader, size, READ_BUFFER_MAX)
}

/// Reads `size` bytes in fixed `chunk_len` ranges; the last range is cut to
/// end exactly at `size`.
///
/// A range that comes back short or failed discards the whole buffer.
pub fn read_all_chunked(reader: &dyn ObjectReader, size: u64, chunk_len: usize) -> Result<Vec<u8>> {
    let total = usize::try_from(size).map_err(|_| BindingError::Read {
        offset: 0,
        requested: 0,
        read: 0,
        source: Some(StorageError::new(format!("object size {} exceeds memory", size))),
    })?;
    let chunk_len = chunk_len.max(1);

    let mut data = vec![0u8; total];
    let mut i = 0usize;
    while i < total {
        let end = i.saturating_add(chunk_len).min(total);
        let requested = end - i;

        let res = reader.read_at(&mut data[i..end], i as u64);
        let err = match res {
            Ok(n) if n == requested => None,
            Ok(n) => Some((n, None)),
            Err(err) => Some((0, Some(err))),
        };

        if let Some((read, source)) = err {
            let err = BindingError::Read {
                offset: i as u64,
                requested,
                read,
                source,
            };
            error!(error_message=%err, error_group="read_at");
            return Err(err);
        }

        i = end;
    }

    Ok(data)
}
