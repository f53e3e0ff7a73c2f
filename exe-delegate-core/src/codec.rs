use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::{CommandRecord, DelegateError, Result};

/// Separator between the host binary and the encoded record.
///
/// 0xF0 is never a UTF-8 continuation byte, so the marker cannot occur
/// inside an encoded (JSON) record.
pub const MARKER: [u8; 4] = [0xda, 0xf0, 0x47, 0x5c];

/// The marker must start within this many bytes of the end of the file.
pub const MAX_TAIL_WINDOW: usize = 1024;

/// Returns `MARKER` followed by the encoded record.
pub fn encode_block(record: &CommandRecord) -> Result<Vec<u8>> {
    record.validate()?;
    let encoded = record.encode()?;

    let mut block = Vec::with_capacity(MARKER.len() + encoded.len());
    block.extend_from_slice(&MARKER);
    block.extend_from_slice(&encoded);

    if block.len() > MAX_TAIL_WINDOW {
        return Err(DelegateError::RecordTooLarge {
            size: block.len(),
            limit: MAX_TAIL_WINDOW,
        });
    }
    Ok(block)
}

/// Copies `host` into `out` verbatim and appends the metadata block.
///
/// Returns the total number of bytes written.
pub fn append_to<R: Read, W: Write>(
    host: &mut R,
    record: &CommandRecord,
    out: &mut W,
) -> Result<u64> {
    let block = encode_block(record)?;
    let copied = io::copy(host, out).map_err(DelegateError::io("failed to copy host binary"))?;
    out.write_all(&block)
        .map_err(DelegateError::io("failed to write metadata block"))?;
    out.flush()
        .map_err(DelegateError::io("failed to flush delegate binary"))?;
    Ok(copied + block.len() as u64)
}

/// Writes a delegate binary to `output`: the bytes of `host` followed by
/// the metadata block for `record`.
///
/// `output` is created or truncated. It receives the host's permission
/// bits. A failure part way through can leave a partial file behind.
pub fn append(host: &Path, record: &CommandRecord, output: &Path) -> Result<()> {
    let mut sink = File::create(output).map_err(DelegateError::io(format!(
        "failed to create {}",
        output.display()
    )))?;
    write_delegate(host, record, &mut sink)?;
    log::debug!("wrote delegate {}", output.display());
    Ok(())
}

pub(crate) fn write_delegate(host: &Path, record: &CommandRecord, sink: &mut File) -> Result<()> {
    let mut source = File::open(host).map_err(DelegateError::io(format!(
        "failed to open host binary {}",
        host.display()
    )))?;
    let permissions = source
        .metadata()
        .map_err(DelegateError::io(format!("failed to stat {}", host.display())))?
        .permissions();

    let written = append_to(&mut source, record, sink)?;
    log::debug!("copied {} with metadata, {written} bytes", host.display());

    sink.set_permissions(permissions)
        .map_err(DelegateError::io("failed to set delegate permissions"))?;
    sink.sync_all()
        .map_err(DelegateError::io("failed to sync delegate binary"))?;
    Ok(())
}

/// Index of the last marker in `window` that is followed by at least one
/// byte of record data.
pub fn find_marker(window: &[u8]) -> Option<usize> {
    if window.len() <= MARKER.len() {
        return None;
    }
    window[..window.len() - 1]
        .windows(MARKER.len())
        .rposition(|candidate| candidate == MARKER.as_slice())
}

/// Reads the tail window of `reader` and decodes the record after the
/// last marker in it.
pub fn scan_reader<R: Read + Seek>(reader: &mut R) -> Result<CommandRecord> {
    let size = reader
        .seek(SeekFrom::End(0))
        .map_err(DelegateError::io("failed to seek to end of file"))?;
    let start = size.saturating_sub(MAX_TAIL_WINDOW as u64);
    reader
        .seek(SeekFrom::Start(start))
        .map_err(DelegateError::io("failed to seek to tail window"))?;

    let mut window = Vec::with_capacity(MAX_TAIL_WINDOW);
    reader
        .by_ref()
        .take(MAX_TAIL_WINDOW as u64)
        .read_to_end(&mut window)
        .map_err(DelegateError::io("failed to read tail window"))?;
    log::trace!("read {} byte tail window at offset {start}", window.len());

    let index = find_marker(&window).ok_or(DelegateError::NotFound)?;
    let meta = &window[index + MARKER.len()..];
    log::debug!(
        "marker at window offset {index}, metadata: {}",
        String::from_utf8_lossy(meta)
    );

    CommandRecord::decode(meta)
}

/// Opens `path` and scans its tail window for a record.
pub fn scan(path: &Path) -> Result<CommandRecord> {
    let mut file = File::open(path).map_err(DelegateError::io(format!(
        "failed to open {}",
        path.display()
    )))?;
    scan_reader(&mut file)
}

/// Like [`scan`], but any failure just means "not a delegate".
pub fn detect(path: &Path) -> Option<CommandRecord> {
    match scan(path) {
        Ok(record) => Some(record),
        Err(err) => {
            log::debug!("{} is not a delegate: {err}", path.display());
            None
        }
    }
}
