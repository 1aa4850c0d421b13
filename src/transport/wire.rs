//! Buffered reader over a socket stream
//!
//! `WireReader` keeps bytes that were read from the stream but not yet
//! consumed, so a response parser can pull bounded segments, single lines or
//! exact byte counts without losing data that arrived early. Bytes left over
//! after one response stay buffered for the next exchange on the same
//! keep-alive connection.

use std::io::{self, Read};

pub struct WireReader<R> {
    inner: R,
    pending: Vec<u8>,
    block_size: usize,
}

impl<R: Read> WireReader<R> {
    /// Wraps `inner`; every socket read asks for at most `block_size` bytes
    /// unless an exact byte count is being assembled.
    pub fn new(inner: R, block_size: usize) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            block_size: block_size.max(1),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Number of bytes read from the stream but not yet consumed
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Returns up to `max` bytes: buffered bytes first, otherwise one read.
    ///
    /// An empty vector means the peer closed the stream.
    pub fn read_segment(&mut self, max: usize) -> io::Result<Vec<u8>> {
        let max = max.max(1);
        if !self.pending.is_empty() {
            let take = max.min(self.pending.len());
            return Ok(self.pending.drain(..take).collect());
        }

        let mut buf = vec![0u8; max];
        let n = self.read_inner(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Pushes bytes back so they are returned before anything else
    pub fn unread(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut restored = Vec::with_capacity(bytes.len() + self.pending.len());
        restored.extend_from_slice(bytes);
        restored.append(&mut self.pending);
        self.pending = restored;
    }

    /// Reads one line, returning it without its `\n` or `\r\n` terminator.
    ///
    /// Returns `None` if the stream ends before a terminator is seen; any
    /// partial line stays buffered.
    pub fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut scanned = 0;
        loop {
            if let Some(pos) = self.pending[scanned..].iter().position(|b| *b == b'\n') {
                let end = scanned + pos;
                let mut line: Vec<u8> = self.pending.drain(..=end).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }
            scanned = self.pending.len();

            if !self.fill()? {
                return Ok(None);
            }
        }
    }

    /// Reads exactly `len` bytes, or `None` if the stream ends first.
    ///
    /// Socket reads ask only for the bytes still missing, so nothing past the
    /// requested range is pulled off the stream.
    pub fn read_exact_bytes(&mut self, len: usize) -> io::Result<Option<Vec<u8>>> {
        let take = len.min(self.pending.len());
        let mut out: Vec<u8> = Vec::with_capacity(take.max(len.min(self.block_size)));
        out.extend(self.pending.drain(..take));

        // Grow with the bytes that actually arrive, never with the declared length
        let mut buf = vec![0u8; self.block_size];
        while out.len() < len {
            let want = (len - out.len()).min(buf.len());
            let n = self.read_inner(&mut buf[..want])?;
            if n == 0 {
                let partial = std::mem::take(&mut out);
                self.unread(&partial);
                return Ok(None);
            }
            out.extend_from_slice(&buf[..n]);
        }
        Ok(Some(out))
    }

    /// Appends one block from the stream to the pending buffer.
    ///
    /// Returns false when the peer closed the stream.
    fn fill(&mut self) -> io::Result<bool> {
        let mut buf = vec![0u8; self.block_size];
        let n = self.read_inner(&mut buf)?;
        self.pending.extend_from_slice(&buf[..n]);
        Ok(n > 0)
    }

    fn read_inner(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}
