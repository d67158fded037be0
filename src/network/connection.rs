//! Connection handling dengan buffered I/O
//!
//! Pre-allocated buffers untuk zero-allocation pada hot path.
//! Generic atas pasangan `Read`/`Write`, jadi stdin/stdout, pipe, atau
//! buffer in-memory (untuk test) bisa dipakai tanpa beda.

use std::io::{self, Read, Write};

/// Buffered byte connection to the front-end
pub struct Connection<R, W> {
    reader: R,
    writer: W,
    read_buffer: Box<[u8]>,
    write_buffer: Vec<u8>,
    read_pos: usize,
    read_len: usize,
    write_pos: usize,
}

impl<R: Read, W: Write> Connection<R, W> {
    pub fn new(reader: R, writer: W, read_size: usize, write_size: usize) -> Self {
        Self {
            reader,
            writer,
            read_buffer: vec![0u8; read_size.max(1)].into_boxed_slice(),
            write_buffer: vec![0u8; write_size.max(1)],
            read_pos: 0,
            read_len: 0,
            write_pos: 0,
        }
    }

    /// Read data ke internal buffer
    ///
    /// Returns jumlah bytes yang tersedia untuk dibaca. End of input is
    /// reported as `UnexpectedEof`.
    #[inline]
    pub fn fill_read_buffer(&mut self) -> io::Result<usize> {
        // Compact buffer jika perlu
        if self.read_pos > 0 {
            let remaining = self.read_len - self.read_pos;
            if remaining > 0 {
                self.read_buffer
                    .copy_within(self.read_pos..self.read_len, 0);
            }
            self.read_len = remaining;
            self.read_pos = 0;
        }

        if self.read_len == self.read_buffer.len() {
            return Ok(self.read_len);
        }

        loop {
            match self.reader.read(&mut self.read_buffer[self.read_len..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "input closed",
                    ))
                }
                Ok(n) => {
                    self.read_len += n;
                    return Ok(self.read_len);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(self.read_len - self.read_pos)
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Get readable data slice (zero-copy)
    #[inline(always)]
    pub fn readable(&self) -> &[u8] {
        &self.read_buffer[self.read_pos..self.read_len]
    }

    /// Consume n bytes dari read buffer
    #[inline(always)]
    pub fn consume(&mut self, n: usize) {
        self.read_pos += n.min(self.read_len - self.read_pos);
    }

    /// Queue data untuk write (copy ke write buffer)
    ///
    /// Bytes always leave in queue order. If output is not accepting and
    /// the buffer is full, the buffer grows instead of writing around it.
    #[inline]
    pub fn queue_write(&mut self, data: &[u8]) -> io::Result<()> {
        if self.write_pos + data.len() > self.write_buffer.len() {
            // Flush dulu jika buffer penuh
            self.flush_write_buffer()?;
        }

        let end = self.write_pos + data.len();
        if end > self.write_buffer.len() {
            self.write_buffer.resize(end, 0);
        }

        self.write_buffer[self.write_pos..end].copy_from_slice(data);
        self.write_pos = end;

        Ok(())
    }

    /// Flush write buffer ke output
    ///
    /// Stops early on `WouldBlock`; whatever did not fit stays pending
    /// (see [`Connection::write_pending`]).
    #[inline]
    pub fn flush_write_buffer(&mut self) -> io::Result<()> {
        if self.write_pos == 0 {
            return self.writer.flush();
        }

        let mut written = 0;
        while written < self.write_pos {
            match self.writer.write(&self.write_buffer[written..self.write_pos]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write to output",
                    ));
                }
                Ok(n) => written += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    // Partial write, compact buffer
                    if written > 0 {
                        self.write_buffer.copy_within(written..self.write_pos, 0);
                        self.write_pos -= written;
                    }
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        self.write_pos = 0;
        self.writer.flush()
    }

    /// Keep flushing until nothing is pending
    pub fn flush_all(&mut self) -> io::Result<()> {
        loop {
            self.flush_write_buffer()?;
            if self.write_pos == 0 {
                return Ok(());
            }
            std::thread::yield_now();
        }
    }

    /// Bytes pending in write buffer
    #[inline(always)]
    pub fn write_pending(&self) -> usize {
        self.write_pos
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Take the output side back, e.g. to inspect what a test wrote
    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out one scripted result per call
    struct Scripted(Vec<io::Result<Vec<u8>>>);

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Ok(0);
            }
            let chunk = self.0.remove(0)?;
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_fill_and_consume() {
        let mut conn = Connection::new(Cursor::new(b"(a b)".to_vec()), Vec::new(), 64, 64);
        assert_eq!(conn.fill_read_buffer().unwrap(), 5);
        assert_eq!(conn.readable(), b"(a b)");
        conn.consume(3);
        assert_eq!(conn.readable(), b"b)");

        let err = conn.fill_read_buffer().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        // Unconsumed bytes survive compaction
        assert_eq!(conn.readable(), b"b)");
    }

    #[test]
    fn test_would_block_is_not_an_error() {
        let reader = Scripted(vec![
            Err(io::ErrorKind::WouldBlock.into()),
            Err(io::ErrorKind::Interrupted.into()),
            Ok(b"x".to_vec()),
        ]);
        let mut conn = Connection::new(reader, Vec::new(), 16, 16);
        assert_eq!(conn.fill_read_buffer().unwrap(), 0);
        assert_eq!(conn.fill_read_buffer().unwrap(), 1);
    }

    /// Writer that refuses the first `refusals` writes with `WouldBlock`
    #[derive(Default)]
    struct Stalling {
        refusals: usize,
        out: Vec<u8>,
    }

    impl Write for Stalling {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.refusals > 0 {
                self.refusals -= 1;
                return Err(io::ErrorKind::WouldBlock.into());
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_queue_and_flush() {
        let mut conn = Connection::new(io::empty(), Vec::new(), 16, 8);
        conn.queue_write(b"abc").unwrap();
        assert_eq!(conn.write_pending(), 3);
        assert!(conn.writer().is_empty());

        // Larger than the buffer: pending bytes go out first, in order
        conn.queue_write(b"0123456789").unwrap();
        conn.flush_write_buffer().unwrap();
        assert_eq!(conn.write_pending(), 0);
        assert_eq!(conn.into_writer(), b"abc0123456789");
    }

    #[test]
    fn test_stalled_output_keeps_order() {
        let writer = Stalling {
            refusals: 2,
            ..Stalling::default()
        };
        let mut conn = Connection::new(io::empty(), writer, 16, 8);
        conn.queue_write(b"abcdef").unwrap();
        conn.queue_write(b"0123456789").unwrap();
        assert_eq!(conn.write_pending(), 16);
        assert!(conn.writer().out.is_empty());

        conn.flush_write_buffer().unwrap();
        assert_eq!(conn.write_pending(), 16);
        conn.flush_write_buffer().unwrap();
        assert_eq!(conn.write_pending(), 0);
        assert_eq!(conn.into_writer().out, b"abcdef0123456789");
    }

    #[test]
    fn test_flush_all_waits_out_would_block() {
        let writer = Stalling {
            refusals: 3,
            ..Stalling::default()
        };
        let mut conn = Connection::new(io::empty(), writer, 16, 16);
        conn.queue_write(b"; bye\n").unwrap();
        conn.flush_all().unwrap();
        assert_eq!(conn.write_pending(), 0);
        assert_eq!(conn.into_writer().out, b"; bye\n");
    }
}
