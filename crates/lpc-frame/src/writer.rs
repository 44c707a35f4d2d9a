use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Writes complete SLIP frames to any `Write` stream.
///
/// Each frame is written and flushed before `send` returns; nothing is held
/// back or reordered.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    frames_written: u64,
    bytes_written: u64,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            frames_written: 0,
            bytes_written: 0,
        }
    }

    /// Frame and write a payload (blocking). Returns the wire size.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(payload, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::SinkClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;
        self.frames_written += 1;
        self.bytes_written += self.buf.len() as u64;
        tracing::trace!(
            payload = payload.len(),
            wire = self.buf.len(),
            "frame written"
        );
        Ok(self.buf.len())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Number of wire bytes written so far, delimiters and escapes included.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::reader::FrameReader;

    #[test]
    fn reset_clock_all_on_the_wire() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        let wire = writer.send(&[0x00, 0xFF, 0xFF]).unwrap();

        assert_eq!(wire, 5);
        let bytes = writer.into_inner().into_inner();
        assert_eq!(bytes, vec![0xC0, 0x00, 0xFF, 0xFF, 0xC0]);
    }

    #[test]
    fn frames_keep_emission_order() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.send(&[0x04, 0xFF, 0xFF, b'M']).unwrap();
        writer.send(&[0xC0]).unwrap();
        writer.send(&[0xFF, 0x03]).unwrap();

        assert_eq!(writer.frames_written(), 3);
        assert_eq!(writer.bytes_written(), 6 + 4 + 4);

        let wire = writer.into_inner().into_inner();
        let frames = FrameReader::new(Cursor::new(wire)).read_all().unwrap();
        let frames: Vec<&[u8]> = frames.iter().map(|f| f.as_ref()).collect();
        assert_eq!(
            frames,
            vec![&[0x04, 0xFF, 0xFF, b'M'][..], &[0xC0][..], &[0xFF, 0x03][..]]
        );
    }

    #[test]
    fn oversized_payload_writes_nothing() {
        let cfg = FrameConfig {
            max_payload_size: 4,
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(&[0xC1; 5]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 5, max: 4 }));
        assert_eq!(writer.frames_written(), 0);
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn every_frame_is_flushed_through_interruptions() {
        let mut writer = FrameWriter::new(FlakySink::default());

        writer.send(&[0xFF, 0x00, 0x01, 0x00]).unwrap();
        writer.send(&[0xFF, 0x03]).unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.flushes, 2);
        assert_eq!(
            sink.data,
            vec![0xC0, 0xFF, 0x00, 0x01, 0x00, 0xC0, 0xC0, 0xFF, 0x03, 0xC0]
        );
    }

    #[test]
    fn zero_length_write_means_sink_closed() {
        let mut writer = FrameWriter::new(ClosedSink);
        let err = writer.send(&[0x00, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(err, FrameError::SinkClosed));
        assert_eq!(writer.bytes_written(), 0);
    }

    /// Interrupts every other call and accepts at most three bytes per write.
    #[derive(Default)]
    struct FlakySink {
        data: Vec<u8>,
        calls: usize,
        flushes: usize,
    }

    impl FlakySink {
        fn interrupt(&mut self) -> bool {
            self.calls += 1;
            self.calls % 2 == 1
        }
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.interrupt() {
                return Err(ErrorKind::Interrupted.into());
            }
            let n = buf.len().min(3);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if self.interrupt() {
                return Err(ErrorKind::WouldBlock.into());
            }
            self.flushes += 1;
            Ok(())
        }
    }

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
