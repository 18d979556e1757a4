// ABOUTME: Frame-level reader and writer over any async byte stream
// ABOUTME: Buffers partial PDUs on read and batches writes through a BufWriter

use crate::client::{SmppError, SmppResult};
use crate::codec::{CodecError, Encodable, Frame};
use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};

/// Read half of an SMPP connection.
///
/// An SMPP session runs over one TCP stream: the ESME opens it, binds,
/// exchanges PDUs in the bound state, unbinds and closes. This type only
/// turns bytes into frames; the session state lives in the engine.
#[derive(Debug)]
pub struct FrameReader<R> {
    stream: R,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        FrameReader {
            stream,
            // 4KB fits several typical PDUs; the buffer grows for larger ones.
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` value from the underlying stream.
    ///
    /// The function waits until it has retrieved enough data to parse a frame.
    /// Any data remaining in the read buffer after the frame has been parsed is
    /// kept there for the next call to `read_frame`.
    ///
    /// Returns the frame with its encoded length. If the stream is closed in
    /// a way that doesn't break a frame in half, it returns `None`.
    pub async fn read_frame(&mut self) -> SmppResult<Option<(Frame, usize)>> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            // `0` indicates "end of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // For this to be a clean shutdown, there should be no data in
                // the read buffer.
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(SmppError::Connection(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )));
            }
        }
    }

    /// Tries to parse a frame from the buffer. If not enough data has been
    /// buffered yet, `Ok(None)` is returned. If the buffered data does not
    /// represent a valid frame, `Err` is returned and the connection should
    /// be dropped.
    fn parse_frame(&mut self) -> SmppResult<Option<(Frame, usize)>> {
        let mut buf = Cursor::new(&self.buffer[..]);

        // Checking the length first avoids allocating anything until the
        // whole PDU is buffered.
        let len = match Frame::check(&mut buf) {
            Ok(len) => len,
            Err(CodecError::Incomplete) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        buf.set_position(0);
        let frame = Frame::parse(&mut buf)?;

        self.buffer.advance(len);

        Ok(Some((frame, len)))
    }
}

/// Write half of an SMPP connection
#[derive(Debug)]
pub struct FrameWriter<W: AsyncWrite> {
    stream: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(stream: W) -> Self {
        FrameWriter {
            stream: BufWriter::new(stream),
        }
    }

    /// Encode and write one frame, flushing it to the socket. Returns the
    /// number of bytes written.
    pub async fn write_frame(&mut self, frame: &Frame) -> SmppResult<usize> {
        let bytes = frame.to_bytes()?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(bytes.len())
    }

    /// Flush and shut down the write direction
    pub async fn shutdown(&mut self) -> SmppResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{CommandId, EnquireLink, SubmitSmResponse};
    use tokio::io::duplex;

    #[tokio::test]
    async fn frames_survive_a_byte_stream() {
        let (client, server) = duplex(64);
        let mut writer = FrameWriter::new(client);
        let mut reader = FrameReader::new(server);

        let written = writer
            .write_frame(&Frame::SubmitSmResp(SubmitSmResponse::new(5, "msg-1")))
            .await
            .unwrap();
        writer
            .write_frame(&Frame::EnquireLink(EnquireLink::new(6)))
            .await
            .unwrap();

        let (first, len) = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(len, written);
        assert_eq!(first.command_id(), CommandId::SubmitSmResp);

        let (second, _) = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(second.sequence_number(), 6);
    }

    #[tokio::test]
    async fn clean_eof_returns_none() {
        let (client, server) = duplex(64);
        drop(client);

        let mut reader = FrameReader::new(server);
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn eof_inside_frame_is_an_error() {
        let (mut client, server) = duplex(64);
        client.write_all(&[0x00, 0x00, 0x00, 0x10, 0x00]).await.unwrap();
        drop(client);

        let mut reader = FrameReader::new(server);
        assert!(matches!(
            reader.read_frame().await,
            Err(SmppError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn invalid_length_is_fatal() {
        let (mut client, server) = duplex(64);
        client
            .write_all(&[
                0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x01,
            ])
            .await
            .unwrap();

        let mut reader = FrameReader::new(server);
        assert!(matches!(reader.read_frame().await, Err(SmppError::Codec(_))));
    }
}
