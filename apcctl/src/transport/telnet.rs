//! Telnet transport over a raw TCP stream.
//!
//! The device speaks plain NVT text once negotiation is out of the way:
//! inbound IAC sequences are scrubbed before prompt matching and every
//! DO/WILL request is refused, which makes the server fall back to the
//! line-oriented menu this crate drives.

use std::future::Future;
use std::time::Duration;

use bytes::BytesMut;
use log::{debug, trace};
use memchr::memchr;
use regex::bytes::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};

use super::config::DeviceEndpoint;
use crate::channel::PatternBuffer;
use crate::error::{ConnectionError, TransportError};

const IAC: u8 = 0xFF;
const SE: u8 = 0xF0;
const SB: u8 = 0xFA;
const WILL: u8 = 0xFB;
const WONT: u8 = 0xFC;
const DO: u8 = 0xFD;
const DONT: u8 = 0xFE;

/// Byte-stream seam the authenticator and navigator drive.
///
/// Implementations send CR-terminated keystrokes and block until the
/// incoming stream contains an expected prompt. Tests implement this with
/// scripted fakes; [`TelnetTransport`] is the production implementation.
pub trait Transport: Send {
    /// Write `keystroke` followed by a carriage return.
    fn send_line(&mut self, keystroke: &str)
    -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Block until `prompt` appears in the incoming stream or `wait`
    /// elapses, returning all text consumed through the end of the match.
    fn wait_for(
        &mut self,
        prompt: &Regex,
        wait: Duration,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// Release the connection.
    fn close(self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Telnet transport wrapping a tokio TCP stream.
pub struct TelnetTransport {
    stream: TcpStream,
    buffer: PatternBuffer,

    /// Incomplete IAC sequence carried over from the previous read.
    carry: Vec<u8>,

    chunk: BytesMut,
    peer: String,
}

impl TelnetTransport {
    /// Connect to the device within the endpoint's timeout.
    pub async fn connect(endpoint: &DeviceEndpoint) -> Result<Self, ConnectionError> {
        let addr = endpoint.socket_addr();
        debug!("connecting to {addr}");

        let stream = match timeout(endpoint.timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConnectionError::Failed {
                    host: endpoint.host.clone(),
                    port: endpoint.port,
                    source,
                });
            }
            Err(_) => {
                return Err(ConnectionError::Timeout {
                    host: endpoint.host.clone(),
                    port: endpoint.port,
                    timeout: endpoint.timeout,
                });
            }
        };

        Ok(Self {
            stream,
            buffer: PatternBuffer::default(),
            carry: Vec::new(),
            chunk: BytesMut::with_capacity(4096),
            peer: addr,
        })
    }
}

impl Transport for TelnetTransport {
    async fn send_line(&mut self, keystroke: &str) -> Result<(), TransportError> {
        self.stream.write_all(keystroke.as_bytes()).await?;
        self.stream.write_all(b"\r").await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn wait_for(&mut self, prompt: &Regex, wait: Duration) -> Result<String, TransportError> {
        let deadline = Instant::now() + wait;
        loop {
            if let Some(end) = self.buffer.find_tail(prompt) {
                let consumed = self.buffer.consume_to(end);
                trace!(
                    "{}: matched {:?} after {} bytes",
                    self.peer,
                    prompt.as_str(),
                    consumed.len()
                );
                return Ok(String::from_utf8_lossy(&consumed).into_owned());
            }

            let remaining = deadline.checked_duration_since(Instant::now()).ok_or_else(|| {
                TransportError::PromptTimeout {
                    pattern: prompt.as_str().to_string(),
                    timeout: wait,
                }
            })?;

            self.chunk.clear();
            let read = timeout(remaining, self.stream.read_buf(&mut self.chunk)).await;
            let n = match read {
                Ok(Ok(n)) => n,
                Ok(Err(source)) => return Err(TransportError::Io(source)),
                Err(_) => {
                    return Err(TransportError::PromptTimeout {
                        pattern: prompt.as_str().to_string(),
                        timeout: wait,
                    });
                }
            };
            if n == 0 {
                return Err(TransportError::Disconnected);
            }

            let mut raw = std::mem::take(&mut self.carry);
            raw.extend_from_slice(&self.chunk);
            let scrubbed = scrub_telnet(&raw);
            self.carry = scrubbed.carry;
            if !scrubbed.replies.is_empty() {
                trace!("{}: refusing {} negotiation bytes", self.peer, scrubbed.replies.len());
                self.stream.write_all(&scrubbed.replies).await?;
                self.stream.flush().await?;
            }
            self.buffer.extend(&scrubbed.cleaned);
        }
    }

    async fn close(mut self) -> Result<(), TransportError> {
        debug!("closing connection to {}", self.peer);
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Outcome of scrubbing one raw chunk.
struct Scrubbed {
    /// Plain text with all IAC sequences removed.
    cleaned: Vec<u8>,
    /// Refusals (WONT/DONT) owed to the server.
    replies: Vec<u8>,
    /// Incomplete trailing sequence to retry with the next read.
    carry: Vec<u8>,
}

/// Strip telnet IAC sequences from a raw chunk, per RFC 854.
///
/// DO becomes a WONT refusal and WILL a DONT refusal; subnegotiations are
/// skipped through IAC SE; an escaped IAC IAC yields a literal 0xFF data
/// byte. A sequence cut off at the chunk boundary is returned as carry.
fn scrub_telnet(input: &[u8]) -> Scrubbed {
    let mut cleaned = Vec::with_capacity(input.len());
    let mut replies = Vec::new();
    let mut rest = input;

    loop {
        let Some(pos) = memchr(IAC, rest) else {
            cleaned.extend_from_slice(rest);
            return Scrubbed {
                cleaned,
                replies,
                carry: Vec::new(),
            };
        };

        cleaned.extend_from_slice(&rest[..pos]);
        let seq = &rest[pos..];
        match seq.get(1) {
            None => {
                return Scrubbed {
                    cleaned,
                    replies,
                    carry: seq.to_vec(),
                };
            }
            Some(&IAC) => {
                cleaned.push(IAC);
                rest = &seq[2..];
            }
            Some(&(cmd @ (WILL | WONT | DO | DONT))) => match seq.get(2) {
                None => {
                    return Scrubbed {
                        cleaned,
                        replies,
                        carry: seq.to_vec(),
                    };
                }
                Some(&option) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    rest = &seq[3..];
                }
            },
            Some(&SB) => match subnegotiation_end(seq) {
                Some(end) => rest = &seq[end..],
                None => {
                    return Scrubbed {
                        cleaned,
                        replies,
                        carry: seq.to_vec(),
                    };
                }
            },
            // two-byte commands (NOP, GA, ...) carry no option byte
            Some(_) => rest = &seq[2..],
        }
    }
}

/// Offset one past the IAC SE terminator of a subnegotiation starting at
/// `seq[0] == IAC`, or None if the terminator is not in this chunk.
fn subnegotiation_end(seq: &[u8]) -> Option<usize> {
    let mut from = 2;
    while let Some(pos) = memchr(IAC, &seq[from..]) {
        let at = from + pos;
        match seq.get(at + 1) {
            Some(&SE) => return Some(at + 2),
            Some(_) => from = at + 2,
            None => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ECHO: u8 = 0x01;

    #[test]
    fn test_plain_text_passes_through() {
        let scrubbed = scrub_telnet(b"User Name : ");
        assert_eq!(scrubbed.cleaned, b"User Name : ");
        assert!(scrubbed.replies.is_empty());
        assert!(scrubbed.carry.is_empty());
    }

    #[test]
    fn test_do_is_refused_with_wont() {
        let scrubbed = scrub_telnet(&[b'a', IAC, DO, ECHO, b'b']);
        assert_eq!(scrubbed.cleaned, b"ab");
        assert_eq!(scrubbed.replies, vec![IAC, WONT, ECHO]);
    }

    #[test]
    fn test_will_is_refused_with_dont() {
        let scrubbed = scrub_telnet(&[IAC, WILL, ECHO]);
        assert!(scrubbed.cleaned.is_empty());
        assert_eq!(scrubbed.replies, vec![IAC, DONT, ECHO]);
    }

    #[test]
    fn test_wont_and_dont_need_no_reply() {
        let scrubbed = scrub_telnet(&[IAC, WONT, ECHO, IAC, DONT, ECHO]);
        assert!(scrubbed.cleaned.is_empty());
        assert!(scrubbed.replies.is_empty());
    }

    #[test]
    fn test_escaped_iac_is_a_data_byte() {
        let scrubbed = scrub_telnet(&[b'x', IAC, IAC, b'y']);
        assert_eq!(scrubbed.cleaned, vec![b'x', IAC, b'y']);
    }

    #[test]
    fn test_subnegotiation_is_skipped() {
        let scrubbed = scrub_telnet(&[b'a', IAC, SB, 0x18, 0x01, IAC, SE, b'b']);
        assert_eq!(scrubbed.cleaned, b"ab");
        assert!(scrubbed.replies.is_empty());
    }

    #[test]
    fn test_split_sequence_is_carried() {
        let scrubbed = scrub_telnet(&[b'a', IAC, DO]);
        assert_eq!(scrubbed.cleaned, b"a");
        assert_eq!(scrubbed.carry, vec![IAC, DO]);

        // next chunk completes the sequence once the carry is prepended
        let mut raw = scrubbed.carry;
        raw.extend_from_slice(&[ECHO, b'b']);
        let scrubbed = scrub_telnet(&raw);
        assert_eq!(scrubbed.cleaned, b"b");
        assert_eq!(scrubbed.replies, vec![IAC, WONT, ECHO]);
    }

    #[test]
    fn test_unterminated_subnegotiation_is_carried() {
        let scrubbed = scrub_telnet(&[b'a', IAC, SB, 0x18]);
        assert_eq!(scrubbed.cleaned, b"a");
        assert_eq!(scrubbed.carry, vec![IAC, SB, 0x18]);
    }

    mod live {
        use super::super::*;

        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        fn endpoint_for(listener: &TcpListener) -> DeviceEndpoint {
            let port = listener.local_addr().unwrap().port();
            DeviceEndpoint::new("127.0.0.1")
                .with_port(port)
                .with_timeout(Duration::from_millis(500))
        }

        #[tokio::test]
        async fn wait_for_scrubs_negotiation_and_refuses_it() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = endpoint_for(&listener);

            let server = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                socket
                    .write_all(&[IAC, DO, 0x01, IAC, WILL, 0x03])
                    .await
                    .unwrap();
                socket.write_all(b"\r\nUser Name : ").await.unwrap();

                // expect both refusals back
                let mut reply = [0u8; 6];
                socket.read_exact(&mut reply).await.unwrap();
                reply
            });

            let mut transport = TelnetTransport::connect(&endpoint).await.unwrap();
            let prompt = Regex::new(r"User Name :").unwrap();
            let seen = transport
                .wait_for(&prompt, Duration::from_millis(500))
                .await
                .unwrap();

            assert_eq!(seen, "\r\nUser Name :");
            assert_eq!(
                server.await.unwrap(),
                [IAC, WONT, 0x01, IAC, DONT, 0x03]
            );
            transport.close().await.unwrap();
        }

        #[tokio::test]
        async fn wait_for_times_out_when_prompt_never_arrives() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = endpoint_for(&listener);

            let server = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                socket.write_all(b"something else entirely").await.unwrap();
                // hold the socket open past the client timeout
                tokio::time::sleep(Duration::from_millis(700)).await;
                drop(socket);
            });

            let mut transport = TelnetTransport::connect(&endpoint).await.unwrap();
            let prompt = Regex::new(r"User Name :").unwrap();
            let err = transport
                .wait_for(&prompt, Duration::from_millis(100))
                .await
                .unwrap_err();

            assert!(matches!(err, TransportError::PromptTimeout { .. }));
            server.await.unwrap();
        }

        #[tokio::test]
        async fn wait_for_reports_disconnect_on_eof() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = endpoint_for(&listener);

            let server = tokio::spawn(async move {
                let (socket, _) = listener.accept().await.unwrap();
                drop(socket);
            });

            let mut transport = TelnetTransport::connect(&endpoint).await.unwrap();
            let prompt = Regex::new(r"User Name :").unwrap();
            let err = transport
                .wait_for(&prompt, Duration::from_millis(500))
                .await
                .unwrap_err();

            assert!(matches!(err, TransportError::Disconnected));
            server.await.unwrap();
        }

        #[tokio::test]
        async fn send_line_appends_carriage_return() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let endpoint = endpoint_for(&listener);

            let server = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut line = [0u8; 4];
                socket.read_exact(&mut line).await.unwrap();
                line
            });

            let mut transport = TelnetTransport::connect(&endpoint).await.unwrap();
            transport.send_line("YES").await.unwrap();

            assert_eq!(&server.await.unwrap(), b"YES\r");
            transport.close().await.unwrap();
        }
    }
}
