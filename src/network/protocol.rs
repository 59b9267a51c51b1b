//! Weasel wire protocol
//!
//! Defines the messages exchanged between the coordinator and its workers and
//! their length-prefixed binary framing.
//!
//! A frame is a `u32` big-endian body length followed by the body. The body is
//! one tag byte and then the tag's payloads, each a `u32` big-endian length
//! followed by that many bytes of ASCII/UTF-8 text.

use crate::error::{EvolutionError, Result};
use crate::genome::{Alphabet, Candidate, CrossoverStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a frame body, checked before allocating
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Identity of a worker as seen from the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Message tags with their numeric wire codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageTag {
    ConfigCrossover,
    ConfigMutation,
    ConfigAlphabet,
    ConfigTarget,
    BreedingRequest,
    OffspringResponse,
    Terminate,
    BreedingRejected,
}

impl MessageTag {
    pub fn code(self) -> u8 {
        match self {
            MessageTag::ConfigCrossover => 90,
            MessageTag::ConfigMutation => 91,
            MessageTag::ConfigAlphabet => 92,
            MessageTag::ConfigTarget => 93,
            MessageTag::BreedingRequest => 96,
            MessageTag::OffspringResponse => 97,
            MessageTag::Terminate => 98,
            MessageTag::BreedingRejected => 99,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            90 => Some(MessageTag::ConfigCrossover),
            91 => Some(MessageTag::ConfigMutation),
            92 => Some(MessageTag::ConfigAlphabet),
            93 => Some(MessageTag::ConfigTarget),
            96 => Some(MessageTag::BreedingRequest),
            97 => Some(MessageTag::OffspringResponse),
            98 => Some(MessageTag::Terminate),
            99 => Some(MessageTag::BreedingRejected),
            _ => None,
        }
    }

    /// Control messages travel apart from breeding work on the worker side
    pub fn is_control(self) -> bool {
        !matches!(
            self,
            MessageTag::BreedingRequest
                | MessageTag::OffspringResponse
                | MessageTag::BreedingRejected
        )
    }
}

/// A protocol message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// One-time crossover strategy for a worker
    ConfigCrossover(CrossoverStrategy),
    /// One-time mutation rate for a worker
    ConfigMutation(f64),
    /// One-time symbol ring for a worker
    ConfigAlphabet(Alphabet),
    /// One-time target, needed by local-fitness crossover
    ConfigTarget(Candidate),
    /// Breed one child from these parents
    BreedingRequest {
        parent_a: Candidate,
        parent_b: Candidate,
    },
    /// The child bred for the last request
    OffspringResponse(Candidate),
    /// End of run
    Terminate,
    /// The worker could not breed the last request; carries the reason
    BreedingRejected(String),
}

impl Message {
    pub fn tag(&self) -> MessageTag {
        match self {
            Message::ConfigCrossover(_) => MessageTag::ConfigCrossover,
            Message::ConfigMutation(_) => MessageTag::ConfigMutation,
            Message::ConfigAlphabet(_) => MessageTag::ConfigAlphabet,
            Message::ConfigTarget(_) => MessageTag::ConfigTarget,
            Message::BreedingRequest { .. } => MessageTag::BreedingRequest,
            Message::OffspringResponse(_) => MessageTag::OffspringResponse,
            Message::Terminate => MessageTag::Terminate,
            Message::BreedingRejected(_) => MessageTag::BreedingRejected,
        }
    }

    /// Encode the frame body (tag + payloads, without the outer length)
    pub fn encode(&self) -> Vec<u8> {
        let mut body = vec![self.tag().code()];
        match self {
            Message::ConfigCrossover(strategy) => {
                put_payload(&mut body, &strategy.id().to_string())
            }
            Message::ConfigMutation(rate) => put_payload(&mut body, &rate.to_string()),
            Message::ConfigAlphabet(alphabet) => put_payload(&mut body, alphabet.as_str()),
            Message::ConfigTarget(target) => put_payload(&mut body, target.as_str()),
            Message::BreedingRequest { parent_a, parent_b } => {
                put_payload(&mut body, parent_a.as_str());
                put_payload(&mut body, parent_b.as_str());
            }
            Message::OffspringResponse(child) => put_payload(&mut body, child.as_str()),
            Message::Terminate => {}
            Message::BreedingRejected(reason) => put_payload(&mut body, reason),
        }
        body
    }

    /// Decode a frame body. Unknown tags, missing or trailing payloads and
    /// unparsable values are protocol violations.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let (&code, mut rest) = body
            .split_first()
            .ok_or_else(|| EvolutionError::Protocol("empty frame".to_string()))?;
        let tag = MessageTag::from_code(code)
            .ok_or_else(|| EvolutionError::Protocol(format!("unknown tag {}", code)))?;

        let message = match tag {
            MessageTag::ConfigCrossover => {
                let text = take_payload(&mut rest)?;
                let strategy = text
                    .parse::<u32>()
                    .ok()
                    .and_then(CrossoverStrategy::from_id)
                    .ok_or_else(|| {
                        EvolutionError::Protocol(format!("bad crossover id {:?}", text))
                    })?;
                Message::ConfigCrossover(strategy)
            }
            MessageTag::ConfigMutation => {
                let text = take_payload(&mut rest)?;
                let rate = text
                    .parse::<f64>()
                    .ok()
                    .filter(|r| (0.0..=1.0).contains(r))
                    .ok_or_else(|| {
                        EvolutionError::Protocol(format!("bad mutation rate {:?}", text))
                    })?;
                Message::ConfigMutation(rate)
            }
            MessageTag::ConfigAlphabet => {
                let text = take_payload(&mut rest)?;
                let alphabet = Alphabet::new(&text)
                    .map_err(|e| EvolutionError::Protocol(e.to_string()))?;
                Message::ConfigAlphabet(alphabet)
            }
            MessageTag::ConfigTarget => Message::ConfigTarget(take_payload(&mut rest)?.into()),
            MessageTag::BreedingRequest => {
                let parent_a = Candidate::new(take_payload(&mut rest)?);
                let parent_b = Candidate::new(take_payload(&mut rest)?);
                Message::BreedingRequest { parent_a, parent_b }
            }
            MessageTag::OffspringResponse => {
                Message::OffspringResponse(take_payload(&mut rest)?.into())
            }
            MessageTag::Terminate => Message::Terminate,
            MessageTag::BreedingRejected => Message::BreedingRejected(take_payload(&mut rest)?),
        };

        if !rest.is_empty() {
            return Err(EvolutionError::Protocol(format!(
                "{} trailing byte(s) after {:?}",
                rest.len(),
                tag
            )));
        }
        Ok(message)
    }
}

/// A message together with the worker it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: WorkerId,
    pub message: Message,
}

fn put_payload(body: &mut Vec<u8>, text: &str) {
    body.extend_from_slice(&(text.len() as u32).to_be_bytes());
    body.extend_from_slice(text.as_bytes());
}

fn take_payload(rest: &mut &[u8]) -> Result<String> {
    if rest.len() < 4 {
        return Err(EvolutionError::Protocol("truncated payload header".to_string()));
    }
    let (header, tail) = rest.split_at(4);
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    if tail.len() < len {
        return Err(EvolutionError::Protocol(format!(
            "payload claims {} bytes, {} available",
            len,
            tail.len()
        )));
    }
    let (payload, tail) = tail.split_at(len);
    *rest = tail;
    String::from_utf8(payload.to_vec())
        .map_err(|_| EvolutionError::Protocol("payload is not UTF-8".to_string()))
}

/// Write one length-prefixed frame
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, message: &Message) -> Result<()> {
    let body = message.encode();
    writer.write_u32(body.len() as u32).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame body. The length header is read first and the buffer is
/// sized from it. Returns `None` only when the stream ends on a frame
/// boundary; a stream cut inside a header or body is a protocol error.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(EvolutionError::Protocol(format!(
                "stream ended after {} of 4 length header bytes",
                filled
            )));
        }
        filled += n;
    }
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(EvolutionError::Protocol(format!(
            "frame of {} bytes exceeds limit of {}",
            len, MAX_FRAME_LEN
        )));
    }
    let mut body = vec![0u8; len];
    match reader.read_exact(&mut body).await {
        Ok(_) => Ok(Some(body)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(EvolutionError::Protocol(
            format!("stream ended inside a {} byte frame", len),
        )),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_messages() -> Vec<Message> {
        vec![
            Message::ConfigCrossover(CrossoverStrategy::LocalFitness),
            Message::ConfigMutation(0.05),
            Message::ConfigAlphabet(Alphabet::new("ACT").unwrap()),
            Message::ConfigTarget("CAT".into()),
            Message::BreedingRequest {
                parent_a: "METHINKS".into(),
                parent_b: "IT IS LI".into(),
            },
            Message::OffspringResponse("KE A WEASEL".into()),
            Message::Terminate,
            Message::BreedingRejected("length mismatch".to_string()),
        ]
    }

    #[test]
    fn test_message_roundtrip() {
        for msg in sample_messages() {
            let decoded = Message::decode(&msg.encode()).unwrap();
            assert_eq!(decoded, msg);
        }
    }

    #[test]
    fn test_breeding_request_is_two_payloads() {
        let msg = Message::BreedingRequest {
            parent_a: "AB".into(),
            parent_b: "CD".into(),
        };
        assert_eq!(
            msg.encode(),
            vec![96, 0, 0, 0, 2, b'A', b'B', 0, 0, 0, 2, b'C', b'D']
        );
    }

    #[test]
    fn test_terminate_is_bare_tag() {
        assert_eq!(Message::Terminate.encode(), vec![98]);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = Message::decode(&[42]).unwrap_err();
        assert!(matches!(err, EvolutionError::Protocol(_)));
        assert!(Message::decode(&[]).is_err());
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        // truncated second parent
        let mut body = Message::BreedingRequest {
            parent_a: "AB".into(),
            parent_b: "CD".into(),
        }
        .encode();
        body.pop();
        assert!(Message::decode(&body).is_err());

        let mut rate = vec![MessageTag::ConfigMutation.code()];
        put_payload(&mut rate, "1.5");
        assert!(Message::decode(&rate).is_err());

        let mut crossover = vec![MessageTag::ConfigCrossover.code()];
        put_payload(&mut crossover, "7");
        assert!(Message::decode(&crossover).is_err());

        let mut trailing = Message::Terminate.encode();
        trailing.push(0);
        assert!(Message::decode(&trailing).is_err());
    }

    #[test]
    fn test_control_routing() {
        assert!(MessageTag::Terminate.is_control());
        assert!(MessageTag::ConfigTarget.is_control());
        assert!(!MessageTag::BreedingRequest.is_control());
        assert!(!MessageTag::BreedingRejected.is_control());
    }

    #[tokio::test]
    async fn test_frames_over_stream() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        for msg in sample_messages() {
            write_frame(&mut client, &msg).await.unwrap();
        }
        drop(client);
        let mut received = Vec::new();
        while let Some(body) = read_frame(&mut server).await.unwrap() {
            received.push(Message::decode(&body).unwrap());
        }
        assert_eq!(received, sample_messages());
    }

    #[tokio::test]
    async fn test_truncated_frames_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&[0, 0]).await.unwrap();
        drop(client);
        assert!(matches!(
            read_frame(&mut server).await,
            Err(EvolutionError::Protocol(_))
        ));

        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_u32(10).await.unwrap();
        client.write_all(&[98, 0, 0]).await.unwrap();
        drop(client);
        assert!(matches!(
            read_frame(&mut server).await,
            Err(EvolutionError::Protocol(_))
        ));

        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[test]
    fn test_rejection_carries_reason() {
        assert_eq!(
            Message::BreedingRejected("no".to_string()).encode(),
            vec![99, 0, 0, 0, 2, b'n', b'o']
        );
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_u32((MAX_FRAME_LEN + 1) as u32).await.unwrap();
        let result = read_frame(&mut server).await;
        assert!(matches!(result, Err(EvolutionError::Protocol(_))));
    }
}
