//! IEEE 488.2 arbitrary block codec for edit memory contents.
//!
//! A definite length block is `#`, one digit `n`, `n` digits of payload length in bytes, and
//! the payload. The instrument transfers samples as big-endian 16-bit integers.

use std::io::BufRead;

use crate::{Error, Result};

/// Largest edit memory of any supported instrument, in samples.
pub const MAX_SAMPLES: usize = 131_072;
const MAX_PAYLOAD: usize = 2 * MAX_SAMPLES;

fn malformed(block: &[u8], kind: &'static str) -> Error {
    Error::Parse {
        query: "arbitrary block".to_owned(),
        response: String::from_utf8_lossy(&block[..block.len().min(16)]).into_owned(),
        kind,
    }
}

/// Encode samples as a definite length block.
pub fn encode_block(samples: &[i16]) -> Result<Vec<u8>> {
    if samples.len() > MAX_SAMPLES {
        return Err(Error::InvalidArgument(
            format!("{} samples do not fit in an edit memory of {}", samples.len(), MAX_SAMPLES)))
    }
    let big_endian: Vec<i16> = samples.iter().map(|sample| sample.to_be()).collect();
    let payload: &[u8] = bytemuck::cast_slice(&big_endian);
    let length = payload.len().to_string();
    let mut block = Vec::with_capacity(2 + length.len() + payload.len());
    block.push(b'#');
    block.push(b'0' + length.len() as u8);
    block.extend_from_slice(length.as_bytes());
    block.extend_from_slice(payload);
    Ok(block)
}

/// Split a block into its payload, validating the header. A trailing message terminator is
/// ignored.
fn payload(block: &[u8]) -> Result<&[u8]> {
    let (&hash, rest) = block.split_first().ok_or_else(|| malformed(block, "arbitrary block header"))?;
    let (&digits, rest) = rest.split_first().ok_or_else(|| malformed(block, "arbitrary block header"))?;
    if hash != b'#' || !digits.is_ascii_digit() {
        return Err(malformed(block, "arbitrary block header"))
    }
    let digits = (digits - b'0') as usize;
    if digits == 0 {
        // indefinite length block, terminated by the end of the message
        return Ok(rest.strip_suffix(b"\n").unwrap_or(rest))
    }
    if rest.len() < digits {
        return Err(malformed(block, "arbitrary block length"))
    }
    let (length, rest) = rest.split_at(digits);
    let length = std::str::from_utf8(length).ok()
        .filter(|length| length.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|length| length.parse::<usize>().ok())
        .ok_or_else(|| malformed(block, "arbitrary block length"))?;
    if rest.len() < length {
        return Err(malformed(block, "arbitrary block payload"))
    }
    let (payload, trailer) = rest.split_at(length);
    if !matches!(trailer, b"" | b"\n" | b"\r\n") {
        return Err(malformed(block, "arbitrary block payload"))
    }
    Ok(payload)
}

/// Decode a block containing big-endian samples.
pub fn decode_block(block: &[u8]) -> Result<Vec<i16>> {
    let payload = payload(block)?;
    if payload.len() % 2 != 0 {
        return Err(malformed(block, "arbitrary block payload"))
    }
    let samples: Vec<i16> = bytemuck::pod_collect_to_vec(payload);
    Ok(samples.into_iter().map(i16::from_be).collect())
}

/// Read one definite length block from `reader`, returning it with its header. The message
/// terminator following the payload is consumed, so that the next message starts clean.
pub fn read_block<R: BufRead>(mut reader: R) -> Result<Vec<u8>> {
    let mut block = vec![0u8; 2];
    reader.read_exact(&mut block)?;
    if block[0] != b'#' || !block[1].is_ascii_digit() || block[1] == b'0' {
        return Err(malformed(&block, "arbitrary block header"))
    }
    let digits = (block[1] - b'0') as usize;
    block.resize(2 + digits, 0);
    reader.read_exact(&mut block[2..])?;
    let length = std::str::from_utf8(&block[2..]).ok()
        .filter(|length| length.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|length| length.parse::<usize>().ok())
        .ok_or_else(|| malformed(&block, "arbitrary block length"))?;
    if length > MAX_PAYLOAD {
        return Err(malformed(&block, "arbitrary block length"))
    }
    let header_len = block.len();
    block.resize(header_len + length, 0);
    reader.read_exact(&mut block[header_len..])?;
    let mut trailer = Vec::new();
    reader.read_until(b'\n', &mut trailer)?;
    if !matches!(&trailer[..], b"" | b"\n" | b"\r\n") {
        return Err(malformed(&trailer, "arbitrary block terminator"))
    }
    log::trace!("read_block() = {} byte payload", length);
    Ok(block)
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor, Read};

    use super::*;

    #[test]
    fn encode() {
        assert_eq!(encode_block(&[0, 5000, 14000]).unwrap(),
                   b"#16\x00\x00\x13\x88\x36\xb0".to_vec());
        assert_eq!(encode_block(&[]).unwrap(), b"#10".to_vec());
        let block = encode_block(&[1; 500]).unwrap();
        assert_eq!(&block[..6], b"#41000");
        assert_eq!(block.len(), 1006);
    }

    #[test]
    fn decode() {
        assert_eq!(decode_block(b"#16\x00\x00\x13\x88\x36\xb0\n").unwrap(), vec![0, 5000, 14000]);
        assert_eq!(decode_block(b"#14\xff\xff\x80\x00").unwrap(), vec![-1, i16::MIN]);
        assert_eq!(decode_block(b"#0\x00\x01\x00\x02\n").unwrap(), vec![1, 2]);
        assert_eq!(decode_block(b"#10").unwrap(), Vec::<i16>::new());
    }

    #[test]
    fn decode_malformed() {
        for block in [&b""[..], b"#", b"16\x00\x01", b"#x2\x00\x01", b"#3", b"#2x4\x00\x01\x00\x02",
                      b"#14\x00\x01", b"#13\x00\x01\x00", b"#12\x00\x01\x00\x02"] {
            assert!(matches!(decode_block(block), Err(Error::Parse { .. })), "{:?}", block);
        }
    }

    #[test]
    fn read() {
        let mut cursor = Cursor::new(b"#14\x00\x01\x00\x02\n".to_vec());
        let block = read_block(&mut cursor).unwrap();
        assert_eq!(block, b"#14\x00\x01\x00\x02".to_vec());
        assert_eq!(decode_block(&block).unwrap(), vec![1, 2]);
        assert_eq!(cursor.position(), 8);
    }

    /// Hands out at most three bytes per read, like a bus delivering a message in packets.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let count = buf.len().min(3).min(self.0.len());
            buf[..count].copy_from_slice(&self.0[..count]);
            self.0 = &self.0[count..];
            Ok(count)
        }
    }

    #[test]
    fn read_consumes_terminator() {
        let samples: Vec<i16> = (0..100).collect();
        let mut stream = encode_block(&samples).unwrap();
        stream.extend_from_slice(b"\n0,\"No error\"\n");
        // payload larger than the buffer, so most of it bypasses the buffer
        let mut reader = BufReader::with_capacity(16, Trickle(&stream));
        let block = read_block(&mut reader).unwrap();
        assert_eq!(decode_block(&block).unwrap(), samples);
        let mut next = String::new();
        std::io::BufRead::read_line(&mut reader, &mut next).unwrap();
        assert_eq!(next, "0,\"No error\"\n");
    }

    #[test]
    fn read_oversized() {
        assert!(matches!(read_block(Cursor::new(b"#9999999999\x00\x01".to_vec())),
                         Err(Error::Parse { .. })));
        assert!(matches!(read_block(Cursor::new(b"#6262146\x00\x01".to_vec())),
                         Err(Error::Parse { .. })));
        assert!(matches!(encode_block(&vec![0; MAX_SAMPLES + 1]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn read_truncated() {
        assert!(matches!(read_block(Cursor::new(b"#14\x00\x01".to_vec())), Err(Error::Io(_))));
        assert!(matches!(read_block(Cursor::new(b"#0\x00\x01\n".to_vec())), Err(Error::Parse { .. })));
    }
}
