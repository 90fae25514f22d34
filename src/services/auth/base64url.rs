/*
 * Responsibility
 * - URL-safe base64 (RFC 4648 §5) for token segments
 * - encode never emits `=`; decode accepts input with or without padding
 */
use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use thiserror::Error;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
#[error("malformed base64url input: {0}")]
pub struct DecodeError(#[from] base64::DecodeError);

pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(URL_SAFE_LENIENT.decode(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_url_alphabet_without_padding() {
        // 0xfb 0xff -> "+/8=" in the standard alphabet
        assert_eq!(encode([0xfb, 0xff]), "-_8");
        assert_eq!(encode(b"a"), "YQ");
        assert_eq!(encode(b""), "");
    }

    #[test]
    fn decode_restores_arbitrary_bytes() {
        let samples: [&[u8]; 5] = [
            b"",
            b"f",
            b"fo",
            b"foo",
            &[0x00, 0xff, 0xfe, 0x80, 0x7f, 0x3e, 0x3f],
        ];
        for bytes in samples {
            assert_eq!(decode(&encode(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn decode_accepts_padded_input() {
        assert_eq!(decode("YQ==").unwrap(), b"a");
        assert_eq!(decode("YQ").unwrap(), b"a");
    }

    #[test]
    fn decode_rejects_standard_alphabet_characters() {
        assert!(decode("+/8").is_err());
    }

    #[test]
    fn decode_rejects_impossible_length() {
        // a single trailing sextet can never form a byte
        assert!(decode("YWJjZ").is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("not base64!").is_err());
    }
}
